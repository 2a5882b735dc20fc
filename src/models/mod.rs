//! Domain records for the catalog, the membership, and circulation. These are
//! plain values with a few derived-field helpers; persistence lives in `db`
//! and the rules that span several records live in `services`.

mod author;
mod category;
mod enums;
mod fine;
mod loan;
mod media;
mod member;
mod policy;
mod staff;

pub use author::Author;
pub use category::Category;
pub use enums::{
    FineStatus, LoanStatus, MediaType, MemberStatus, ParseLabelError, StaffRole, StaffStatus,
};
pub use fine::Fine;
pub use loan::Loan;
pub use media::Media;
pub use member::Member;
pub use policy::FinePolicy;
pub use staff::Staff;
