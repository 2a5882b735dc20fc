//! Circulation rules that span several records: checkouts and returns, fines,
//! borrowing eligibility, catalog maintenance, and the dashboard numbers.
//!
//! `Library` owns the store, the clock, and the fine policy. Every operation
//! reloads the rows it touches, applies the model rules, and persists the
//! result before handing anything back, so a failed write leaves the caller's
//! copies as they were.

mod catalog;
mod fines;
mod loans;
mod members;
mod notices;
mod stats;

use chrono::NaiveDate;

use crate::clock::Clock;
use crate::models::FinePolicy;
use crate::store::LibraryStore;

pub use fines::{FineScope, FineSummary};
pub use loans::{LoanScope, LoanSummary, ReturnReceipt};
pub use members::{LoanCountDrift, MemberSummary};
pub use notices::{NoticeTemplate, OverdueNotice};
pub use stats::LibraryStats;

pub struct Library<S> {
    store: S,
    clock: Box<dyn Clock>,
    policy: FinePolicy,
}

impl<S: LibraryStore> Library<S> {
    pub fn new(store: S, clock: impl Clock + 'static, policy: FinePolicy) -> Self {
        Self {
            store,
            clock: Box::new(clock),
            policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access for maintenance tasks the services do not cover.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn policy(&self) -> &FinePolicy {
        &self.policy
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared setup for the service tests: a memory store with one member and
    //! one two-copy book, and a clock the test can move.

    use std::rc::Rc;

    use chrono::NaiveDate;

    use super::Library;
    use crate::clock::FixedClock;
    use crate::models::{Category, FinePolicy, Media, MediaType, Member};
    use crate::store::{MemoryStore, Repository};

    pub fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    pub struct Desk {
        pub library: Library<MemoryStore>,
        pub clock: Rc<FixedClock>,
        pub member_id: i64,
        pub media_id: i64,
    }

    pub fn desk() -> Desk {
        let mut store = MemoryStore::new();

        let mut fiction = Category::new("Fiction", 14);
        store.create(&mut fiction).unwrap();

        let mut book = Media::new("Nineteen Eighty-Four", MediaType::Book, 2);
        book.category = Some(fiction);
        store.create(&mut book).unwrap();

        let mut member = Member::new("John", "Doe", "john.doe@email.com", start());
        store.create(&mut member).unwrap();

        let clock = Rc::new(FixedClock::new(start()));
        Desk {
            library: Library::new(store, Rc::clone(&clock), FinePolicy::default()),
            clock,
            member_id: member.id,
            media_id: book.id,
        }
    }
}
