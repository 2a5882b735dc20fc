//! Status and classification enums. Each one is stored as its display label so
//! the database stays readable when opened with the `sqlite3` shell.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Raised when a stored label does not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseLabelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| ParseLabelError {
                        kind: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }
    };
}

labelled_enum! {
    /// Physical format of a catalog item. Drives the fallback loan length when
    /// the item has no category.
    MediaType, default = Book {
        Book => "Book",
        Dvd => "DVD",
        Cd => "CD",
        Magazine => "Magazine",
        Journal => "Journal",
    }
}

impl MediaType {
    /// Loan length used when no category overrides it.
    pub fn default_loan_days(&self) -> u32 {
        match self {
            MediaType::Dvd | MediaType::Cd => 7,
            MediaType::Magazine => 3,
            MediaType::Book | MediaType::Journal => 14,
        }
    }
}

labelled_enum! {
    MemberStatus, default = Active {
        Active => "Active",
        Suspended => "Suspended",
        Inactive => "Inactive",
    }
}

labelled_enum! {
    StaffStatus, default = Active {
        Active => "Active",
        OnLeave => "On Leave",
        Inactive => "Inactive",
    }
}

labelled_enum! {
    /// Cosmetic role flag. Nothing in the circulation rules checks it.
    StaffRole, default = Librarian {
        Librarian => "Librarian",
        Assistant => "Assistant",
        Manager => "Manager",
        Administrator => "Administrator",
    }
}

labelled_enum! {
    LoanStatus, default = Active {
        Active => "Active",
        Returned => "Returned",
    }
}

labelled_enum! {
    FineStatus, default = Outstanding {
        Outstanding => "Outstanding",
        Paid => "Paid",
        Waived => "Waived",
    }
}
