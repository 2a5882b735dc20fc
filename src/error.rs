//! Error types shared by the engines, the stores, and the bootstrapping code.

use std::fmt;

use thiserror::Error;

/// Entity families known to the stores. Used to build readable `NotFound`
/// messages and log fields without passing strings around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Author,
    Category,
    Media,
    Member,
    Staff,
    Loan,
    Fine,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Author => "Author",
            EntityKind::Category => "Category",
            EntityKind::Media => "Media",
            EntityKind::Member => "Member",
            EntityKind::Staff => "Staff member",
            EntityKind::Loan => "Loan",
            EntityKind::Fine => "Fine",
        };
        write!(f, "{label}")
    }
}

/// Main library error type.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// The requested action was rejected by a business rule. Nothing changed.
    #[error("{0}")]
    Validation(String),

    #[error("{kind} #{id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    /// Uniqueness or referential-integrity violation.
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LibraryError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        LibraryError::Conflict(msg.into())
    }

    pub fn not_found(kind: EntityKind, id: i64) -> Self {
        LibraryError::NotFound { kind, id }
    }

    /// True for errors the user can fix by changing their input, as opposed to
    /// storage or environment failures.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LibraryError::Validation(_) | LibraryError::NotFound { .. } | LibraryError::Conflict(_)
        )
    }
}

/// Result type alias for library operations.
pub type LibraryResult<T> = Result<T, LibraryError>;
