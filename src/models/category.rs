use std::fmt;

/// Catalog section. Its loan duration overrides the media-type default for
/// every item filed under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub loan_duration_days: u32,
}

impl Category {
    pub const DEFAULT_LOAN_DAYS: u32 = 14;

    pub fn new(name: &str, loan_duration_days: u32) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            description: String::new(),
            loan_duration_days,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::new("", Self::DEFAULT_LOAN_DAYS)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
