use std::fmt;

use chrono::NaiveDate;

use super::author::join_name;
use super::MemberStatus;

/// A registered borrower.
///
/// `current_loans` is a materialized count of this member's active loans. The
/// circulation services move it together with the loan table, and
/// `Library::reconcile_loan_counts` rebuilds it when the two disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub birth_date: Option<NaiveDate>,
    pub status: MemberStatus,
    pub max_loans: u32,
    pub current_loans: u32,
    pub member_since: NaiveDate,
}

impl Member {
    pub const DEFAULT_MAX_LOANS: u32 = 5;

    pub fn new(first_name: &str, last_name: &str, email: &str, member_since: NaiveDate) -> Self {
        Self {
            id: 0,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            phone: String::new(),
            address: String::new(),
            birth_date: None,
            status: MemberStatus::Active,
            max_loans: Self::DEFAULT_MAX_LOANS,
            current_loans: 0,
            member_since,
        }
    }

    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    /// Active and below the loan limit. Always evaluate on a freshly loaded
    /// row; the answer changes with every checkout.
    pub fn can_borrow(&self) -> bool {
        self.is_active() && self.current_loans < self.max_loans
    }

    /// Why `can_borrow` is false, phrased for the status line.
    pub fn borrow_refusal(&self) -> Option<String> {
        if !self.is_active() {
            Some(format!(
                "{} cannot borrow: membership is {}.",
                self.full_name(),
                self.status
            ))
        } else if self.current_loans >= self.max_loans {
            Some(format!(
                "{} has reached the loan limit ({}/{}).",
                self.full_name(),
                self.current_loans,
                self.max_loans
            ))
        } else {
            None
        }
    }

    pub(crate) fn register_checkout(&mut self) {
        self.current_loans += 1;
    }

    pub(crate) fn register_return(&mut self) {
        self.current_loans = self.current_loans.saturating_sub(1);
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ID: {})", self.full_name(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> Member {
        let since = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Member::new("Jane", "Smith", "jane@example.org", since)
    }

    #[test]
    fn member_at_limit_cannot_borrow() {
        let mut m = member();
        m.current_loans = m.max_loans;
        assert!(!m.can_borrow());
        assert!(m.borrow_refusal().unwrap().contains("loan limit (5/5)"));
    }

    #[test]
    fn suspended_member_cannot_borrow_with_no_loans() {
        let mut m = member();
        m.status = MemberStatus::Suspended;
        assert_eq!(m.current_loans, 0);
        assert!(!m.can_borrow());
        assert!(m.borrow_refusal().unwrap().contains("Suspended"));
    }

    #[test]
    fn return_never_underflows() {
        let mut m = member();
        m.register_return();
        assert_eq!(m.current_loans, 0);
        m.register_checkout();
        assert_eq!(m.current_loans, 1);
        assert!(m.can_borrow());
        assert_eq!(m.borrow_refusal(), None);
    }
}
