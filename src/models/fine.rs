use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::FineStatus;

/// Monetary penalty owed by a member, optionally tied to the loan that caused
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fine {
    pub id: i64,
    pub member_id: i64,
    pub loan_id: Option<i64>,
    pub(crate) amount: Decimal,
    pub reason: String,
    pub issue_date: NaiveDate,
    pub(crate) paid_date: Option<NaiveDate>,
    pub(crate) status: FineStatus,
    pub description: String,
}

impl Fine {
    pub fn new(
        member_id: i64,
        loan_id: Option<i64>,
        amount: Decimal,
        reason: &str,
        issue_date: NaiveDate,
    ) -> Self {
        Self {
            id: 0,
            member_id,
            loan_id,
            amount: amount.round_dp(2),
            reason: reason.to_string(),
            issue_date,
            paid_date: None,
            status: FineStatus::Outstanding,
            description: String::new(),
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn paid_date(&self) -> Option<NaiveDate> {
        self.paid_date
    }

    pub fn status(&self) -> FineStatus {
        self.status
    }

    /// Recording a payment date settles the fine.
    pub fn set_paid_date(&mut self, paid_date: NaiveDate) {
        self.paid_date = Some(paid_date);
        self.status = FineStatus::Paid;
    }

    pub fn is_outstanding(&self) -> bool {
        self.status == FineStatus::Outstanding
    }

    pub fn is_paid(&self) -> bool {
        self.status == FineStatus::Paid
    }

    pub fn is_waived(&self) -> bool {
        self.status == FineStatus::Waived
    }

    pub fn mark_as_paid(&mut self, today: NaiveDate) {
        self.set_paid_date(today);
    }

    /// Forgive the fine. `paid_date` is stamped as well even though nothing
    /// was paid; list views and reports read it as the settlement date.
    pub fn waive(&mut self, today: NaiveDate) {
        self.status = FineStatus::Waived;
        self.paid_date = Some(today);
    }

    pub fn formatted_amount(&self) -> String {
        format!("€{:.2}", self.amount)
    }
}

impl fmt::Display for Fine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fine #{} - {} ({})",
            self.id,
            self.formatted_amount(),
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn new_fine_is_outstanding_and_rounded() {
        let fine = Fine::new(3, Some(9), Decimal::new(12345, 3), "Damaged cover", day(1));
        assert!(fine.is_outstanding());
        assert_eq!(fine.amount(), Decimal::new(1234, 2));
        assert_eq!(fine.paid_date(), None);
        assert_eq!(fine.formatted_amount(), "€12.34");
    }

    #[test]
    fn paying_stamps_date() {
        let mut fine = Fine::new(3, None, Decimal::ONE, "Lost card", day(1));
        fine.mark_as_paid(day(4));
        assert!(fine.is_paid());
        assert_eq!(fine.paid_date(), Some(day(4)));

        fine.mark_as_paid(day(6));
        assert!(fine.is_paid());
        assert_eq!(fine.paid_date(), Some(day(6)));
    }

    #[test]
    fn waiving_keeps_waived_status_and_stamps_paid_date() {
        let mut fine = Fine::new(3, None, Decimal::TEN, "Overdue return", day(1));
        fine.waive(day(2));
        assert!(fine.is_waived());
        assert!(!fine.is_paid());
        assert_eq!(fine.paid_date(), Some(day(2)));
        assert_eq!(fine.to_string(), "Fine #0 - €10.00 (Waived)");
    }
}
