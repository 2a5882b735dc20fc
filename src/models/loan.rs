use std::fmt;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use super::{FinePolicy, LoanStatus, Media, Member};

/// One member borrowing one copy of one media item.
///
/// Dates and status are private: the due date is derived from the loan date and
/// the media's loan duration, and a return date always implies `Returned`.
/// Overdue is never stored; every predicate takes `today` and is recomputed on
/// each call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    pub id: i64,
    pub member_id: i64,
    pub media_id: i64,
    pub(crate) loan_date: NaiveDate,
    pub(crate) due_date: NaiveDate,
    pub(crate) return_date: Option<NaiveDate>,
    pub(crate) status: LoanStatus,
    pub renewal_count: u32,
    pub max_renewals: u32,
    pub notes: String,
}

impl Loan {
    pub const DEFAULT_MAX_RENEWALS: u32 = 2;

    /// Unsaved active loan with its due date computed from `media`.
    pub fn new(member: &Member, media: &Media, loan_date: NaiveDate) -> Self {
        Self {
            id: 0,
            member_id: member.id,
            media_id: media.id,
            loan_date,
            due_date: add_days(loan_date, media.loan_duration_days()),
            return_date: None,
            status: LoanStatus::Active,
            renewal_count: 0,
            max_renewals: Self::DEFAULT_MAX_RENEWALS,
            notes: String::new(),
        }
    }

    pub fn loan_date(&self) -> NaiveDate {
        self.loan_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    pub fn is_returned(&self) -> bool {
        self.status == LoanStatus::Returned
    }

    /// Moves the loan date; the due date follows unless the loan is closed.
    pub fn set_loan_date(&mut self, loan_date: NaiveDate, media: &Media) {
        self.loan_date = loan_date;
        self.recalculate_due_date(media);
    }

    /// Points the loan at another item; the due date follows unless closed.
    pub fn set_media(&mut self, media: &Media) {
        self.media_id = media.id;
        self.recalculate_due_date(media);
    }

    /// Closing date. There is no way back to `Active`.
    pub fn set_return_date(&mut self, return_date: NaiveDate) {
        self.return_date = Some(return_date);
        self.status = LoanStatus::Returned;
    }

    fn recalculate_due_date(&mut self, media: &Media) {
        if self.return_date.is_none() {
            self.due_date = add_days(self.loan_date, media.loan_duration_days());
        }
    }

    /// Active with the due date strictly in the past.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && self.due_date < today
    }

    /// Whole calendar days past the due date, 0 unless overdue.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        if !self.is_overdue(today) {
            return 0;
        }
        (today - self.due_date).num_days()
    }

    pub fn calculate_fine(&self, today: NaiveDate, policy: &FinePolicy) -> Decimal {
        policy.fine_for(self.days_overdue(today))
    }

    /// Only active loans that are on time and below their renewal limit.
    pub fn can_renew(&self, today: NaiveDate) -> bool {
        self.is_active() && self.renewal_count < self.max_renewals && !self.is_overdue(today)
    }

    /// Extend the due date by another loan period of `media`. Leaves the loan
    /// untouched and returns false when renewal is not allowed.
    pub fn renew(&mut self, media: &Media, today: NaiveDate) -> bool {
        if !self.can_renew(today) {
            return false;
        }
        self.renewal_count += 1;
        self.due_date = add_days(self.due_date, media.loan_duration_days());
        true
    }

    /// Close the loan. The due date keeps its last value; restoring the copy,
    /// the member's count, and charging a fine are the caller's business.
    pub fn return_media(&mut self, return_date: NaiveDate) {
        self.set_return_date(return_date);
    }

    /// Why `can_renew` is false, phrased for the status line.
    pub fn renewal_refusal(&self, today: NaiveDate) -> Option<String> {
        if !self.is_active() {
            Some(format!("Loan #{} is already returned.", self.id))
        } else if self.is_overdue(today) {
            Some(format!("Loan #{} is overdue and cannot be renewed.", self.id))
        } else if self.renewal_count >= self.max_renewals {
            Some(format!(
                "Loan #{} reached the maximum of {} renewals.",
                self.id, self.max_renewals
            ))
        } else {
            None
        }
    }
}

impl fmt::Display for Loan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loan #{} (media {} to member {}, due {})",
            self.id, self.media_id, self.member_id, self.due_date
        )
    }
}

fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}
