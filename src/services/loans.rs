use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{LibraryError, LibraryResult};
use crate::models::{Loan, Media, Member};
use crate::store::{LibraryQueries, LibraryStore, Repository};

use super::Library;

/// Outcome of closing a loan, assessed on the return day. No fine exists yet;
/// pass the receipt to `Library::issue_return_fine` to charge it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnReceipt {
    pub loan: Loan,
    pub days_overdue: i64,
    pub fine_due: Decimal,
}

impl ReturnReceipt {
    pub fn is_late(&self) -> bool {
        self.days_overdue > 0
    }
}

/// Which loans a list view wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanScope {
    All,
    Active,
    Overdue,
    Member(i64),
}

/// A loan with the names the desk shows next to it and its overdue figures
/// as of today.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanSummary {
    pub loan: Loan,
    pub member_name: String,
    pub member_email: String,
    pub media_title: String,
    pub days_overdue: i64,
    pub fine_due: Decimal,
}

impl<S: LibraryStore> Library<S> {
    /// Lend one copy of `media_id` to `member_id`, starting today.
    pub fn create_loan(&mut self, member_id: i64, media_id: i64) -> LibraryResult<Loan> {
        let today = self.today();
        self.create_loan_on(member_id, media_id, today)
    }

    /// Lend one copy with an explicit loan date. Eligibility and availability
    /// are checked against freshly loaded rows; the loan and both counters are
    /// written in one ledger call.
    pub fn create_loan_on(
        &mut self,
        member_id: i64,
        media_id: i64,
        loan_date: NaiveDate,
    ) -> LibraryResult<Loan> {
        let mut member: Member = self.store.get(member_id)?;
        let mut media: Media = self.store.get(media_id)?;

        self.ensure_can_borrow(&member)?;
        if !media.is_available() {
            return Err(LibraryError::validation(format!(
                "'{}' has no copies available.",
                media.title
            )));
        }

        let mut loan = Loan::new(&member, &media, loan_date);
        member.register_checkout();
        media.borrow_copy();
        self.store.record_checkout(&mut loan, &member, &media)?;

        info!(
            loan = loan.id,
            member = member.id,
            media = media.id,
            due = %loan.due_date(),
            "loan created"
        );
        Ok(loan)
    }

    /// Extend an on-time active loan by another loan period.
    pub fn renew_loan(&mut self, loan_id: i64) -> LibraryResult<Loan> {
        let today = self.today();
        let mut loan: Loan = self.store.get(loan_id)?;
        if let Some(reason) = loan.renewal_refusal(today) {
            return Err(LibraryError::Validation(reason));
        }

        let media: Media = self.store.get(loan.media_id)?;
        loan.renew(&media, today);
        self.store.update(&loan)?;

        info!(
            loan = loan.id,
            renewals = loan.renewal_count,
            due = %loan.due_date(),
            "loan renewed"
        );
        Ok(loan)
    }

    /// Close a loan today: the copy goes back on the shelf and the member's
    /// count drops, atomically. The receipt carries the late fee owed at this
    /// moment; charging it is a separate step.
    pub fn return_loan(&mut self, loan_id: i64) -> LibraryResult<ReturnReceipt> {
        let today = self.today();
        let mut loan: Loan = self.store.get(loan_id)?;
        if loan.is_returned() {
            return Err(LibraryError::validation(format!(
                "Loan #{loan_id} is already returned."
            )));
        }

        let mut member: Member = self.store.get(loan.member_id)?;
        let mut media: Media = self.store.get(loan.media_id)?;

        let days_overdue = loan.days_overdue(today);
        let fine_due = loan.calculate_fine(today, &self.policy);

        loan.return_media(today);
        media.return_copy();
        member.register_return();
        self.store.record_return(&loan, &member, &media)?;

        info!(loan = loan.id, days_overdue, fine = %fine_due, "loan returned");
        Ok(ReturnReceipt {
            loan,
            days_overdue,
            fine_due,
        })
    }

    pub fn loans(&self, scope: LoanScope) -> LibraryResult<Vec<Loan>> {
        match scope {
            LoanScope::All => Repository::<Loan>::list_all(&self.store),
            LoanScope::Active => self.store.active_loans(),
            LoanScope::Overdue => self.store.overdue_loans(self.today()),
            LoanScope::Member(member_id) => self.store.loans_for_member(member_id),
        }
    }

    /// Loans in `scope` joined with member and media names for display.
    pub fn loan_summaries(&self, scope: LoanScope) -> LibraryResult<Vec<LoanSummary>> {
        let today = self.today();
        let loans = self.loans(scope)?;

        let members: HashMap<i64, Member> = Repository::<Member>::list_all(&self.store)?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let titles: HashMap<i64, String> = Repository::<Media>::list_all(&self.store)?
            .into_iter()
            .map(|m| (m.id, m.title))
            .collect();

        Ok(loans
            .into_iter()
            .map(|loan| {
                let member = members.get(&loan.member_id);
                LoanSummary {
                    member_name: member
                        .map(Member::full_name)
                        .unwrap_or_else(|| format!("Member #{}", loan.member_id)),
                    member_email: member.map(|m| m.email.clone()).unwrap_or_default(),
                    media_title: titles
                        .get(&loan.media_id)
                        .cloned()
                        .unwrap_or_else(|| format!("Media #{}", loan.media_id)),
                    days_overdue: loan.days_overdue(today),
                    fine_due: loan.calculate_fine(today, &self.policy),
                    loan,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoanStatus, MemberStatus};
    use crate::services::fixtures::{desk, start};

    #[test]
    fn checkout_moves_both_counters_and_sets_due_date() {
        let mut desk = desk();
        let loan = desk
            .library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap();

        assert!(loan.id > 0);
        assert_eq!(loan.status(), LoanStatus::Active);
        assert_eq!(loan.renewal_count, 0);
        assert_eq!(loan.due_date(), NaiveDate::from_ymd_opt(2025, 1, 24).unwrap());

        let media: Media = desk.library.store().get(desk.media_id).unwrap();
        let member: Member = desk.library.store().get(desk.member_id).unwrap();
        assert_eq!(media.available_copies(), 1);
        assert_eq!(member.current_loans, 1);
    }

    #[test]
    fn checkout_refuses_when_no_copy_is_left() {
        let mut desk = desk();
        desk.library.create_loan(desk.member_id, desk.media_id).unwrap();
        desk.library.create_loan(desk.member_id, desk.media_id).unwrap();

        let err = desk
            .library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)), "{err:?}");

        let member: Member = desk.library.store().get(desk.member_id).unwrap();
        assert_eq!(member.current_loans, 2);
    }

    #[test]
    fn checkout_refuses_suspended_member_without_side_effects() {
        let mut desk = desk();
        let mut member: Member = desk.library.store().get(desk.member_id).unwrap();
        member.status = MemberStatus::Suspended;
        desk.library.store_mut().update(&member).unwrap();

        let err = desk
            .library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap_err();
        assert!(err.to_string().contains("Suspended"), "{err}");

        let media: Media = desk.library.store().get(desk.media_id).unwrap();
        assert_eq!(media.available_copies(), 2);
        assert!(desk.library.loans(LoanScope::All).unwrap().is_empty());
    }

    #[test]
    fn missing_member_is_not_found() {
        let mut desk = desk();
        let err = desk.library.create_loan(99, desk.media_id).unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { id: 99, .. }));
    }

    #[test]
    fn renewal_extends_until_limit() {
        let mut desk = desk();
        let loan = desk
            .library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap();
        let first_due = loan.due_date();

        let renewed = desk.library.renew_loan(loan.id).unwrap();
        assert_eq!(renewed.renewal_count, 1);
        assert_eq!((renewed.due_date() - first_due).num_days(), 14);

        desk.library.renew_loan(loan.id).unwrap();
        let err = desk.library.renew_loan(loan.id).unwrap_err();
        assert!(err.to_string().contains("maximum"), "{err}");

        let stored: Loan = desk.library.store().get(loan.id).unwrap();
        assert_eq!(stored.renewal_count, 2);
    }

    #[test]
    fn overdue_loan_cannot_be_renewed() {
        let mut desk = desk();
        let loan = desk
            .library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap();
        desk.clock.advance_days(15);

        let err = desk.library.renew_loan(loan.id).unwrap_err();
        assert!(err.to_string().contains("overdue"), "{err}");
    }

    #[test]
    fn late_return_restores_counters_and_reports_fine() {
        let mut desk = desk();
        let loan = desk
            .library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap();
        desk.clock.advance_days(14 + 20);

        let receipt = desk.library.return_loan(loan.id).unwrap();
        assert!(receipt.is_late());
        assert_eq!(receipt.days_overdue, 20);
        assert_eq!(receipt.fine_due, Decimal::new(1000, 2));
        assert!(receipt.loan.is_returned());
        assert!(!receipt.loan.is_overdue(desk.library.today()));

        let media: Media = desk.library.store().get(desk.media_id).unwrap();
        let member: Member = desk.library.store().get(desk.member_id).unwrap();
        assert_eq!(media.available_copies(), 2);
        assert_eq!(member.current_loans, 0);
        assert!(desk.library.store().outstanding_fines().unwrap().is_empty());
    }

    #[test]
    fn second_return_is_rejected() {
        let mut desk = desk();
        let loan = desk
            .library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap();
        desk.library.return_loan(loan.id).unwrap();

        let err = desk.library.return_loan(loan.id).unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
        let media: Media = desk.library.store().get(desk.media_id).unwrap();
        assert_eq!(media.available_copies(), 2);
    }

    #[test]
    fn summaries_carry_names_and_overdue_figures() {
        let mut desk = desk();
        desk.library
            .create_loan_on(desk.member_id, desk.media_id, start())
            .unwrap();
        desk.clock.advance_days(19);

        let overdue = desk.library.loan_summaries(LoanScope::Overdue).unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].member_name, "John Doe");
        assert_eq!(overdue[0].media_title, "Nineteen Eighty-Four");
        assert_eq!(overdue[0].days_overdue, 5);
        assert_eq!(overdue[0].fine_due, Decimal::new(250, 2));

        let mine = desk
            .library
            .loan_summaries(LoanScope::Member(desk.member_id))
            .unwrap();
        assert_eq!(mine.len(), 1);
    }
}
