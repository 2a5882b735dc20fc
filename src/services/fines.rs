use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{LibraryError, LibraryResult};
use crate::models::{Fine, Loan, Member};
use crate::store::{LibraryQueries, LibraryStore, Repository};

use super::{Library, ReturnReceipt};

/// Which fines a list view wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FineScope {
    All,
    Outstanding,
    Member(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FineSummary {
    pub fine: Fine,
    pub member_name: String,
}

/// Reason recorded on late-return fines.
pub(crate) fn overdue_reason(days: i64) -> String {
    format!("Overdue return - {days} days late")
}

impl<S: LibraryStore> Library<S> {
    /// Charge a member. The amount is rounded to cents and must not be
    /// negative; a referenced loan has to belong to the same member.
    pub fn create_fine(
        &mut self,
        member_id: i64,
        loan_id: Option<i64>,
        amount: Decimal,
        reason: &str,
    ) -> LibraryResult<Fine> {
        if amount < Decimal::ZERO {
            return Err(LibraryError::validation("Fine amount cannot be negative."));
        }
        let _member: Member = self.store.get(member_id)?;
        if let Some(loan_id) = loan_id {
            let loan: Loan = self.store.get(loan_id)?;
            if loan.member_id != member_id {
                return Err(LibraryError::validation(format!(
                    "Loan #{loan_id} does not belong to member #{member_id}."
                )));
            }
        }

        let mut fine = Fine::new(member_id, loan_id, amount, reason, self.today());
        self.store.create(&mut fine)?;
        info!(fine = fine.id, member = member_id, amount = %fine.amount(), "fine issued");
        Ok(fine)
    }

    /// Charge the late fee a return receipt reported. Returns `None` for an
    /// on-time return.
    pub fn issue_return_fine(&mut self, receipt: &ReturnReceipt) -> LibraryResult<Option<Fine>> {
        if receipt.fine_due <= Decimal::ZERO {
            return Ok(None);
        }
        let fine = self.create_fine(
            receipt.loan.member_id,
            Some(receipt.loan.id),
            receipt.fine_due,
            &overdue_reason(receipt.days_overdue),
        )?;
        Ok(Some(fine))
    }

    /// Charge every overdue loan that has no outstanding fine yet. Running it
    /// twice on the same day creates nothing new. A loan whose earlier fine
    /// was paid or waived is charged again.
    pub fn generate_overdue_fines(&mut self) -> LibraryResult<Vec<Fine>> {
        let today = self.today();
        let overdue = self.store.overdue_loans(today)?;
        let mut created = Vec::new();

        for loan in overdue {
            let already_charged = self
                .store
                .fines_for_loan(loan.id)?
                .iter()
                .any(Fine::is_outstanding);
            if already_charged {
                debug!(loan = loan.id, "overdue loan already has an outstanding fine");
                continue;
            }

            let amount = loan.calculate_fine(today, &self.policy);
            if amount.is_zero() {
                continue;
            }
            let fine = self.create_fine(
                loan.member_id,
                Some(loan.id),
                amount,
                &overdue_reason(loan.days_overdue(today)),
            )?;
            created.push(fine);
        }

        info!(count = created.len(), "generated overdue fines");
        Ok(created)
    }

    pub fn pay_fine(&mut self, fine_id: i64) -> LibraryResult<Fine> {
        let today = self.today();
        let mut fine = self.outstanding_fine(fine_id)?;
        fine.mark_as_paid(today);
        self.store.update(&fine)?;
        info!(fine = fine.id, amount = %fine.amount(), "fine paid");
        Ok(fine)
    }

    /// Forgive an outstanding fine. The paid date is stamped with today.
    pub fn waive_fine(&mut self, fine_id: i64) -> LibraryResult<Fine> {
        let today = self.today();
        let mut fine = self.outstanding_fine(fine_id)?;
        fine.waive(today);
        self.store.update(&fine)?;
        info!(fine = fine.id, amount = %fine.amount(), "fine waived");
        Ok(fine)
    }

    /// Sum still owed, by one member or across the library.
    pub fn outstanding_balance(&self, member_id: Option<i64>) -> LibraryResult<Decimal> {
        self.store.outstanding_total(member_id)
    }

    pub fn fines(&self, scope: FineScope) -> LibraryResult<Vec<Fine>> {
        match scope {
            FineScope::All => Repository::<Fine>::list_all(&self.store),
            FineScope::Outstanding => self.store.outstanding_fines(),
            FineScope::Member(member_id) => self.store.fines_for_member(member_id),
        }
    }

    pub fn fine_summaries(&self, scope: FineScope) -> LibraryResult<Vec<FineSummary>> {
        let names: HashMap<i64, String> = Repository::<Member>::list_all(&self.store)?
            .into_iter()
            .map(|m| (m.id, m.full_name()))
            .collect();

        Ok(self
            .fines(scope)?
            .into_iter()
            .map(|fine| FineSummary {
                member_name: names
                    .get(&fine.member_id)
                    .cloned()
                    .unwrap_or_else(|| format!("Member #{}", fine.member_id)),
                fine,
            })
            .collect())
    }

    fn outstanding_fine(&self, fine_id: i64) -> LibraryResult<Fine> {
        let fine: Fine = self.store.get(fine_id)?;
        if !fine.is_outstanding() {
            return Err(LibraryError::validation(format!(
                "Fine #{fine_id} is already {}.",
                fine.status().as_str().to_lowercase()
            )));
        }
        Ok(fine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FineStatus;
    use crate::services::fixtures::desk;

    #[test]
    fn manual_fine_is_outstanding_and_dated_today() {
        let mut desk = desk();
        let fine = desk
            .library
            .create_fine(desk.member_id, None, Decimal::new(3333, 3), "Damaged cover")
            .unwrap();
        assert!(fine.is_outstanding());
        assert_eq!(fine.amount(), Decimal::new(333, 2));
        assert_eq!(fine.issue_date, desk.library.today());
    }

    #[test]
    fn negative_amount_is_rejected() {
        let mut desk = desk();
        let err = desk
            .library
            .create_fine(desk.member_id, None, Decimal::new(-1, 0), "Oops")
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
        assert!(desk.library.fines(FineScope::All).unwrap().is_empty());
    }

    #[test]
    fn loan_must_belong_to_member() {
        let mut desk = desk();
        let loan = desk
            .library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap();
        let mut other = Member::new("Jane", "Smith", "jane@example.com", desk.library.today());
        desk.library.store_mut().create(&mut other).unwrap();

        let err = desk
            .library
            .create_fine(other.id, Some(loan.id), Decimal::ONE, "Wrong member")
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
    }

    #[test]
    fn return_fine_uses_receipt_figures() {
        let mut desk = desk();
        let loan = desk
            .library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap();
        desk.clock.advance_days(14 + 5);

        let receipt = desk.library.return_loan(loan.id).unwrap();
        let fine = desk.library.issue_return_fine(&receipt).unwrap().unwrap();
        assert_eq!(fine.amount(), Decimal::new(250, 2));
        assert_eq!(fine.loan_id, Some(loan.id));
        assert_eq!(fine.reason, "Overdue return - 5 days late");
    }

    #[test]
    fn on_time_return_issues_nothing() {
        let mut desk = desk();
        let loan = desk
            .library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap();
        let receipt = desk.library.return_loan(loan.id).unwrap();
        assert_eq!(desk.library.issue_return_fine(&receipt).unwrap(), None);
    }

    #[test]
    fn overdue_generation_is_idempotent() {
        let mut desk = desk();
        let loan = desk
            .library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap();
        desk.clock.advance_days(14 + 3);

        let first = desk.library.generate_overdue_fines().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].amount(), Decimal::new(150, 2));
        assert_eq!(first[0].loan_id, Some(loan.id));

        let second = desk.library.generate_overdue_fines().unwrap();
        assert!(second.is_empty());
        assert_eq!(desk.library.fines(FineScope::All).unwrap().len(), 1);
    }

    #[test]
    fn settled_overdue_fine_is_charged_again() {
        let mut desk = desk();
        desk.library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap();
        desk.clock.advance_days(14 + 2);

        let first = desk.library.generate_overdue_fines().unwrap();
        desk.library.pay_fine(first[0].id).unwrap();

        desk.clock.advance_days(1);
        let again = desk.library.generate_overdue_fines().unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].amount(), Decimal::new(150, 2));
    }

    #[test]
    fn waiving_reduces_outstanding_balance() {
        let mut desk = desk();
        desk.library
            .create_fine(desk.member_id, None, Decimal::new(250, 2), "Late")
            .unwrap();
        let big = desk
            .library
            .create_fine(desk.member_id, None, Decimal::new(1000, 2), "Lost item")
            .unwrap();
        let before = desk
            .library
            .outstanding_balance(Some(desk.member_id))
            .unwrap();

        let waived = desk.library.waive_fine(big.id).unwrap();
        assert_eq!(waived.status(), FineStatus::Waived);
        assert_eq!(waived.paid_date(), Some(desk.library.today()));

        let after = desk
            .library
            .outstanding_balance(Some(desk.member_id))
            .unwrap();
        assert_eq!(before - after, Decimal::new(1000, 2));
        assert_eq!(desk.library.outstanding_balance(None).unwrap(), after);
    }

    #[test]
    fn settled_fines_cannot_transition_again() {
        let mut desk = desk();
        let fine = desk
            .library
            .create_fine(desk.member_id, None, Decimal::ONE, "Late")
            .unwrap();
        desk.library.pay_fine(fine.id).unwrap();

        let err = desk.library.waive_fine(fine.id).unwrap_err();
        assert_eq!(err.to_string(), format!("Fine #{} is already paid.", fine.id));
        let err = desk.library.pay_fine(fine.id).unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
    }
}
