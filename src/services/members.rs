use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::{LibraryError, LibraryResult};
use crate::models::{Fine, Loan, Member};
use crate::store::{LibraryQueries, LibraryStore, Repository};

use super::Library;

/// A member whose stored loan count disagreed with the loan table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanCountDrift {
    pub member_id: i64,
    pub member_name: String,
    pub recorded: u32,
    pub actual: u32,
}

/// Member row for the desk with live loan and balance figures.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberSummary {
    pub member: Member,
    pub active_loans: u32,
    pub outstanding: Decimal,
}

impl<S: LibraryStore> Library<S> {
    /// Validation error naming the reason `member` may not borrow.
    pub fn ensure_can_borrow(&self, member: &Member) -> LibraryResult<()> {
        match member.borrow_refusal() {
            Some(reason) => Err(LibraryError::Validation(reason)),
            None => Ok(()),
        }
    }

    /// Eligibility of a member as currently stored.
    pub fn check_eligibility(&self, member_id: i64) -> LibraryResult<()> {
        let member: Member = self.store.get(member_id)?;
        self.ensure_can_borrow(&member)
    }

    /// Rebuild `current_loans` from the active loans on record. Returns one
    /// entry per member that had to be corrected.
    pub fn reconcile_loan_counts(&mut self) -> LibraryResult<Vec<LoanCountDrift>> {
        let actual = self.store.active_loan_counts()?;
        let members: Vec<Member> = self.store.list_all()?;
        let mut drifts = Vec::new();

        for mut member in members {
            let count = actual.get(&member.id).copied().unwrap_or(0);
            if member.current_loans == count {
                continue;
            }

            let drift = LoanCountDrift {
                member_id: member.id,
                member_name: member.full_name(),
                recorded: member.current_loans,
                actual: count,
            };
            member.current_loans = count;
            self.store.update(&member)?;

            warn!(
                member = drift.member_id,
                recorded = drift.recorded,
                actual = drift.actual,
                "corrected member loan count"
            );
            drifts.push(drift);
        }

        info!(corrected = drifts.len(), "loan counts reconciled");
        Ok(drifts)
    }

    /// Every member with live loan counts and outstanding balances.
    pub fn member_summaries(&self) -> LibraryResult<Vec<MemberSummary>> {
        let loans = self.store.active_loan_counts()?;
        let mut balances: HashMap<i64, Decimal> = HashMap::new();
        for fine in self.store.outstanding_fines()? {
            *balances.entry(fine.member_id).or_default() += fine.amount();
        }

        let members: Vec<Member> = self.store.list_all()?;
        Ok(members
            .into_iter()
            .map(|member| MemberSummary {
                active_loans: loans.get(&member.id).copied().unwrap_or(0),
                outstanding: balances.get(&member.id).copied().unwrap_or_default(),
                member,
            })
            .collect())
    }

    /// Loans and fines of one member, newest first.
    pub fn member_history(&self, member_id: i64) -> LibraryResult<(Vec<Loan>, Vec<Fine>)> {
        let _member: Member = self.store.get(member_id)?;
        Ok((
            self.store.loans_for_member(member_id)?,
            self.store.fines_for_member(member_id)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemberStatus;
    use crate::services::fixtures::desk;

    #[test]
    fn limit_reached_blocks_borrowing() {
        let desk = desk();
        let mut member: Member = desk.library.store().get(desk.member_id).unwrap();
        member.current_loans = member.max_loans;
        let err = desk.library.ensure_can_borrow(&member).unwrap_err();
        assert!(err.to_string().contains("loan limit"), "{err}");

        member.current_loans = member.max_loans - 1;
        assert!(desk.library.ensure_can_borrow(&member).is_ok());
    }

    #[test]
    fn inactive_status_blocks_borrowing() {
        let mut desk = desk();
        let mut member: Member = desk.library.store().get(desk.member_id).unwrap();
        member.status = MemberStatus::Inactive;
        desk.library.store_mut().update(&member).unwrap();

        assert!(desk.library.check_eligibility(desk.member_id).is_err());
        assert!(desk.library.check_eligibility(404).is_err());
    }

    #[test]
    fn reconciliation_fixes_drifted_counts() {
        let mut desk = desk();
        desk.library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap();

        let mut member: Member = desk.library.store().get(desk.member_id).unwrap();
        member.current_loans = 4;
        desk.library.store_mut().update(&member).unwrap();

        let drifts = desk.library.reconcile_loan_counts().unwrap();
        assert_eq!(
            drifts,
            vec![LoanCountDrift {
                member_id: desk.member_id,
                member_name: "John Doe".to_string(),
                recorded: 4,
                actual: 1,
            }]
        );
        let member: Member = desk.library.store().get(desk.member_id).unwrap();
        assert_eq!(member.current_loans, 1);
        assert!(desk.library.reconcile_loan_counts().unwrap().is_empty());
    }

    #[test]
    fn summaries_report_loans_and_balance() {
        let mut desk = desk();
        desk.library
            .create_loan(desk.member_id, desk.media_id)
            .unwrap();
        desk.library
            .create_fine(desk.member_id, None, Decimal::new(75, 2), "Late")
            .unwrap();

        let summaries = desk.library.member_summaries().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].active_loans, 1);
        assert_eq!(summaries[0].outstanding, Decimal::new(75, 2));

        let (loans, fines) = desk.library.member_history(desk.member_id).unwrap();
        assert_eq!((loans.len(), fines.len()), (1, 1));
    }
}
