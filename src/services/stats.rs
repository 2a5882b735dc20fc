use rust_decimal::Decimal;

use crate::error::LibraryResult;
use crate::models::{Fine, Loan, Media, Member};
use crate::store::{LibraryQueries, LibraryStore, Repository};

use super::Library;

/// Dashboard figures, computed fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LibraryStats {
    pub total_members: usize,
    pub active_members: usize,
    pub titles: usize,
    pub total_copies: u32,
    pub available_copies: u32,
    pub total_loans: usize,
    pub active_loans: usize,
    pub overdue_loans: usize,
    pub total_fines: usize,
    pub outstanding_fines: usize,
    pub outstanding_amount: Decimal,
    pub average_fine: Decimal,
}

impl LibraryStats {
    pub fn inactive_members(&self) -> usize {
        self.total_members - self.active_members
    }

    pub fn copies_on_loan(&self) -> u32 {
        self.total_copies - self.available_copies
    }
}

impl<S: LibraryStore> Library<S> {
    pub fn stats(&self) -> LibraryResult<LibraryStats> {
        let members: Vec<Member> = self.store.list_all()?;
        let media: Vec<Media> = self.store.list_all()?;
        let fines: Vec<Fine> = self.store.list_all()?;
        let outstanding = self.store.outstanding_fines()?;

        let fine_total: Decimal = fines.iter().map(Fine::amount).sum();
        let average_fine = if fines.is_empty() {
            Decimal::ZERO
        } else {
            (fine_total / Decimal::from(fines.len())).round_dp(2)
        };

        Ok(LibraryStats {
            total_members: members.len(),
            active_members: members.iter().filter(|m| m.is_active()).count(),
            titles: media.len(),
            total_copies: media.iter().map(Media::total_copies).sum(),
            available_copies: media.iter().map(Media::available_copies).sum(),
            total_loans: Repository::<Loan>::count(&self.store)?,
            active_loans: self.store.active_loans()?.len(),
            overdue_loans: self.store.overdue_loans(self.today())?.len(),
            total_fines: fines.len(),
            outstanding_fines: outstanding.len(),
            outstanding_amount: outstanding.iter().map(Fine::amount).sum(),
            average_fine,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::desk;

    #[test]
    fn stats_follow_circulation() {
        let mut desk = desk();
        let loan = desk.library.create_loan(desk.member_id, desk.media_id).unwrap();
        desk.clock.advance_days(14 + 6);
        desk.library.generate_overdue_fines().unwrap();
        desk.library
            .create_fine(desk.member_id, Some(loan.id), Decimal::ONE, "Torn page")
            .unwrap();

        let stats = desk.library.stats().unwrap();
        assert_eq!(stats.total_members, 1);
        assert_eq!(stats.inactive_members(), 0);
        assert_eq!(stats.titles, 1);
        assert_eq!(stats.copies_on_loan(), 1);
        assert_eq!(stats.active_loans, 1);
        assert_eq!(stats.overdue_loans, 1);
        assert_eq!(stats.total_fines, 2);
        assert_eq!(stats.outstanding_amount, Decimal::new(400, 2));
        assert_eq!(stats.average_fine, Decimal::new(200, 2));
    }
}
