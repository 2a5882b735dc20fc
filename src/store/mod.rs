//! Storage contract consumed by the circulation services.
//!
//! `Repository<T>` is the per-entity CRUD surface, `LibraryQueries` adds the
//! aggregate reads the desk needs, and `CirculationLedger` groups the writes
//! that must land together (a loan row plus the counters it moves). Any type
//! implementing all three is a `LibraryStore`. `db::SqliteStore` is the
//! production implementation; `MemoryStore` backs the tests.

mod entity;
mod memory;

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{EntityKind, LibraryError, LibraryResult};
use crate::models::{Author, Category, Fine, Loan, Media, Member, Staff};

pub use memory::MemoryStore;

/// Anything the stores persist under a numeric id.
pub trait Entity: Clone {
    const KIND: EntityKind;

    /// 0 until the first save.
    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Case-insensitive substring match over the human-readable fields.
    /// `needle` is already trimmed and lowercased.
    fn matches(&self, needle: &str) -> bool;
}

pub trait Repository<T: Entity> {
    /// Insert `entity`, write the assigned id back into it, and return the id.
    fn create(&mut self, entity: &mut T) -> LibraryResult<i64>;

    fn update(&mut self, entity: &T) -> LibraryResult<()>;

    fn delete(&mut self, id: i64) -> LibraryResult<()>;

    fn find_by_id(&self, id: i64) -> LibraryResult<Option<T>>;

    fn list_all(&self) -> LibraryResult<Vec<T>>;

    /// Free-text search. A blank term returns everything.
    fn search(&self, term: &str) -> LibraryResult<Vec<T>> {
        let needle = term.trim().to_lowercase();
        let rows = self.list_all()?;
        if needle.is_empty() {
            return Ok(rows);
        }
        Ok(rows.into_iter().filter(|row| row.matches(&needle)).collect())
    }

    fn count(&self) -> LibraryResult<usize> {
        Ok(self.list_all()?.len())
    }

    /// Like `find_by_id` but a missing row is an error.
    fn get(&self, id: i64) -> LibraryResult<T> {
        self.find_by_id(id)?
            .ok_or_else(|| LibraryError::not_found(T::KIND, id))
    }
}

/// Aggregate reads. The defaults filter `list_all`; stores with a query
/// engine override them.
pub trait LibraryQueries:
    Repository<Media> + Repository<Member> + Repository<Loan> + Repository<Fine>
{
    fn active_loans(&self) -> LibraryResult<Vec<Loan>> {
        let loans = Repository::<Loan>::list_all(self)?;
        Ok(loans.into_iter().filter(Loan::is_active).collect())
    }

    fn overdue_loans(&self, today: NaiveDate) -> LibraryResult<Vec<Loan>> {
        let loans = self.active_loans()?;
        Ok(loans.into_iter().filter(|l| l.is_overdue(today)).collect())
    }

    fn loans_for_member(&self, member_id: i64) -> LibraryResult<Vec<Loan>> {
        let loans = Repository::<Loan>::list_all(self)?;
        Ok(loans
            .into_iter()
            .filter(|l| l.member_id == member_id)
            .collect())
    }

    fn loans_for_media(&self, media_id: i64) -> LibraryResult<Vec<Loan>> {
        let loans = Repository::<Loan>::list_all(self)?;
        Ok(loans.into_iter().filter(|l| l.media_id == media_id).collect())
    }

    /// Active loans per member id. Members without one are absent or zero.
    fn active_loan_counts(&self) -> LibraryResult<HashMap<i64, u32>> {
        let mut counts = HashMap::new();
        for loan in self.active_loans()? {
            *counts.entry(loan.member_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn outstanding_fines(&self) -> LibraryResult<Vec<Fine>> {
        let fines = Repository::<Fine>::list_all(self)?;
        Ok(fines.into_iter().filter(Fine::is_outstanding).collect())
    }

    fn fines_for_member(&self, member_id: i64) -> LibraryResult<Vec<Fine>> {
        let fines = Repository::<Fine>::list_all(self)?;
        Ok(fines
            .into_iter()
            .filter(|f| f.member_id == member_id)
            .collect())
    }

    fn fines_for_loan(&self, loan_id: i64) -> LibraryResult<Vec<Fine>> {
        let fines = Repository::<Fine>::list_all(self)?;
        Ok(fines
            .into_iter()
            .filter(|f| f.loan_id == Some(loan_id))
            .collect())
    }

    /// Sum of outstanding amounts, for one member or the whole library.
    fn outstanding_total(&self, member_id: Option<i64>) -> LibraryResult<Decimal> {
        let fines = self.outstanding_fines()?;
        Ok(fines
            .iter()
            .filter(|f| member_id.map_or(true, |id| f.member_id == id))
            .map(Fine::amount)
            .sum())
    }

    fn media_in_category(&self, category_id: i64) -> LibraryResult<Vec<Media>> {
        let media = Repository::<Media>::list_all(self)?;
        Ok(media
            .into_iter()
            .filter(|m| m.category.as_ref().map(|c| c.id) == Some(category_id))
            .collect())
    }

    fn media_by_author(&self, author_id: i64) -> LibraryResult<Vec<Media>> {
        let media = Repository::<Media>::list_all(self)?;
        Ok(media
            .into_iter()
            .filter(|m| m.author.as_ref().map(|a| a.id) == Some(author_id))
            .collect())
    }
}

/// Writes that must succeed or fail as one unit.
pub trait CirculationLedger {
    /// Insert `loan` (id written back) and persist the member and media
    /// counters that moved with it.
    fn record_checkout(
        &mut self,
        loan: &mut Loan,
        member: &Member,
        media: &Media,
    ) -> LibraryResult<i64>;

    /// Persist a closed loan with its restored counters.
    fn record_return(&mut self, loan: &Loan, member: &Member, media: &Media) -> LibraryResult<()>;
}

/// Everything `Library` needs from its backing store.
pub trait LibraryStore:
    Repository<Author>
    + Repository<Category>
    + Repository<Media>
    + Repository<Member>
    + Repository<Staff>
    + Repository<Loan>
    + Repository<Fine>
    + LibraryQueries
    + CirculationLedger
{
}

impl<S> LibraryStore for S where
    S: Repository<Author>
        + Repository<Category>
        + Repository<Media>
        + Repository<Member>
        + Repository<Staff>
        + Repository<Loan>
        + Repository<Fine>
        + LibraryQueries
        + CirculationLedger
{
}
