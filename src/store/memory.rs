use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{LibraryError, LibraryResult};
use crate::models::{Author, Category, Fine, Loan, Media, Member, Staff};

use super::{CirculationLedger, Entity, LibraryQueries, Repository};

/// Rows of one entity keyed by id, with the next id to hand out.
#[derive(Debug)]
pub struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// Store kept entirely in process memory. Mirrors the constraints of the
/// SQLite schema (unique names, foreign keys, restricted deletes) so tests
/// against it exercise the same failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    authors: Table<Author>,
    categories: Table<Category>,
    media: Table<Media>,
    members: Table<Member>,
    staff: Table<Staff>,
    loans: Table<Loan>,
    fines: Table<Fine>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-entity hooks used by the generic `Repository` impl below.
pub trait Stored<T: Entity> {
    fn table(&self) -> &Table<T>;

    fn table_mut(&mut self) -> &mut Table<T>;

    /// Refresh embedded copies of related rows on the way out.
    fn hydrate(&self, row: T) -> T {
        row
    }

    /// Uniqueness and foreign-key checks before an insert or update.
    fn check_constraints(&self, _row: &T) -> LibraryResult<()> {
        Ok(())
    }

    /// Restrict deletes of rows that other rows still point at.
    fn check_deletable(&self, _id: i64) -> LibraryResult<()> {
        Ok(())
    }
}

impl<T: Entity> Repository<T> for MemoryStore
where
    MemoryStore: Stored<T>,
{
    fn create(&mut self, entity: &mut T) -> LibraryResult<i64> {
        Stored::<T>::check_constraints(self, entity)?;
        let table = Stored::<T>::table_mut(self);
        let id = table.next_id;
        table.next_id += 1;
        entity.set_id(id);
        table.rows.insert(id, entity.clone());
        debug!(kind = %T::KIND, id, "inserted row");
        Ok(id)
    }

    fn update(&mut self, entity: &T) -> LibraryResult<()> {
        if !Stored::<T>::table(self).rows.contains_key(&entity.id()) {
            return Err(LibraryError::not_found(T::KIND, entity.id()));
        }
        Stored::<T>::check_constraints(self, entity)?;
        Stored::<T>::table_mut(self)
            .rows
            .insert(entity.id(), entity.clone());
        Ok(())
    }

    fn delete(&mut self, id: i64) -> LibraryResult<()> {
        if !Stored::<T>::table(self).rows.contains_key(&id) {
            return Err(LibraryError::not_found(T::KIND, id));
        }
        Stored::<T>::check_deletable(self, id)?;
        Stored::<T>::table_mut(self).rows.remove(&id);
        Ok(())
    }

    fn find_by_id(&self, id: i64) -> LibraryResult<Option<T>> {
        Ok(Stored::<T>::table(self)
            .rows
            .get(&id)
            .cloned()
            .map(|row| Stored::<T>::hydrate(self, row)))
    }

    fn list_all(&self) -> LibraryResult<Vec<T>> {
        Ok(Stored::<T>::table(self)
            .rows
            .values()
            .cloned()
            .map(|row| Stored::<T>::hydrate(self, row))
            .collect())
    }
}

impl Stored<Author> for MemoryStore {
    fn table(&self) -> &Table<Author> {
        &self.authors
    }

    fn table_mut(&mut self) -> &mut Table<Author> {
        &mut self.authors
    }

    fn check_deletable(&self, id: i64) -> LibraryResult<()> {
        let in_use = self
            .media
            .rows
            .values()
            .any(|m| m.author.as_ref().map(|a| a.id) == Some(id));
        if in_use {
            return Err(LibraryError::conflict(format!(
                "Author #{id} is still credited on catalog items."
            )));
        }
        Ok(())
    }
}

impl Stored<Category> for MemoryStore {
    fn table(&self) -> &Table<Category> {
        &self.categories
    }

    fn table_mut(&mut self) -> &mut Table<Category> {
        &mut self.categories
    }

    fn check_constraints(&self, row: &Category) -> LibraryResult<()> {
        let taken = self
            .categories
            .rows
            .values()
            .any(|c| c.id != row.id && c.name == row.name);
        if taken {
            return Err(LibraryError::conflict(format!(
                "Category '{}' already exists.",
                row.name
            )));
        }
        Ok(())
    }

    fn check_deletable(&self, id: i64) -> LibraryResult<()> {
        let in_use = self
            .media
            .rows
            .values()
            .any(|m| m.category.as_ref().map(|c| c.id) == Some(id));
        if in_use {
            return Err(LibraryError::conflict(format!(
                "Category #{id} still has catalog items."
            )));
        }
        Ok(())
    }
}

impl Stored<Media> for MemoryStore {
    fn table(&self) -> &Table<Media> {
        &self.media
    }

    fn table_mut(&mut self) -> &mut Table<Media> {
        &mut self.media
    }

    fn hydrate(&self, mut row: Media) -> Media {
        row.author = row
            .author
            .and_then(|a| self.authors.rows.get(&a.id).cloned());
        row.category = row
            .category
            .and_then(|c| self.categories.rows.get(&c.id).cloned());
        row
    }

    fn check_constraints(&self, row: &Media) -> LibraryResult<()> {
        if let Some(author) = &row.author {
            if !self.authors.rows.contains_key(&author.id) {
                return Err(LibraryError::conflict(format!(
                    "Author #{} does not exist.",
                    author.id
                )));
            }
        }
        match &row.category {
            None => Err(LibraryError::validation("Category must be selected.")),
            Some(category) if !self.categories.rows.contains_key(&category.id) => Err(
                LibraryError::conflict(format!("Category #{} does not exist.", category.id)),
            ),
            Some(_) => Ok(()),
        }
    }

    fn check_deletable(&self, id: i64) -> LibraryResult<()> {
        if self.loans.rows.values().any(|l| l.media_id == id) {
            return Err(LibraryError::conflict(format!(
                "Media #{id} has loan history."
            )));
        }
        Ok(())
    }
}

impl Stored<Member> for MemoryStore {
    fn table(&self) -> &Table<Member> {
        &self.members
    }

    fn table_mut(&mut self) -> &mut Table<Member> {
        &mut self.members
    }

    fn check_constraints(&self, row: &Member) -> LibraryResult<()> {
        let taken = self
            .members
            .rows
            .values()
            .any(|m| m.id != row.id && m.email.eq_ignore_ascii_case(&row.email));
        if taken {
            return Err(LibraryError::conflict(format!(
                "Email {} is already registered.",
                row.email
            )));
        }
        Ok(())
    }

    fn check_deletable(&self, id: i64) -> LibraryResult<()> {
        let referenced = self.loans.rows.values().any(|l| l.member_id == id)
            || self.fines.rows.values().any(|f| f.member_id == id);
        if referenced {
            return Err(LibraryError::conflict(format!(
                "Member #{id} has loans or fines on record."
            )));
        }
        Ok(())
    }
}

impl Stored<Staff> for MemoryStore {
    fn table(&self) -> &Table<Staff> {
        &self.staff
    }

    fn table_mut(&mut self) -> &mut Table<Staff> {
        &mut self.staff
    }

    fn check_constraints(&self, row: &Staff) -> LibraryResult<()> {
        let taken = self
            .staff
            .rows
            .values()
            .any(|s| s.id != row.id && s.username == row.username);
        if taken {
            return Err(LibraryError::conflict(format!(
                "Username {} is already taken.",
                row.username
            )));
        }
        Ok(())
    }
}

impl Stored<Loan> for MemoryStore {
    fn table(&self) -> &Table<Loan> {
        &self.loans
    }

    fn table_mut(&mut self) -> &mut Table<Loan> {
        &mut self.loans
    }

    fn check_constraints(&self, row: &Loan) -> LibraryResult<()> {
        if !self.members.rows.contains_key(&row.member_id) {
            return Err(LibraryError::conflict(format!(
                "Member #{} does not exist.",
                row.member_id
            )));
        }
        if !self.media.rows.contains_key(&row.media_id) {
            return Err(LibraryError::conflict(format!(
                "Media #{} does not exist.",
                row.media_id
            )));
        }
        Ok(())
    }

    fn check_deletable(&self, id: i64) -> LibraryResult<()> {
        if self.fines.rows.values().any(|f| f.loan_id == Some(id)) {
            return Err(LibraryError::conflict(format!(
                "Loan #{id} has fines attached."
            )));
        }
        Ok(())
    }
}

impl Stored<Fine> for MemoryStore {
    fn table(&self) -> &Table<Fine> {
        &self.fines
    }

    fn table_mut(&mut self) -> &mut Table<Fine> {
        &mut self.fines
    }

    fn check_constraints(&self, row: &Fine) -> LibraryResult<()> {
        if !self.members.rows.contains_key(&row.member_id) {
            return Err(LibraryError::conflict(format!(
                "Member #{} does not exist.",
                row.member_id
            )));
        }
        if let Some(loan_id) = row.loan_id {
            if !self.loans.rows.contains_key(&loan_id) {
                return Err(LibraryError::conflict(format!(
                    "Loan #{loan_id} does not exist."
                )));
            }
        }
        Ok(())
    }
}

impl LibraryQueries for MemoryStore {}

impl CirculationLedger for MemoryStore {
    fn record_checkout(
        &mut self,
        loan: &mut Loan,
        member: &Member,
        media: &Media,
    ) -> LibraryResult<i64> {
        // Validate every row first so a failure leaves nothing half-written.
        Stored::<Member>::check_constraints(self, member)?;
        Stored::<Media>::check_constraints(self, media)?;
        if !self.members.rows.contains_key(&member.id) {
            return Err(LibraryError::not_found(Member::KIND, member.id));
        }
        if !self.media.rows.contains_key(&media.id) {
            return Err(LibraryError::not_found(Media::KIND, media.id));
        }
        let id = Repository::<Loan>::create(self, loan)?;
        self.members.rows.insert(member.id, member.clone());
        self.media.rows.insert(media.id, media.clone());
        Ok(id)
    }

    fn record_return(&mut self, loan: &Loan, member: &Member, media: &Media) -> LibraryResult<()> {
        if !self.loans.rows.contains_key(&loan.id) {
            return Err(LibraryError::not_found(Loan::KIND, loan.id));
        }
        if !self.members.rows.contains_key(&member.id) {
            return Err(LibraryError::not_found(Member::KIND, member.id));
        }
        if !self.media.rows.contains_key(&media.id) {
            return Err(LibraryError::not_found(Media::KIND, media.id));
        }
        self.loans.rows.insert(loan.id, loan.clone());
        self.members.rows.insert(member.id, member.clone());
        self.media.rows.insert(media.id, media.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::MediaType;

    fn since() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let mut store = MemoryStore::new();
        let mut a = Author::new("Harper", "Lee");
        let mut b = Author::new("George", "Orwell");
        assert_eq!(store.create(&mut a).unwrap(), 1);
        assert_eq!(store.create(&mut b).unwrap(), 2);
        assert_eq!(b.id, 2);
        let found: Author = store.get(2).unwrap();
        assert_eq!(found.full_name(), "George Orwell");
    }

    #[test]
    fn duplicate_member_email_is_a_conflict() {
        let mut store = MemoryStore::new();
        let mut first = Member::new("A", "One", "same@example.org", since());
        let mut second = Member::new("B", "Two", "SAME@example.org", since());
        store.create(&mut first).unwrap();
        let err = store.create(&mut second).unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(_)));
    }

    #[test]
    fn media_reads_current_category() {
        let mut store = MemoryStore::new();
        let mut category = Category::new("Science", 21);
        store.create(&mut category).unwrap();
        let mut media = Media::new("Cosmos", MediaType::Book, 1);
        media.category = Some(category.clone());
        store.create(&mut media).unwrap();

        category.loan_duration_days = 28;
        store.update(&category).unwrap();

        let reloaded: Media = store.get(media.id).unwrap();
        assert_eq!(reloaded.loan_duration_days(), 28);
    }

    #[test]
    fn category_with_media_cannot_be_deleted() {
        let mut store = MemoryStore::new();
        let mut category = Category::new("Fiction", 14);
        store.create(&mut category).unwrap();
        let mut media = Media::new("1984", MediaType::Book, 1);
        media.category = Some(category.clone());
        store.create(&mut media).unwrap();

        let err = Repository::<Category>::delete(&mut store, category.id).unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(_)));
    }

    #[test]
    fn media_without_category_is_rejected() {
        let mut store = MemoryStore::new();
        let mut media = Media::new("No Category", MediaType::Magazine, 1);
        let err = store.create(&mut media).unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
        assert_eq!(err.to_string(), "Category must be selected.");
        assert_eq!(media.id, 0);
        assert_eq!(Repository::<Media>::count(&store).unwrap(), 0);
    }

    /// Two members, two titles and eleven loans of the second title by the
    /// second member.
    fn shelf() -> MemoryStore {
        let mut store = MemoryStore::new();
        let mut classics = Category::new("Classics", 21);
        store.create(&mut classics).unwrap();
        let mut austen = Author::new("Jane", "Austen");
        store.create(&mut austen).unwrap();

        let mut pride = Media::new("Pride and Prejudice", MediaType::Book, 3);
        pride.isbn = "978-0-14-143951-8".to_string();
        pride.author = Some(austen.clone());
        pride.category = Some(classics.clone());
        store.create(&mut pride).unwrap();
        let mut emma = Media::new("Emma", MediaType::Book, 20);
        emma.author = Some(austen);
        emma.category = Some(classics);
        store.create(&mut emma).unwrap();

        let mut john = Member::new("John", "Doe", "john.doe@email.com", since());
        let mut jane = Member::new("Jane", "Smith", "jane.smith@email.com", since());
        store.create(&mut john).unwrap();
        store.create(&mut jane).unwrap();

        for _ in 0..11 {
            let mut loan = Loan::new(&jane, &emma, since());
            store.create(&mut loan).unwrap();
        }
        store
    }

    fn ids<T: Entity>(rows: Vec<T>) -> Vec<i64> {
        rows.iter().map(Entity::id).collect()
    }

    #[test]
    fn media_search_ignores_case() {
        let store = shelf();
        let by_title: Vec<Media> = store.search("PRIDE").unwrap();
        assert_eq!(ids(by_title), vec![1]);
        let by_isbn: Vec<Media> = store.search("143951").unwrap();
        assert_eq!(ids(by_isbn), vec![1]);
        let by_author: Vec<Media> = store.search("aUsTeN").unwrap();
        assert_eq!(ids(by_author), vec![1, 2]);
        let by_id: Vec<Media> = store.search("2").unwrap();
        assert_eq!(ids(by_id), vec![2]);
        let none: Vec<Media> = store.search("orwell").unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn blank_search_returns_every_row() {
        let store = shelf();
        let media: Vec<Media> = store.search("").unwrap();
        let members: Vec<Member> = store.search("   ").unwrap();
        let loans: Vec<Loan> = store.search("").unwrap();
        assert_eq!(media.len(), 2);
        assert_eq!(members.len(), 2);
        assert_eq!(loans.len(), 11);
    }

    #[test]
    fn member_search_covers_name_email_and_id() {
        let store = shelf();
        let by_email: Vec<Member> = store.search("JOHN.DOE@EMAIL").unwrap();
        assert_eq!(ids(by_email), vec![1]);
        let by_name: Vec<Member> = store.search(" jane smith ").unwrap();
        assert_eq!(ids(by_name), vec![2]);
        let by_domain: Vec<Member> = store.search("Email.com").unwrap();
        assert_eq!(ids(by_domain), vec![1, 2]);
        let by_id: Vec<Member> = store.search("2").unwrap();
        assert_eq!(ids(by_id), vec![2]);
    }

    #[test]
    fn loan_search_wants_the_exact_id() {
        let store = shelf();
        let first: Vec<Loan> = store.search("1").unwrap();
        assert_eq!(ids(first), vec![1]);
        let eleventh: Vec<Loan> = store.search("11").unwrap();
        assert_eq!(ids(eleventh), vec![11]);
        let by_member: Vec<Loan> = store.search("2").unwrap();
        assert_eq!(by_member.len(), 11);
        let past_the_end: Vec<Loan> = store.search("12").unwrap();
        assert!(past_the_end.is_empty());
    }

    #[test]
    fn missing_rows_are_not_found() {
        let mut store = MemoryStore::new();
        let err = Repository::<Member>::delete(&mut store, 99).unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
        let found: Option<Member> = store.find_by_id(99).unwrap();
        assert!(found.is_none());
    }
}
