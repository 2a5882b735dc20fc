//! SQLite persistence, one module per table plus the `SqliteStore` that wires
//! them into the storage traits.

mod authors;
mod categories;
mod columns;
mod connection;
mod fines;
mod loans;
mod media;
mod members;
mod seed;
mod staff;

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, ErrorCode};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{LibraryError, LibraryResult};
use crate::models::{Author, Category, Fine, Loan, Media, Member, Staff};
use crate::store::{CirculationLedger, LibraryQueries, Repository};

pub use connection::{data_dir, ensure_schema, open_database, DATA_DIR_NAME, DB_FILE_NAME};

/// Map SQLite constraint failures (unique, foreign key, check) to a
/// `Conflict` carrying a readable message; anything else stays a database
/// error.
fn constraint_error(err: rusqlite::Error, message: impl FnOnce() -> String) -> LibraryError {
    if matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        LibraryError::Conflict(message())
    } else {
        err.into()
    }
}

/// Production store. Owns the connection; it closes when the store drops.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database file and make sure every table exists.
    pub fn open(path: &Path) -> LibraryResult<Self> {
        Ok(Self {
            conn: open_database(path)?,
        })
    }

    /// Throwaway database, used by tests.
    pub fn open_in_memory() -> LibraryResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection, running the schema migrations on it.
    pub fn from_connection(conn: Connection) -> LibraryResult<Self> {
        ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Seed the sample catalog into an empty database.
    pub fn seed_sample_data(&mut self, today: NaiveDate) -> LibraryResult<bool> {
        seed::seed_sample_data(&mut self.conn, today)
    }

    fn count_rows(&self, table: &str) -> LibraryResult<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl Repository<Author> for SqliteStore {
    fn create(&mut self, entity: &mut Author) -> LibraryResult<i64> {
        let id = authors::insert_author(&self.conn, entity)?;
        entity.id = id;
        Ok(id)
    }

    fn update(&mut self, entity: &Author) -> LibraryResult<()> {
        authors::update_author(&self.conn, entity)
    }

    fn delete(&mut self, id: i64) -> LibraryResult<()> {
        authors::delete_author(&self.conn, id)
    }

    fn find_by_id(&self, id: i64) -> LibraryResult<Option<Author>> {
        authors::fetch_author(&self.conn, id)
    }

    fn list_all(&self) -> LibraryResult<Vec<Author>> {
        authors::fetch_authors(&self.conn)
    }

    fn count(&self) -> LibraryResult<usize> {
        self.count_rows("authors")
    }
}

impl Repository<Category> for SqliteStore {
    fn create(&mut self, entity: &mut Category) -> LibraryResult<i64> {
        let id = categories::insert_category(&self.conn, entity)?;
        entity.id = id;
        Ok(id)
    }

    fn update(&mut self, entity: &Category) -> LibraryResult<()> {
        categories::update_category(&self.conn, entity)
    }

    fn delete(&mut self, id: i64) -> LibraryResult<()> {
        categories::delete_category(&self.conn, id)
    }

    fn find_by_id(&self, id: i64) -> LibraryResult<Option<Category>> {
        categories::fetch_category(&self.conn, id)
    }

    fn list_all(&self) -> LibraryResult<Vec<Category>> {
        categories::fetch_categories(&self.conn)
    }

    fn count(&self) -> LibraryResult<usize> {
        self.count_rows("categories")
    }
}

impl Repository<Media> for SqliteStore {
    fn create(&mut self, entity: &mut Media) -> LibraryResult<i64> {
        let id = media::insert_media(&self.conn, entity)?;
        entity.id = id;
        Ok(id)
    }

    fn update(&mut self, entity: &Media) -> LibraryResult<()> {
        media::update_media(&self.conn, entity)
    }

    fn delete(&mut self, id: i64) -> LibraryResult<()> {
        media::delete_media(&self.conn, id)
    }

    fn find_by_id(&self, id: i64) -> LibraryResult<Option<Media>> {
        media::fetch_media_item(&self.conn, id)
    }

    fn list_all(&self) -> LibraryResult<Vec<Media>> {
        media::fetch_media(&self.conn)
    }

    fn count(&self) -> LibraryResult<usize> {
        self.count_rows("media")
    }
}

impl Repository<Member> for SqliteStore {
    fn create(&mut self, entity: &mut Member) -> LibraryResult<i64> {
        let id = members::insert_member(&self.conn, entity)?;
        entity.id = id;
        Ok(id)
    }

    fn update(&mut self, entity: &Member) -> LibraryResult<()> {
        members::update_member(&self.conn, entity)
    }

    fn delete(&mut self, id: i64) -> LibraryResult<()> {
        members::delete_member(&self.conn, id)
    }

    fn find_by_id(&self, id: i64) -> LibraryResult<Option<Member>> {
        members::fetch_member(&self.conn, id)
    }

    fn list_all(&self) -> LibraryResult<Vec<Member>> {
        members::fetch_members(&self.conn)
    }

    fn count(&self) -> LibraryResult<usize> {
        self.count_rows("members")
    }
}

impl Repository<Staff> for SqliteStore {
    fn create(&mut self, entity: &mut Staff) -> LibraryResult<i64> {
        let id = staff::insert_staff(&self.conn, entity)?;
        entity.id = id;
        Ok(id)
    }

    fn update(&mut self, entity: &Staff) -> LibraryResult<()> {
        staff::update_staff(&self.conn, entity)
    }

    fn delete(&mut self, id: i64) -> LibraryResult<()> {
        staff::delete_staff(&self.conn, id)
    }

    fn find_by_id(&self, id: i64) -> LibraryResult<Option<Staff>> {
        staff::fetch_staff_member(&self.conn, id)
    }

    fn list_all(&self) -> LibraryResult<Vec<Staff>> {
        staff::fetch_staff(&self.conn)
    }

    fn count(&self) -> LibraryResult<usize> {
        self.count_rows("staff")
    }
}

impl Repository<Loan> for SqliteStore {
    fn create(&mut self, entity: &mut Loan) -> LibraryResult<i64> {
        let id = loans::insert_loan(&self.conn, entity)?;
        entity.id = id;
        Ok(id)
    }

    fn update(&mut self, entity: &Loan) -> LibraryResult<()> {
        loans::update_loan(&self.conn, entity)
    }

    fn delete(&mut self, id: i64) -> LibraryResult<()> {
        loans::delete_loan(&self.conn, id)
    }

    fn find_by_id(&self, id: i64) -> LibraryResult<Option<Loan>> {
        loans::fetch_loan(&self.conn, id)
    }

    fn list_all(&self) -> LibraryResult<Vec<Loan>> {
        loans::fetch_loans(&self.conn)
    }

    fn count(&self) -> LibraryResult<usize> {
        self.count_rows("loans")
    }
}

impl Repository<Fine> for SqliteStore {
    fn create(&mut self, entity: &mut Fine) -> LibraryResult<i64> {
        let id = fines::insert_fine(&self.conn, entity)?;
        entity.id = id;
        Ok(id)
    }

    fn update(&mut self, entity: &Fine) -> LibraryResult<()> {
        fines::update_fine(&self.conn, entity)
    }

    fn delete(&mut self, id: i64) -> LibraryResult<()> {
        fines::delete_fine(&self.conn, id)
    }

    fn find_by_id(&self, id: i64) -> LibraryResult<Option<Fine>> {
        fines::fetch_fine(&self.conn, id)
    }

    fn list_all(&self) -> LibraryResult<Vec<Fine>> {
        fines::fetch_fines(&self.conn)
    }

    fn count(&self) -> LibraryResult<usize> {
        self.count_rows("fines")
    }
}

impl LibraryQueries for SqliteStore {
    fn active_loans(&self) -> LibraryResult<Vec<Loan>> {
        loans::fetch_active_loans(&self.conn)
    }

    fn overdue_loans(&self, today: NaiveDate) -> LibraryResult<Vec<Loan>> {
        debug!(%today, "querying overdue loans");
        loans::fetch_overdue_loans(&self.conn, today)
    }

    fn loans_for_member(&self, member_id: i64) -> LibraryResult<Vec<Loan>> {
        loans::fetch_loans_for_member(&self.conn, member_id)
    }

    fn loans_for_media(&self, media_id: i64) -> LibraryResult<Vec<Loan>> {
        loans::fetch_loans_for_media(&self.conn, media_id)
    }

    fn active_loan_counts(&self) -> LibraryResult<HashMap<i64, u32>> {
        Ok(members::fetch_active_loan_counts(&self.conn)?
            .into_iter()
            .collect())
    }

    fn outstanding_fines(&self) -> LibraryResult<Vec<Fine>> {
        fines::fetch_outstanding_fines(&self.conn)
    }

    fn fines_for_member(&self, member_id: i64) -> LibraryResult<Vec<Fine>> {
        fines::fetch_fines_for_member(&self.conn, member_id)
    }

    fn fines_for_loan(&self, loan_id: i64) -> LibraryResult<Vec<Fine>> {
        fines::fetch_fines_for_loan(&self.conn, loan_id)
    }

    fn outstanding_total(&self, member_id: Option<i64>) -> LibraryResult<Decimal> {
        fines::fetch_outstanding_total(&self.conn, member_id)
    }

    fn media_in_category(&self, category_id: i64) -> LibraryResult<Vec<Media>> {
        media::fetch_media_in_category(&self.conn, category_id)
    }

    fn media_by_author(&self, author_id: i64) -> LibraryResult<Vec<Media>> {
        media::fetch_media_by_author(&self.conn, author_id)
    }
}

impl CirculationLedger for SqliteStore {
    fn record_checkout(
        &mut self,
        loan: &mut Loan,
        member: &Member,
        media: &Media,
    ) -> LibraryResult<i64> {
        let tx = self.conn.transaction()?;
        let id = loans::insert_loan(&tx, loan)?;
        members::update_member(&tx, member)?;
        media::update_media(&tx, media)?;
        tx.commit()?;

        loan.id = id;
        info!(loan = id, member = member.id, media = media.id, "checkout committed");
        Ok(id)
    }

    fn record_return(&mut self, loan: &Loan, member: &Member, media: &Media) -> LibraryResult<()> {
        let tx = self.conn.transaction()?;
        loans::update_loan(&tx, loan)?;
        members::update_member(&tx, member)?;
        media::update_media(&tx, media)?;
        tx.commit()?;

        info!(loan = loan.id, member = member.id, media = media.id, "return committed");
        Ok(())
    }
}
