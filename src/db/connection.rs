use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{LibraryError, LibraryResult};

/// Folder name used beneath the user's home directory for application data.
pub const DATA_DIR_NAME: &str = ".library-desk";
/// SQLite file name stored inside the application data directory.
pub const DB_FILE_NAME: &str = "library.sqlite";

/// Table definitions in dependency order. Deletes are restricted everywhere:
/// a member, item, or loan that history points at stays in the database.
const SCHEMA: &[(&str, &str)] = &[
    (
        "authors",
        "CREATE TABLE IF NOT EXISTS authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            biography TEXT NOT NULL DEFAULT '',
            nationality TEXT NOT NULL DEFAULT ''
        )",
    ),
    (
        "categories",
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            loan_duration_days INTEGER NOT NULL DEFAULT 14
        )",
    ),
    (
        "media",
        "CREATE TABLE IF NOT EXISTS media (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            isbn TEXT NOT NULL DEFAULT '',
            publish_year INTEGER,
            publisher TEXT NOT NULL DEFAULT '',
            type TEXT NOT NULL DEFAULT 'Book',
            total_copies INTEGER NOT NULL DEFAULT 1,
            available_copies INTEGER NOT NULL DEFAULT 1,
            location TEXT NOT NULL DEFAULT '',
            author_id INTEGER REFERENCES authors(id) ON DELETE RESTRICT,
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE RESTRICT,
            description TEXT NOT NULL DEFAULT '',
            language TEXT NOT NULL DEFAULT 'English',
            CHECK (available_copies >= 0 AND available_copies <= total_copies)
        )",
    ),
    (
        "members",
        "CREATE TABLE IF NOT EXISTS members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            phone TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            birth_date TEXT,
            status TEXT NOT NULL DEFAULT 'Active',
            max_loans INTEGER NOT NULL DEFAULT 5,
            current_loans INTEGER NOT NULL DEFAULT 0,
            member_since TEXT NOT NULL
        )",
    ),
    (
        "staff",
        "CREATE TABLE IF NOT EXISTS staff (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            position TEXT NOT NULL DEFAULT '',
            department TEXT NOT NULL DEFAULT '',
            hire_date TEXT NOT NULL,
            salary TEXT NOT NULL DEFAULT '0.00',
            status TEXT NOT NULL DEFAULT 'Active',
            username TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL DEFAULT 'Librarian'
        )",
    ),
    (
        "loans",
        "CREATE TABLE IF NOT EXISTS loans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id INTEGER NOT NULL REFERENCES members(id) ON DELETE RESTRICT,
            media_id INTEGER NOT NULL REFERENCES media(id) ON DELETE RESTRICT,
            loan_date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            return_date TEXT,
            status TEXT NOT NULL DEFAULT 'Active',
            renewal_count INTEGER NOT NULL DEFAULT 0,
            max_renewals INTEGER NOT NULL DEFAULT 2,
            notes TEXT NOT NULL DEFAULT ''
        )",
    ),
    (
        "fines",
        "CREATE TABLE IF NOT EXISTS fines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id INTEGER NOT NULL REFERENCES members(id) ON DELETE RESTRICT,
            loan_id INTEGER REFERENCES loans(id) ON DELETE RESTRICT,
            amount TEXT NOT NULL DEFAULT '0.00',
            reason TEXT NOT NULL DEFAULT '',
            issue_date TEXT NOT NULL,
            paid_date TEXT,
            status TEXT NOT NULL DEFAULT 'Outstanding',
            description TEXT NOT NULL DEFAULT ''
        )",
    ),
];

/// Open (creating if needed) the database at `path` and run lazy
/// migrations. The parent directory is created on demand.
pub fn open_database(path: &Path) -> LibraryResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    info!(path = %path.display(), "opened library database");
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Toggle `PRAGMA foreign_keys = ON` and create any missing table. Safe to run
/// on every start.
pub fn ensure_schema(conn: &Connection) -> LibraryResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON")?;

    for (table, sql) in SCHEMA {
        conn.execute(sql, [])?;
        debug!(table, "ensured table");
    }

    Ok(())
}

/// Application data directory inside the user's home.
pub fn data_dir() -> LibraryResult<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| {
        LibraryError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not locate home directory",
        ))
    })?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, SCHEMA.len() as i64);
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO loans (member_id, media_id, loan_date, due_date) VALUES (1, 1, '2025-01-01', '2025-01-15')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn media_rows_need_a_category() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let result = conn.execute("INSERT INTO media (title) VALUES ('No Category')", []);
        assert!(result.is_err());
    }
}
