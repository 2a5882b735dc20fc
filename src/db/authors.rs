use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{EntityKind, LibraryError, LibraryResult};
use crate::models::Author;

use super::constraint_error;

const SELECT_AUTHORS: &str =
    "SELECT id, first_name, last_name, biography, nationality FROM authors";

fn author_from_row(row: &Row<'_>) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        biography: row.get(3)?,
        nationality: row.get(4)?,
    })
}

/// Every author, ordered the way the catalog lists them.
pub fn fetch_authors(conn: &Connection) -> LibraryResult<Vec<Author>> {
    let mut stmt = conn.prepare(&format!("{SELECT_AUTHORS} ORDER BY last_name, first_name"))?;
    let authors = stmt
        .query_map([], author_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(authors)
}

pub fn fetch_author(conn: &Connection, id: i64) -> LibraryResult<Option<Author>> {
    let author = conn
        .query_row(
            &format!("{SELECT_AUTHORS} WHERE id = ?1"),
            params![id],
            author_from_row,
        )
        .optional()?;
    Ok(author)
}

pub fn insert_author(conn: &Connection, author: &Author) -> LibraryResult<i64> {
    conn.execute(
        "INSERT INTO authors (first_name, last_name, biography, nationality)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            author.first_name,
            author.last_name,
            author.biography,
            author.nationality
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_author(conn: &Connection, author: &Author) -> LibraryResult<()> {
    let updated = conn.execute(
        "UPDATE authors SET first_name = ?1, last_name = ?2, biography = ?3, nationality = ?4
         WHERE id = ?5",
        params![
            author.first_name,
            author.last_name,
            author.biography,
            author.nationality,
            author.id
        ],
    )?;

    if updated == 0 {
        Err(LibraryError::not_found(EntityKind::Author, author.id))
    } else {
        Ok(())
    }
}

/// Authors still credited on catalog items cannot be removed.
pub fn delete_author(conn: &Connection, id: i64) -> LibraryResult<()> {
    let deleted = conn
        .execute("DELETE FROM authors WHERE id = ?1", params![id])
        .map_err(|err| {
            constraint_error(err, || format!("Author #{id} is still credited on catalog items."))
        })?;

    if deleted == 0 {
        Err(LibraryError::not_found(EntityKind::Author, id))
    } else {
        Ok(())
    }
}
