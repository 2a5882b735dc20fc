use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{EntityKind, LibraryError, LibraryResult};
use crate::models::{Author, Category, Media, MediaType};

use super::constraint_error;

/// Media rows come back with their author and category joined in, so the
/// loan-duration rule and list views never need a second query.
const SELECT_MEDIA: &str = "SELECT m.id, m.title, m.isbn, m.publish_year, m.publisher, m.type,
        m.total_copies, m.available_copies, m.location, m.description, m.language,
        a.id, a.first_name, a.last_name, a.biography, a.nationality,
        c.id, c.name, c.description, c.loan_duration_days
    FROM media m
    LEFT JOIN authors a ON a.id = m.author_id
    LEFT JOIN categories c ON c.id = m.category_id";

fn media_from_row(row: &Row<'_>) -> rusqlite::Result<Media> {
    let title: String = row.get(1)?;
    let media_type: MediaType = row.get(5)?;
    let total: u32 = row.get(6)?;

    let mut media = Media::new(&title, media_type, total);
    media.id = row.get(0)?;
    media.isbn = row.get(2)?;
    media.publish_year = row.get(3)?;
    media.publisher = row.get(4)?;
    media.set_available_copies(row.get(7)?);
    media.location = row.get(8)?;
    media.description = row.get(9)?;
    media.language = row.get(10)?;

    media.author = match row.get::<_, Option<i64>>(11)? {
        Some(id) => Some(Author {
            id,
            first_name: row.get(12)?,
            last_name: row.get(13)?,
            biography: row.get(14)?,
            nationality: row.get(15)?,
        }),
        None => None,
    };
    media.category = match row.get::<_, Option<i64>>(16)? {
        Some(id) => Some(Category {
            id,
            name: row.get(17)?,
            description: row.get(18)?,
            loan_duration_days: row.get(19)?,
        }),
        None => None,
    };

    Ok(media)
}

fn query_media(
    conn: &Connection,
    clause: &str,
    args: impl rusqlite::Params,
) -> LibraryResult<Vec<Media>> {
    let mut stmt = conn.prepare(&format!("{SELECT_MEDIA} {clause}"))?;
    let media = stmt
        .query_map(args, media_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(media)
}

pub fn fetch_media(conn: &Connection) -> LibraryResult<Vec<Media>> {
    query_media(conn, "ORDER BY m.title COLLATE NOCASE", [])
}

pub fn fetch_media_item(conn: &Connection, id: i64) -> LibraryResult<Option<Media>> {
    let media = conn
        .query_row(
            &format!("{SELECT_MEDIA} WHERE m.id = ?1"),
            params![id],
            media_from_row,
        )
        .optional()?;
    Ok(media)
}

pub fn fetch_media_in_category(conn: &Connection, category_id: i64) -> LibraryResult<Vec<Media>> {
    query_media(
        conn,
        "WHERE m.category_id = ?1 ORDER BY m.title COLLATE NOCASE",
        params![category_id],
    )
}

pub fn fetch_media_by_author(conn: &Connection, author_id: i64) -> LibraryResult<Vec<Media>> {
    query_media(
        conn,
        "WHERE m.author_id = ?1 ORDER BY m.title COLLATE NOCASE",
        params![author_id],
    )
}

pub fn insert_media(conn: &Connection, media: &Media) -> LibraryResult<i64> {
    let category_id = filed_under(media)?;
    conn.execute(
        "INSERT INTO media (title, isbn, publish_year, publisher, type, total_copies,
             available_copies, location, author_id, category_id, description, language)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            media.title,
            media.isbn,
            media.publish_year,
            media.publisher,
            media.media_type,
            media.total_copies(),
            media.available_copies(),
            media.location,
            media.author.as_ref().map(|a| a.id),
            category_id,
            media.description,
            media.language
        ],
    )
    .map_err(|err| missing_reference(err, media))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_media(conn: &Connection, media: &Media) -> LibraryResult<()> {
    let category_id = filed_under(media)?;
    let updated = conn
        .execute(
            "UPDATE media SET title = ?1, isbn = ?2, publish_year = ?3, publisher = ?4,
                 type = ?5, total_copies = ?6, available_copies = ?7, location = ?8,
                 author_id = ?9, category_id = ?10, description = ?11, language = ?12
             WHERE id = ?13",
            params![
                media.title,
                media.isbn,
                media.publish_year,
                media.publisher,
                media.media_type,
                media.total_copies(),
                media.available_copies(),
                media.location,
                media.author.as_ref().map(|a| a.id),
                category_id,
                media.description,
                media.language,
                media.id
            ],
        )
        .map_err(|err| missing_reference(err, media))?;

    if updated == 0 {
        Err(LibraryError::not_found(EntityKind::Media, media.id))
    } else {
        Ok(())
    }
}

/// Items with loan history stay in the catalog.
pub fn delete_media(conn: &Connection, id: i64) -> LibraryResult<()> {
    let deleted = conn
        .execute("DELETE FROM media WHERE id = ?1", params![id])
        .map_err(|err| constraint_error(err, || format!("Media #{id} has loan history.")))?;

    if deleted == 0 {
        Err(LibraryError::not_found(EntityKind::Media, id))
    } else {
        Ok(())
    }
}

fn filed_under(media: &Media) -> LibraryResult<i64> {
    media
        .category
        .as_ref()
        .map(|c| c.id)
        .ok_or_else(|| LibraryError::validation("Category must be selected."))
}

fn missing_reference(err: rusqlite::Error, media: &Media) -> LibraryError {
    constraint_error(err, || {
        format!(
            "'{}' references an author or category that does not exist.",
            media.title
        )
    })
}
