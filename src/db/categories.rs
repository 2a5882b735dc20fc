use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{EntityKind, LibraryError, LibraryResult};
use crate::models::Category;

use super::constraint_error;

const SELECT_CATEGORIES: &str =
    "SELECT id, name, description, loan_duration_days FROM categories";

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        loan_duration_days: row.get(3)?,
    })
}

pub fn fetch_categories(conn: &Connection) -> LibraryResult<Vec<Category>> {
    let mut stmt = conn.prepare(&format!("{SELECT_CATEGORIES} ORDER BY name"))?;
    let categories = stmt
        .query_map([], category_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn fetch_category(conn: &Connection, id: i64) -> LibraryResult<Option<Category>> {
    let category = conn
        .query_row(
            &format!("{SELECT_CATEGORIES} WHERE id = ?1"),
            params![id],
            category_from_row,
        )
        .optional()?;
    Ok(category)
}

/// Category names are unique; a clash surfaces as a conflict.
pub fn insert_category(conn: &Connection, category: &Category) -> LibraryResult<i64> {
    conn.execute(
        "INSERT INTO categories (name, description, loan_duration_days) VALUES (?1, ?2, ?3)",
        params![
            category.name,
            category.description,
            category.loan_duration_days
        ],
    )
    .map_err(|err| duplicate_name(err, &category.name))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_category(conn: &Connection, category: &Category) -> LibraryResult<()> {
    let updated = conn
        .execute(
            "UPDATE categories SET name = ?1, description = ?2, loan_duration_days = ?3
             WHERE id = ?4",
            params![
                category.name,
                category.description,
                category.loan_duration_days,
                category.id
            ],
        )
        .map_err(|err| duplicate_name(err, &category.name))?;

    if updated == 0 {
        Err(LibraryError::not_found(EntityKind::Category, category.id))
    } else {
        Ok(())
    }
}

pub fn delete_category(conn: &Connection, id: i64) -> LibraryResult<()> {
    let deleted = conn
        .execute("DELETE FROM categories WHERE id = ?1", params![id])
        .map_err(|err| constraint_error(err, || format!("Category #{id} still has catalog items.")))?;

    if deleted == 0 {
        Err(LibraryError::not_found(EntityKind::Category, id))
    } else {
        Ok(())
    }
}

fn duplicate_name(err: rusqlite::Error, name: &str) -> LibraryError {
    constraint_error(err, || format!("Category '{name}' already exists."))
}
