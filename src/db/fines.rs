use rust_decimal::Decimal;
use rusqlite::{params, Connection, OptionalExtension, Params, Row};

use crate::error::{EntityKind, LibraryError, LibraryResult};
use crate::models::Fine;

use super::columns::{decimal_at, decimal_text};
use super::constraint_error;

const SELECT_FINES: &str = "SELECT id, member_id, loan_id, amount, reason, issue_date, paid_date,
        status, description
    FROM fines";

fn fine_from_row(row: &Row<'_>) -> rusqlite::Result<Fine> {
    Ok(Fine {
        id: row.get(0)?,
        member_id: row.get(1)?,
        loan_id: row.get(2)?,
        amount: decimal_at(row, 3)?,
        reason: row.get(4)?,
        issue_date: row.get(5)?,
        paid_date: row.get(6)?,
        status: row.get(7)?,
        description: row.get(8)?,
    })
}

fn query_fines(conn: &Connection, clause: &str, args: impl Params) -> LibraryResult<Vec<Fine>> {
    let mut stmt = conn.prepare(&format!("{SELECT_FINES} {clause}"))?;
    let fines = stmt
        .query_map(args, fine_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(fines)
}

pub fn fetch_fines(conn: &Connection) -> LibraryResult<Vec<Fine>> {
    query_fines(conn, "ORDER BY issue_date DESC, id DESC", [])
}

pub fn fetch_fine(conn: &Connection, id: i64) -> LibraryResult<Option<Fine>> {
    let fine = conn
        .query_row(
            &format!("{SELECT_FINES} WHERE id = ?1"),
            params![id],
            fine_from_row,
        )
        .optional()?;
    Ok(fine)
}

pub fn fetch_outstanding_fines(conn: &Connection) -> LibraryResult<Vec<Fine>> {
    query_fines(
        conn,
        "WHERE status = 'Outstanding' ORDER BY issue_date DESC, id DESC",
        [],
    )
}

pub fn fetch_fines_for_member(conn: &Connection, member_id: i64) -> LibraryResult<Vec<Fine>> {
    query_fines(
        conn,
        "WHERE member_id = ?1 ORDER BY issue_date DESC, id DESC",
        params![member_id],
    )
}

pub fn fetch_fines_for_loan(conn: &Connection, loan_id: i64) -> LibraryResult<Vec<Fine>> {
    query_fines(
        conn,
        "WHERE loan_id = ?1 ORDER BY issue_date DESC, id DESC",
        params![loan_id],
    )
}

/// Outstanding amounts are summed in Rust; SQLite would add the TEXT column
/// as floating point.
pub fn fetch_outstanding_total(conn: &Connection, member_id: Option<i64>) -> LibraryResult<Decimal> {
    let mut stmt = conn.prepare(
        "SELECT amount FROM fines
         WHERE status = 'Outstanding' AND (?1 IS NULL OR member_id = ?1)",
    )?;
    let amounts = stmt
        .query_map(params![member_id], |row| decimal_at(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(amounts.into_iter().sum())
}

pub fn insert_fine(conn: &Connection, fine: &Fine) -> LibraryResult<i64> {
    conn.execute(
        "INSERT INTO fines (member_id, loan_id, amount, reason, issue_date, paid_date, status,
             description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            fine.member_id,
            fine.loan_id,
            decimal_text(fine.amount),
            fine.reason,
            fine.issue_date,
            fine.paid_date,
            fine.status,
            fine.description
        ],
    )
    .map_err(|err| missing_party(err, fine))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_fine(conn: &Connection, fine: &Fine) -> LibraryResult<()> {
    let updated = conn
        .execute(
            "UPDATE fines SET member_id = ?1, loan_id = ?2, amount = ?3, reason = ?4,
                 issue_date = ?5, paid_date = ?6, status = ?7, description = ?8
             WHERE id = ?9",
            params![
                fine.member_id,
                fine.loan_id,
                decimal_text(fine.amount),
                fine.reason,
                fine.issue_date,
                fine.paid_date,
                fine.status,
                fine.description,
                fine.id
            ],
        )
        .map_err(|err| missing_party(err, fine))?;

    if updated == 0 {
        Err(LibraryError::not_found(EntityKind::Fine, fine.id))
    } else {
        Ok(())
    }
}

pub fn delete_fine(conn: &Connection, id: i64) -> LibraryResult<()> {
    let deleted = conn.execute("DELETE FROM fines WHERE id = ?1", params![id])?;

    if deleted == 0 {
        Err(LibraryError::not_found(EntityKind::Fine, id))
    } else {
        Ok(())
    }
}

fn missing_party(err: rusqlite::Error, fine: &Fine) -> LibraryError {
    constraint_error(err, || match fine.loan_id {
        Some(loan_id) => format!(
            "Member #{} or loan #{loan_id} does not exist.",
            fine.member_id
        ),
        None => format!("Member #{} does not exist.", fine.member_id),
    })
}
