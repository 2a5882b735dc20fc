use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Params, Row};

use crate::error::{EntityKind, LibraryError, LibraryResult};
use crate::models::Loan;

use super::constraint_error;

const SELECT_LOANS: &str = "SELECT id, member_id, media_id, loan_date, due_date, return_date,
        status, renewal_count, max_renewals, notes
    FROM loans";

fn loan_from_row(row: &Row<'_>) -> rusqlite::Result<Loan> {
    Ok(Loan {
        id: row.get(0)?,
        member_id: row.get(1)?,
        media_id: row.get(2)?,
        loan_date: row.get(3)?,
        due_date: row.get(4)?,
        return_date: row.get(5)?,
        status: row.get(6)?,
        renewal_count: row.get(7)?,
        max_renewals: row.get(8)?,
        notes: row.get(9)?,
    })
}

fn query_loans(conn: &Connection, clause: &str, args: impl Params) -> LibraryResult<Vec<Loan>> {
    let mut stmt = conn.prepare(&format!("{SELECT_LOANS} {clause}"))?;
    let loans = stmt
        .query_map(args, loan_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(loans)
}

/// Newest loans first.
pub fn fetch_loans(conn: &Connection) -> LibraryResult<Vec<Loan>> {
    query_loans(conn, "ORDER BY loan_date DESC, id DESC", [])
}

pub fn fetch_loan(conn: &Connection, id: i64) -> LibraryResult<Option<Loan>> {
    let loan = conn
        .query_row(
            &format!("{SELECT_LOANS} WHERE id = ?1"),
            params![id],
            loan_from_row,
        )
        .optional()?;
    Ok(loan)
}

pub fn fetch_active_loans(conn: &Connection) -> LibraryResult<Vec<Loan>> {
    query_loans(
        conn,
        "WHERE status = 'Active' ORDER BY due_date, id",
        [],
    )
}

/// Active loans whose due date lies strictly before `today`. ISO dates
/// compare correctly as text.
pub fn fetch_overdue_loans(conn: &Connection, today: NaiveDate) -> LibraryResult<Vec<Loan>> {
    query_loans(
        conn,
        "WHERE status = 'Active' AND due_date < ?1 ORDER BY due_date, id",
        params![today],
    )
}

pub fn fetch_loans_for_member(conn: &Connection, member_id: i64) -> LibraryResult<Vec<Loan>> {
    query_loans(
        conn,
        "WHERE member_id = ?1 ORDER BY loan_date DESC, id DESC",
        params![member_id],
    )
}

pub fn fetch_loans_for_media(conn: &Connection, media_id: i64) -> LibraryResult<Vec<Loan>> {
    query_loans(
        conn,
        "WHERE media_id = ?1 ORDER BY loan_date DESC, id DESC",
        params![media_id],
    )
}

pub fn insert_loan(conn: &Connection, loan: &Loan) -> LibraryResult<i64> {
    conn.execute(
        "INSERT INTO loans (member_id, media_id, loan_date, due_date, return_date, status,
             renewal_count, max_renewals, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            loan.member_id,
            loan.media_id,
            loan.loan_date,
            loan.due_date,
            loan.return_date,
            loan.status,
            loan.renewal_count,
            loan.max_renewals,
            loan.notes
        ],
    )
    .map_err(|err| missing_party(err, loan))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_loan(conn: &Connection, loan: &Loan) -> LibraryResult<()> {
    let updated = conn
        .execute(
            "UPDATE loans SET member_id = ?1, media_id = ?2, loan_date = ?3, due_date = ?4,
                 return_date = ?5, status = ?6, renewal_count = ?7, max_renewals = ?8,
                 notes = ?9
             WHERE id = ?10",
            params![
                loan.member_id,
                loan.media_id,
                loan.loan_date,
                loan.due_date,
                loan.return_date,
                loan.status,
                loan.renewal_count,
                loan.max_renewals,
                loan.notes,
                loan.id
            ],
        )
        .map_err(|err| missing_party(err, loan))?;

    if updated == 0 {
        Err(LibraryError::not_found(EntityKind::Loan, loan.id))
    } else {
        Ok(())
    }
}

pub fn delete_loan(conn: &Connection, id: i64) -> LibraryResult<()> {
    let deleted = conn
        .execute("DELETE FROM loans WHERE id = ?1", params![id])
        .map_err(|err| constraint_error(err, || format!("Loan #{id} has fines attached.")))?;

    if deleted == 0 {
        Err(LibraryError::not_found(EntityKind::Loan, id))
    } else {
        Ok(())
    }
}

fn missing_party(err: rusqlite::Error, loan: &Loan) -> LibraryError {
    constraint_error(err, || {
        format!(
            "Member #{} or media #{} does not exist.",
            loan.member_id, loan.media_id
        )
    })
}
