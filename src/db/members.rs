use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{EntityKind, LibraryError, LibraryResult};
use crate::models::Member;

use super::constraint_error;

const SELECT_MEMBERS: &str = "SELECT id, first_name, last_name, email, phone, address, birth_date,
        status, max_loans, current_loans, member_since
    FROM members";

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        birth_date: row.get(6)?,
        status: row.get(7)?,
        max_loans: row.get(8)?,
        current_loans: row.get(9)?,
        member_since: row.get(10)?,
    })
}

pub fn fetch_members(conn: &Connection) -> LibraryResult<Vec<Member>> {
    let mut stmt = conn.prepare(&format!("{SELECT_MEMBERS} ORDER BY last_name, first_name"))?;
    let members = stmt
        .query_map([], member_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(members)
}

pub fn fetch_member(conn: &Connection, id: i64) -> LibraryResult<Option<Member>> {
    let member = conn
        .query_row(
            &format!("{SELECT_MEMBERS} WHERE id = ?1"),
            params![id],
            member_from_row,
        )
        .optional()?;
    Ok(member)
}

/// Email addresses are unique regardless of case.
pub fn insert_member(conn: &Connection, member: &Member) -> LibraryResult<i64> {
    conn.execute(
        "INSERT INTO members (first_name, last_name, email, phone, address, birth_date,
             status, max_loans, current_loans, member_since)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            member.first_name,
            member.last_name,
            member.email,
            member.phone,
            member.address,
            member.birth_date,
            member.status,
            member.max_loans,
            member.current_loans,
            member.member_since
        ],
    )
    .map_err(|err| duplicate_email(err, &member.email))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_member(conn: &Connection, member: &Member) -> LibraryResult<()> {
    let updated = conn
        .execute(
            "UPDATE members SET first_name = ?1, last_name = ?2, email = ?3, phone = ?4,
                 address = ?5, birth_date = ?6, status = ?7, max_loans = ?8,
                 current_loans = ?9, member_since = ?10
             WHERE id = ?11",
            params![
                member.first_name,
                member.last_name,
                member.email,
                member.phone,
                member.address,
                member.birth_date,
                member.status,
                member.max_loans,
                member.current_loans,
                member.member_since,
                member.id
            ],
        )
        .map_err(|err| duplicate_email(err, &member.email))?;

    if updated == 0 {
        Err(LibraryError::not_found(EntityKind::Member, member.id))
    } else {
        Ok(())
    }
}

/// Members with loans or fines on record cannot be removed.
pub fn delete_member(conn: &Connection, id: i64) -> LibraryResult<()> {
    let deleted = conn
        .execute("DELETE FROM members WHERE id = ?1", params![id])
        .map_err(|err| {
            constraint_error(err, || format!("Member #{id} has loans or fines on record."))
        })?;

    if deleted == 0 {
        Err(LibraryError::not_found(EntityKind::Member, id))
    } else {
        Ok(())
    }
}

/// Active-loan count per member, straight from the loan table. Members with no
/// active loans are included with zero.
pub fn fetch_active_loan_counts(conn: &Connection) -> LibraryResult<Vec<(i64, u32)>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, COUNT(l.id)
         FROM members m
         LEFT JOIN loans l ON l.member_id = m.id AND l.status = 'Active'
         GROUP BY m.id
         ORDER BY m.id",
    )?;
    let counts = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(counts)
}

fn duplicate_email(err: rusqlite::Error, email: &str) -> LibraryError {
    constraint_error(err, || format!("Email {email} is already registered."))
}
