use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{EntityKind, LibraryError, LibraryResult};
use crate::models::Staff;

use super::columns::{decimal_at, decimal_text};
use super::constraint_error;

const SELECT_STAFF: &str = "SELECT id, first_name, last_name, email, phone, position, department,
        hire_date, salary, status, username, role
    FROM staff";

fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        position: row.get(5)?,
        department: row.get(6)?,
        hire_date: row.get(7)?,
        salary: decimal_at(row, 8)?,
        status: row.get(9)?,
        username: row.get(10)?,
        role: row.get(11)?,
    })
}

pub fn fetch_staff(conn: &Connection) -> LibraryResult<Vec<Staff>> {
    let mut stmt = conn.prepare(&format!("{SELECT_STAFF} ORDER BY last_name, first_name"))?;
    let staff = stmt
        .query_map([], staff_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(staff)
}

pub fn fetch_staff_member(conn: &Connection, id: i64) -> LibraryResult<Option<Staff>> {
    let staff = conn
        .query_row(
            &format!("{SELECT_STAFF} WHERE id = ?1"),
            params![id],
            staff_from_row,
        )
        .optional()?;
    Ok(staff)
}

pub fn insert_staff(conn: &Connection, staff: &Staff) -> LibraryResult<i64> {
    conn.execute(
        "INSERT INTO staff (first_name, last_name, email, phone, position, department,
             hire_date, salary, status, username, role)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            staff.first_name,
            staff.last_name,
            staff.email,
            staff.phone,
            staff.position,
            staff.department,
            staff.hire_date,
            decimal_text(staff.salary),
            staff.status,
            staff.username,
            staff.role
        ],
    )
    .map_err(|err| duplicate_username(err, &staff.username))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_staff(conn: &Connection, staff: &Staff) -> LibraryResult<()> {
    let updated = conn
        .execute(
            "UPDATE staff SET first_name = ?1, last_name = ?2, email = ?3, phone = ?4,
                 position = ?5, department = ?6, hire_date = ?7, salary = ?8, status = ?9,
                 username = ?10, role = ?11
             WHERE id = ?12",
            params![
                staff.first_name,
                staff.last_name,
                staff.email,
                staff.phone,
                staff.position,
                staff.department,
                staff.hire_date,
                decimal_text(staff.salary),
                staff.status,
                staff.username,
                staff.role,
                staff.id
            ],
        )
        .map_err(|err| duplicate_username(err, &staff.username))?;

    if updated == 0 {
        Err(LibraryError::not_found(EntityKind::Staff, staff.id))
    } else {
        Ok(())
    }
}

pub fn delete_staff(conn: &Connection, id: i64) -> LibraryResult<()> {
    let deleted = conn.execute("DELETE FROM staff WHERE id = ?1", params![id])?;

    if deleted == 0 {
        Err(LibraryError::not_found(EntityKind::Staff, id))
    } else {
        Ok(())
    }
}

fn duplicate_username(err: rusqlite::Error, username: &str) -> LibraryError {
    constraint_error(err, || format!("Username {username} is already taken."))
}
