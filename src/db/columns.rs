//! Column conversions for the domain enums and money amounts. Enums are stored
//! as their labels; amounts as decimal TEXT so cents survive the round trip.

use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::Row;
use rust_decimal::Decimal;

use crate::models::{FineStatus, LoanStatus, MediaType, MemberStatus, StaffRole, StaffStatus};

macro_rules! label_column {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|err| FromSqlError::Other(Box::new(err)))
                }
            }
        )+
    };
}

label_column!(MediaType, MemberStatus, StaffStatus, StaffRole, LoanStatus, FineStatus);

/// Read a decimal TEXT column.
pub(crate) fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(raw.trim())
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

/// Normalized TEXT form of an amount, always with two decimals.
pub(crate) fn decimal_text(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::*;

    #[test]
    fn labels_round_trip_through_sqlite() {
        let conn = Connection::open_in_memory().unwrap();
        let status: FineStatus = conn
            .query_row("SELECT ?1", [FineStatus::Waived], |row| row.get(0))
            .unwrap();
        assert_eq!(status, FineStatus::Waived);
    }

    #[test]
    fn unknown_label_fails_conversion() {
        let conn = Connection::open_in_memory().unwrap();
        let result: rusqlite::Result<LoanStatus> =
            conn.query_row("SELECT 'Lost'", [], |row| row.get(0));
        assert!(result.is_err());
    }

    #[test]
    fn amounts_keep_cents() {
        let conn = Connection::open_in_memory().unwrap();
        let amount = conn
            .query_row("SELECT ?1", [decimal_text(Decimal::new(25, 1))], |row| {
                decimal_at(row, 0)
            })
            .unwrap();
        assert_eq!(amount, Decimal::new(250, 2));
        assert_eq!(decimal_text(Decimal::TEN), "10.00");
    }
}
