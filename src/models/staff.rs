use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::author::join_name;
use super::{StaffRole, StaffStatus};

/// Administrative record for library employees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staff {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub department: String,
    pub hire_date: NaiveDate,
    pub salary: Decimal,
    pub status: StaffStatus,
    pub username: String,
    pub role: StaffRole,
}

impl Staff {
    pub fn new(first_name: &str, last_name: &str, username: &str, hire_date: NaiveDate) -> Self {
        Self {
            id: 0,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: String::new(),
            phone: String::new(),
            position: String::new(),
            department: String::new(),
            hire_date,
            salary: Decimal::ZERO,
            status: StaffStatus::Active,
            username: username.to_string(),
            role: StaffRole::Librarian,
        }
    }

    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == StaffStatus::Active
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, StaffRole::Administrator | StaffRole::Manager)
    }
}

impl fmt::Display for Staff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.full_name(), self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managers_and_administrators_are_admins() {
        let hired = NaiveDate::from_ymd_opt(2020, 5, 4).unwrap();
        let mut staff = Staff::new("Ada", "Berg", "aberg", hired);
        assert!(!staff.is_admin());
        staff.role = StaffRole::Manager;
        assert!(staff.is_admin());
        staff.role = StaffRole::Administrator;
        assert!(staff.is_admin());
    }
}
