use crate::error::EntityKind;
use crate::models::{Author, Category, Fine, Loan, Media, Member, Staff};

use super::Entity;

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Entity for Author {
    const KIND: EntityKind = EntityKind::Author;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.full_name(), needle) || contains(&self.nationality, needle)
    }
}

impl Entity for Category {
    const KIND: EntityKind = EntityKind::Category;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.name, needle) || contains(&self.description, needle)
    }
}

impl Entity for Media {
    const KIND: EntityKind = EntityKind::Media;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.title, needle)
            || contains(&self.isbn, needle)
            || contains(&self.author_name(), needle)
            || self.id.to_string().contains(needle)
    }
}

impl Entity for Member {
    const KIND: EntityKind = EntityKind::Member;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.full_name(), needle)
            || contains(&self.email, needle)
            || self.id.to_string().contains(needle)
    }
}

impl Entity for Staff {
    const KIND: EntityKind = EntityKind::Staff;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.full_name(), needle)
            || contains(&self.username, needle)
            || contains(&self.email, needle)
    }
}

impl Entity for Loan {
    const KIND: EntityKind = EntityKind::Loan;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn matches(&self, needle: &str) -> bool {
        self.id.to_string() == needle
            || self.member_id.to_string() == needle
            || self.media_id.to_string() == needle
            || contains(&self.notes, needle)
    }
}

impl Entity for Fine {
    const KIND: EntityKind = EntityKind::Fine;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn matches(&self, needle: &str) -> bool {
        self.id.to_string() == needle
            || self.member_id.to_string() == needle
            || self.loan_id.map(|id| id.to_string()).as_deref() == Some(needle)
            || contains(&self.reason, needle)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::MediaType;

    #[test]
    fn media_matches_title_isbn_author_and_id() {
        let mut media = Media::new("Pride and Prejudice", MediaType::Book, 2);
        media.id = 31;
        media.isbn = "978-0-14-143951-8".to_string();
        media.author = Some(Author::new("Jane", "Austen"));

        assert!(media.matches("prejudice"));
        assert!(media.matches("143951"));
        assert!(media.matches("austen"));
        assert!(media.matches("31"));
        assert!(!media.matches("orwell"));
    }

    #[test]
    fn member_matches_name_and_email() {
        let since = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();
        let member = Member::new("John", "Doe", "john.doe@email.com", since);
        assert!(member.matches("john doe"));
        assert!(member.matches("email.com"));
        assert!(!member.matches("smith"));
    }
}
