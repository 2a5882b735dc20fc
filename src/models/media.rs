use std::fmt;

use super::{Author, Category, MediaType};

/// A catalog title with a pool of physical copies.
///
/// The copy counters are private so `0 <= available_copies <= total_copies`
/// holds no matter which layer touches the item. Author and category are kept
/// hydrated because the loan rules and every list view need them.
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub publish_year: Option<i32>,
    pub publisher: String,
    pub media_type: MediaType,
    total_copies: u32,
    available_copies: u32,
    pub location: String,
    pub author: Option<Author>,
    pub category: Option<Category>,
    pub description: String,
    pub language: String,
}

impl Media {
    /// New item with every copy on the shelf.
    pub fn new(title: &str, media_type: MediaType, total_copies: u32) -> Self {
        Self {
            id: 0,
            title: title.to_string(),
            isbn: String::new(),
            publish_year: None,
            publisher: String::new(),
            media_type,
            total_copies,
            available_copies: total_copies,
            location: String::new(),
            author: None,
            category: None,
            description: String::new(),
            language: "English".to_string(),
        }
    }

    pub fn total_copies(&self) -> u32 {
        self.total_copies
    }

    pub fn available_copies(&self) -> u32 {
        self.available_copies
    }

    /// Copies currently out with members.
    pub fn copies_on_loan(&self) -> u32 {
        self.total_copies - self.available_copies
    }

    /// Shrinking the pool below the shelf count pulls the shelf count down.
    pub fn set_total_copies(&mut self, total: u32) {
        self.total_copies = total;
        if self.available_copies > total {
            self.available_copies = total;
        }
    }

    /// Clamped to the total.
    pub fn set_available_copies(&mut self, available: u32) {
        self.available_copies = available.min(self.total_copies);
    }

    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Take one copy off the shelf. Returns false when none was left.
    pub fn borrow_copy(&mut self) -> bool {
        if self.is_available() {
            self.available_copies -= 1;
            true
        } else {
            false
        }
    }

    /// Put one copy back. Returns false when the shelf was already full.
    pub fn return_copy(&mut self) -> bool {
        if self.available_copies < self.total_copies {
            self.available_copies += 1;
            true
        } else {
            false
        }
    }

    /// Days a loan of this item runs: the category's setting when filed under
    /// one. Saved items always are; an unsaved item uses the type default.
    pub fn loan_duration_days(&self) -> u32 {
        match &self.category {
            Some(category) => category.loan_duration_days,
            None => self.media_type.default_loan_days(),
        }
    }

    pub fn author_name(&self) -> String {
        self.author
            .as_ref()
            .map(Author::full_name)
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn category_name(&self) -> String {
        self.category
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "Uncategorized".to_string())
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.title, self.author_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrinking_total_clamps_available() {
        let mut media = Media::new("Atlas", MediaType::Book, 4);
        media.set_total_copies(2);
        assert_eq!(media.available_copies(), 2);
        assert_eq!(media.total_copies(), 2);

        media.set_available_copies(9);
        assert_eq!(media.available_copies(), 2);
    }

    #[test]
    fn copy_counters_stay_in_bounds() {
        let mut media = Media::new("Single", MediaType::Book, 1);
        assert!(!media.return_copy());
        assert!(media.borrow_copy());
        assert!(!media.borrow_copy());
        assert_eq!(media.available_copies(), 0);
        assert_eq!(media.copies_on_loan(), 1);
        assert!(media.return_copy());
        assert_eq!(media.available_copies(), 1);
    }

    #[test]
    fn category_overrides_type_default() {
        let mut dvd = Media::new("Film", MediaType::Dvd, 1);
        assert_eq!(dvd.loan_duration_days(), 7);

        dvd.category = Some(Category::new("Science", 21));
        assert_eq!(dvd.loan_duration_days(), 21);
    }

    #[test]
    fn display_falls_back_to_unknown_author() {
        let mut media = Media::new("1984", MediaType::Book, 1);
        assert_eq!(media.to_string(), "1984 by Unknown");
        assert_eq!(media.category_name(), "Uncategorized");

        media.author = Some(Author::new("George", "Orwell"));
        assert_eq!(media.to_string(), "1984 by George Orwell");
    }
}
