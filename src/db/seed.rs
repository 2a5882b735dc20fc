use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::info;

use crate::error::LibraryResult;
use crate::models::{Author, Category, Media, MediaType, Member};

use super::{authors, categories, media, members};

const CATEGORIES: &[(&str, &str, u32)] = &[
    ("Fiction", "Literary fiction and novels", 14),
    ("Non-Fiction", "Educational and informational books", 14),
    ("Science", "Scientific literature and research", 21),
    ("Children", "Books for children and young adults", 14),
];

const AUTHORS: &[(&str, &str, &str, &str)] = &[
    (
        "Harper",
        "Lee",
        "American novelist known for To Kill a Mockingbird",
        "American",
    ),
    ("George", "Orwell", "English author and journalist", "British"),
    (
        "Jane",
        "Austen",
        "English novelist known for Pride and Prejudice",
        "British",
    ),
];

/// (title, isbn, year, publisher, copies, shelf, author index, description)
const TITLES: &[(&str, &str, i32, &str, u32, &str, usize, &str)] = &[
    (
        "To Kill a Mockingbird",
        "978-0-06-112008-4",
        1960,
        "J.B. Lippincott & Co.",
        3,
        "Fiction A-L",
        0,
        "Classic American literature",
    ),
    (
        "1984",
        "978-0-452-28423-4",
        1949,
        "Secker & Warburg",
        5,
        "Fiction M-Z",
        1,
        "Dystopian social science fiction",
    ),
    (
        "Pride and Prejudice",
        "978-0-14-143951-8",
        1813,
        "T. Egerton",
        2,
        "Fiction A-L",
        2,
        "Romantic fiction",
    ),
];

/// (first, last, email, phone, address, birth date)
const MEMBERS: &[(&str, &str, &str, &str, &str, (i32, u32, u32))] = &[
    (
        "John",
        "Doe",
        "john.doe@email.com",
        "+41 79 123 45 67",
        "Musterstrasse 1, 8000 Zürich",
        (1985, 3, 15),
    ),
    (
        "Jane",
        "Smith",
        "jane.smith@email.com",
        "+41 79 234 56 78",
        "Beispielweg 12, 3000 Bern",
        (1990, 7, 22),
    ),
];

/// Fill an empty database with a small catalog and two members. Returns false
/// without touching anything when the catalog or member list already has rows.
pub fn seed_sample_data(conn: &mut Connection, today: NaiveDate) -> LibraryResult<bool> {
    let populated: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM media) OR EXISTS (SELECT 1 FROM members)",
        [],
        |row| row.get(0),
    )?;
    if populated {
        return Ok(false);
    }

    let tx = conn.transaction()?;

    let mut category_rows = Vec::with_capacity(CATEGORIES.len());
    for (name, description, days) in CATEGORIES {
        let mut category = Category::new(name, *days);
        category.description = description.to_string();
        category.id = categories::insert_category(&tx, &category)?;
        category_rows.push(category);
    }

    let mut author_rows = Vec::with_capacity(AUTHORS.len());
    for (first, last, biography, nationality) in AUTHORS {
        let mut author = Author::new(first, last);
        author.biography = biography.to_string();
        author.nationality = nationality.to_string();
        author.id = authors::insert_author(&tx, &author)?;
        author_rows.push(author);
    }

    let fiction = category_rows.first().cloned();
    for (title, isbn, year, publisher, copies, shelf, author, description) in TITLES {
        let mut item = Media::new(title, MediaType::Book, *copies);
        item.isbn = isbn.to_string();
        item.publish_year = Some(*year);
        item.publisher = publisher.to_string();
        item.location = shelf.to_string();
        item.author = author_rows.get(*author).cloned();
        item.category = fiction.clone();
        item.description = description.to_string();
        media::insert_media(&tx, &item)?;
    }

    for (first, last, email, phone, address, (y, m, d)) in MEMBERS {
        let mut member = Member::new(first, last, email, today);
        member.phone = phone.to_string();
        member.address = address.to_string();
        member.birth_date = NaiveDate::from_ymd_opt(*y, *m, *d);
        members::insert_member(&tx, &member)?;
    }

    tx.commit()?;
    info!(
        categories = CATEGORIES.len(),
        authors = AUTHORS.len(),
        titles = TITLES.len(),
        members = MEMBERS.len(),
        "seeded sample data"
    );
    Ok(true)
}
