//! End-to-end circulation against a real SQLite database.

use std::rc::Rc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use library_desk::models::{Author, Category, FineStatus, Loan, Media, MediaType, Member};
use library_desk::services::{FineScope, LoanScope};
use library_desk::store::Repository;
use library_desk::{FixedClock, Library, LibraryError, SqliteStore};

fn opening_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
}

struct Branch {
    library: Library<SqliteStore>,
    clock: Rc<FixedClock>,
    member_id: i64,
    media_id: i64,
}

fn branch(store: SqliteStore) -> Branch {
    let clock = Rc::new(FixedClock::new(opening_day()));
    let mut library = Library::new(store, Rc::clone(&clock), Default::default());

    let mut fiction = Category::new("Fiction", 14);
    library.add_category(&mut fiction).unwrap();

    let mut book = Media::new("The Great Gatsby", MediaType::Book, 2);
    book.isbn = "978-0743273565".to_string();
    book.category = Some(fiction);
    let media_id = library.add_media(&mut book).unwrap();

    let mut member = Member::new("John", "Doe", "john.doe@email.com", opening_day());
    let member_id = library.add_member(&mut member).unwrap();

    Branch {
        library,
        clock,
        member_id,
        media_id,
    }
}

#[test]
fn borrow_and_late_return_settle_the_counters() {
    let mut b = branch(SqliteStore::open_in_memory().unwrap());

    let loan = b.library.create_loan(b.member_id, b.media_id).unwrap();
    assert_eq!(loan.due_date(), NaiveDate::from_ymd_opt(2025, 3, 17).unwrap());

    let media: Media = b.library.store().get(b.media_id).unwrap();
    let member: Member = b.library.store().get(b.member_id).unwrap();
    assert_eq!(media.available_copies(), 1);
    assert_eq!(member.current_loans, 1);

    b.clock.advance_days(14 + 20);
    let receipt = b.library.return_loan(loan.id).unwrap();
    assert_eq!(receipt.days_overdue, 20);
    assert_eq!(receipt.fine_due, Decimal::new(1000, 2));

    let fine = b.library.issue_return_fine(&receipt).unwrap().unwrap();
    assert_eq!(fine.loan_id, Some(loan.id));
    assert_eq!(fine.reason, "Overdue return - 20 days late");

    let media: Media = b.library.store().get(b.media_id).unwrap();
    let member: Member = b.library.store().get(b.member_id).unwrap();
    assert_eq!(media.available_copies(), 2);
    assert_eq!(member.current_loans, 0);
    assert!(b.library.loans(LoanScope::Active).unwrap().is_empty());

    let before = b.library.outstanding_balance(None).unwrap();
    let waived = b.library.waive_fine(fine.id).unwrap();
    assert_eq!(waived.status(), FineStatus::Waived);
    assert_eq!(
        before - b.library.outstanding_balance(None).unwrap(),
        Decimal::new(1000, 2)
    );
}

#[test]
fn overdue_sweep_runs_once_per_loan() {
    let mut b = branch(SqliteStore::open_in_memory().unwrap());
    b.library.create_loan(b.member_id, b.media_id).unwrap();

    b.clock.advance_days(14 + 3);
    let issued = b.library.generate_overdue_fines().unwrap();
    assert_eq!(issued.len(), 1);
    assert_eq!(issued[0].amount(), Decimal::new(150, 2));
    assert!(b.library.generate_overdue_fines().unwrap().is_empty());

    let outstanding = b.library.fines(FineScope::Outstanding).unwrap();
    assert_eq!(outstanding.len(), 1);
    assert_eq!(
        b.library.outstanding_balance(Some(b.member_id)).unwrap(),
        Decimal::new(150, 2)
    );
}

#[test]
fn records_with_history_cannot_be_deleted() {
    let mut b = branch(SqliteStore::open_in_memory().unwrap());
    let loan = b.library.create_loan(b.member_id, b.media_id).unwrap();
    b.library.return_loan(loan.id).unwrap();

    assert!(matches!(
        b.library.delete_member(b.member_id),
        Err(LibraryError::Conflict(_))
    ));
    assert!(matches!(
        b.library.delete_media(b.media_id),
        Err(LibraryError::Conflict(_))
    ));

    let mut guest = Member::new("Jane", "Smith", "jane.smith@email.com", opening_day());
    let guest_id = b.library.add_member(&mut guest).unwrap();
    b.library.delete_member(guest_id).unwrap();
    assert!(matches!(
        b.library.check_eligibility(guest_id),
        Err(LibraryError::NotFound { .. })
    ));
}

#[test]
fn media_cannot_be_saved_without_a_category() {
    let mut b = branch(SqliteStore::open_in_memory().unwrap());
    let mut stray = Media::new("No Category", MediaType::Magazine, 1);
    assert!(matches!(
        b.library.add_media(&mut stray),
        Err(LibraryError::Validation(_))
    ));
    assert_eq!(stray.id, 0);
    assert_eq!(b.library.search_media("").unwrap().len(), 1);
}

#[test]
fn searches_ignore_case_and_match_ids() {
    let mut b = branch(SqliteStore::open_in_memory().unwrap());
    let fiction: Media = b.library.store().get(b.media_id).unwrap();

    let mut fitzgerald = Author::new("F. Scott", "Fitzgerald");
    b.library.add_author(&mut fitzgerald).unwrap();
    let mut tender = Media::new("Tender Is the Night", MediaType::Book, 1);
    tender.author = Some(fitzgerald);
    tender.category = fiction.category;
    let tender_id = b.library.add_media(&mut tender).unwrap();

    let mut jane = Member::new("Jane", "Smith", "jane.smith@email.com", opening_day());
    let jane_id = b.library.add_member(&mut jane).unwrap();

    let titles = |term: &str| -> Vec<String> {
        b.library
            .search_media(term)
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect()
    };
    assert_eq!(titles("GATSBY"), ["The Great Gatsby"]);
    assert_eq!(titles("0743273565"), ["The Great Gatsby"]);
    assert_eq!(titles("fitzGERALD"), ["Tender Is the Night"]);
    assert_eq!(titles("1"), ["The Great Gatsby"]);
    assert_eq!(titles("  "), ["Tender Is the Night", "The Great Gatsby"]);

    let emails = |term: &str| -> Vec<String> {
        b.library
            .search_members(term)
            .unwrap()
            .into_iter()
            .map(|m| m.email)
            .collect()
    };
    assert_eq!(emails("JANE.SMITH@"), ["jane.smith@email.com"]);
    assert_eq!(emails("doe"), ["john.doe@email.com"]);
    assert_eq!(emails(&jane_id.to_string()), ["jane.smith@email.com"]);
    assert_eq!(emails("").len(), 2);

    for _ in 0..11 {
        let loan = b.library.create_loan(jane_id, tender_id).unwrap();
        b.library.return_loan(loan.id).unwrap();
    }
    let loan_ids = |term: &str| -> Vec<i64> {
        Repository::<Loan>::search(b.library.store(), term)
            .unwrap()
            .iter()
            .map(|l| l.id)
            .collect()
    };
    assert_eq!(loan_ids("1"), [1]);
    assert_eq!(loan_ids("10"), [10]);
    assert_eq!(loan_ids(&jane_id.to_string()).len(), 11);
    assert!(loan_ids("12").is_empty());
}

#[test]
fn duplicate_email_is_a_conflict() {
    let mut b = branch(SqliteStore::open_in_memory().unwrap());
    let mut twin = Member::new("Johnny", "Doe", "JOHN.DOE@email.com", opening_day());
    assert!(matches!(
        b.library.add_member(&mut twin),
        Err(LibraryError::Conflict(_))
    ));
}

#[test]
fn data_survives_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("library.sqlite");

    let loan_id = {
        let mut b = branch(SqliteStore::open(&path).unwrap());
        b.library.create_loan(b.member_id, b.media_id).unwrap().id
    };

    let clock = FixedClock::new(opening_day());
    let library = Library::new(SqliteStore::open(&path).unwrap(), clock, Default::default());
    let active = library.loan_summaries(LoanScope::Active).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].loan.id, loan_id);
    assert_eq!(active[0].member_name, "John Doe");
    assert_eq!(active[0].media_title, "The Great Gatsby");
}

#[test]
fn sample_data_seeds_an_empty_file_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.sqlite");
    let mut store = SqliteStore::open(&path).unwrap();

    assert!(store.seed_sample_data(opening_day()).unwrap());
    assert!(!store.seed_sample_data(opening_day()).unwrap());

    let library = Library::new(store, FixedClock::new(opening_day()), Default::default());
    let stats = library.stats().unwrap();
    assert_eq!(stats.total_members, 2);
    assert_eq!(stats.titles, 3);
    assert_eq!(stats.copies_on_loan(), 0);
}
