use rust_decimal::Decimal;
use tracing::info;

use crate::error::{LibraryError, LibraryResult};
use crate::models::{Author, Category, Media, Member, MemberStatus, Staff};
use crate::store::{Entity, LibraryQueries, LibraryStore, Repository};

use super::Library;

fn require(value: &str, field: &str) -> LibraryResult<()> {
    if value.trim().is_empty() {
        Err(LibraryError::validation(format!("{field} is required.")))
    } else {
        Ok(())
    }
}

fn check_author(author: &Author) -> LibraryResult<()> {
    require(&author.first_name, "First name")?;
    require(&author.last_name, "Last name")
}

fn check_category(category: &Category) -> LibraryResult<()> {
    require(&category.name, "Category name")?;
    if category.loan_duration_days == 0 {
        return Err(LibraryError::validation(
            "Loan duration must be at least one day.",
        ));
    }
    Ok(())
}

fn check_media(media: &Media) -> LibraryResult<()> {
    require(&media.title, "Title")?;
    if media.category.is_none() {
        return Err(LibraryError::validation("Category must be selected."));
    }
    if media.total_copies() == 0 {
        return Err(LibraryError::validation(
            "An item needs at least one copy.",
        ));
    }
    Ok(())
}

fn check_member(member: &Member) -> LibraryResult<()> {
    require(&member.first_name, "First name")?;
    require(&member.last_name, "Last name")?;
    require(&member.email, "Email")?;
    if !member.email.contains('@') {
        return Err(LibraryError::validation(format!(
            "'{}' is not an email address.",
            member.email
        )));
    }
    if member.max_loans == 0 {
        return Err(LibraryError::validation("Loan limit must be at least one."));
    }
    Ok(())
}

fn check_staff(staff: &Staff) -> LibraryResult<()> {
    require(&staff.first_name, "First name")?;
    require(&staff.last_name, "Last name")?;
    require(&staff.username, "Username")?;
    if staff.salary < Decimal::ZERO {
        return Err(LibraryError::validation("Salary cannot be negative."));
    }
    Ok(())
}

impl<S: LibraryStore> Library<S> {
    pub fn add_author(&mut self, author: &mut Author) -> LibraryResult<i64> {
        check_author(author)?;
        self.insert(author)
    }

    pub fn update_author(&mut self, author: &Author) -> LibraryResult<()> {
        check_author(author)?;
        self.store.update(author)
    }

    /// Refused while any catalog item credits the author.
    pub fn delete_author(&mut self, id: i64) -> LibraryResult<()> {
        let credited = self.store.media_by_author(id)?;
        if !credited.is_empty() {
            return Err(LibraryError::conflict(format!(
                "Author #{id} is credited on {} catalog item(s).",
                credited.len()
            )));
        }
        Repository::<Author>::delete(&mut self.store, id)
    }

    pub fn add_category(&mut self, category: &mut Category) -> LibraryResult<i64> {
        check_category(category)?;
        self.insert(category)
    }

    pub fn update_category(&mut self, category: &Category) -> LibraryResult<()> {
        check_category(category)?;
        self.store.update(category)
    }

    pub fn delete_category(&mut self, id: i64) -> LibraryResult<()> {
        let filed = self.store.media_in_category(id)?;
        if !filed.is_empty() {
            return Err(LibraryError::conflict(format!(
                "Category #{id} still holds {} catalog item(s).",
                filed.len()
            )));
        }
        Repository::<Category>::delete(&mut self.store, id)
    }

    /// Add a title. A referenced author or category must already exist.
    pub fn add_media(&mut self, media: &mut Media) -> LibraryResult<i64> {
        check_media(media)?;
        self.check_media_links(media)?;
        self.insert(media)
    }

    /// Save catalog edits. The pool may not shrink below the copies out on
    /// loan; the shelf count is derived from the loans on record.
    pub fn update_media(&mut self, media: &Media) -> LibraryResult<()> {
        check_media(media)?;
        self.check_media_links(media)?;

        let on_loan = self
            .store
            .loans_for_media(media.id)?
            .iter()
            .filter(|l| l.is_active())
            .count() as u32;
        if media.total_copies() < on_loan {
            return Err(LibraryError::validation(format!(
                "{on_loan} copies of '{}' are on loan; the total cannot drop to {}.",
                media.title,
                media.total_copies()
            )));
        }

        let mut row = media.clone();
        row.set_available_copies(media.total_copies() - on_loan);
        self.store.update(&row)
    }

    /// Refused once the item has loan history.
    pub fn delete_media(&mut self, id: i64) -> LibraryResult<()> {
        if !self.store.loans_for_media(id)?.is_empty() {
            return Err(LibraryError::conflict(format!(
                "Media #{id} has loan history."
            )));
        }
        Repository::<Media>::delete(&mut self.store, id)
    }

    pub fn search_media(&self, term: &str) -> LibraryResult<Vec<Media>> {
        self.store.search(term)
    }

    pub fn add_member(&mut self, member: &mut Member) -> LibraryResult<i64> {
        check_member(member)?;
        self.insert(member)
    }

    /// Save profile edits. The loan count is owned by circulation and keeps
    /// its stored value.
    pub fn update_member(&mut self, member: &Member) -> LibraryResult<()> {
        check_member(member)?;
        let stored: Member = self.store.get(member.id)?;
        let mut row = member.clone();
        row.current_loans = stored.current_loans;
        self.store.update(&row)
    }

    pub fn set_member_status(&mut self, id: i64, status: MemberStatus) -> LibraryResult<Member> {
        let mut member: Member = self.store.get(id)?;
        member.status = status;
        self.store.update(&member)?;
        info!(member = id, %status, "member status changed");
        Ok(member)
    }

    /// Refused while the member has loans or fines on record.
    pub fn delete_member(&mut self, id: i64) -> LibraryResult<()> {
        let has_loans = !self.store.loans_for_member(id)?.is_empty();
        let has_fines = !self.store.fines_for_member(id)?.is_empty();
        if has_loans || has_fines {
            return Err(LibraryError::conflict(format!(
                "Member #{id} has loans or fines on record."
            )));
        }
        Repository::<Member>::delete(&mut self.store, id)
    }

    pub fn search_members(&self, term: &str) -> LibraryResult<Vec<Member>> {
        self.store.search(term)
    }

    pub fn add_staff(&mut self, staff: &mut Staff) -> LibraryResult<i64> {
        check_staff(staff)?;
        self.insert(staff)
    }

    pub fn update_staff(&mut self, staff: &Staff) -> LibraryResult<()> {
        check_staff(staff)?;
        self.store.update(staff)
    }

    pub fn delete_staff(&mut self, id: i64) -> LibraryResult<()> {
        Repository::<Staff>::delete(&mut self.store, id)
    }

    fn check_media_links(&self, media: &Media) -> LibraryResult<()> {
        if let Some(author) = &media.author {
            let _: Author = self.store.get(author.id)?;
        }
        if let Some(category) = &media.category {
            let _: Category = self.store.get(category.id)?;
        }
        Ok(())
    }

    fn insert<T: Entity>(&mut self, entity: &mut T) -> LibraryResult<i64>
    where
        S: Repository<T>,
    {
        let id = self.store.create(entity)?;
        info!(kind = %T::KIND, id, "catalog record added");
        Ok(id)
    }
}
