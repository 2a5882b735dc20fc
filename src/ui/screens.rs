use crate::models::Media;
use crate::services::{FineSummary, LoanSummary, MemberSummary};
use crate::store::Entity;

/// The desk's top-level views, in tab order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum Tab {
    Loans,
    Overdue,
    Fines,
    Members,
    Media,
}

impl Tab {
    pub(crate) const ALL: [Tab; 5] = [Tab::Loans, Tab::Overdue, Tab::Fines, Tab::Members, Tab::Media];

    pub(crate) fn title(self) -> &'static str {
        match self {
            Tab::Loans => "Loans",
            Tab::Overdue => "Overdue",
            Tab::Fines => "Fines",
            Tab::Members => "Members",
            Tab::Media => "Media",
        }
    }

    pub(crate) fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub(crate) fn offset(self, step: isize) -> Tab {
        let len = Tab::ALL.len() as isize;
        let next = (self.index() as isize + step).rem_euclid(len);
        Tab::ALL[next as usize]
    }
}

/// Row types that the search bar can filter. `needle` is lowercased.
pub(crate) trait Searchable {
    fn matches(&self, needle: &str) -> bool;
}

impl Searchable for LoanSummary {
    fn matches(&self, needle: &str) -> bool {
        self.member_name.to_lowercase().contains(needle)
            || self.media_title.to_lowercase().contains(needle)
            || self.loan.id.to_string() == needle
    }
}

impl Searchable for FineSummary {
    fn matches(&self, needle: &str) -> bool {
        self.member_name.to_lowercase().contains(needle)
            || self.fine.reason.to_lowercase().contains(needle)
            || self.fine.status().as_str().to_lowercase() == needle
    }
}

impl Searchable for MemberSummary {
    fn matches(&self, needle: &str) -> bool {
        Entity::matches(&self.member, needle)
    }
}

impl Searchable for Media {
    fn matches(&self, needle: &str) -> bool {
        Entity::matches(self, needle)
    }
}

/// Cursor and filter handling shared by every tab, whatever its row type.
pub(crate) trait Navigable {
    fn move_selection(&mut self, offset: isize);
    fn select_first(&mut self);
    fn select_last(&mut self);
    fn filter(&self) -> Option<&str>;
    fn set_filter(&mut self, filter: Option<String>);
}

/// One filterable, scrollable list. The full row set is kept so clearing the
/// filter needs no reload.
pub(crate) struct ListScreen<T> {
    pub(crate) rows: Vec<T>,
    pub(crate) visible: Vec<usize>,
    pub(crate) filter: Option<String>,
    pub(crate) selected: usize,
}

impl<T> Default for ListScreen<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            visible: Vec::new(),
            filter: None,
            selected: 0,
        }
    }
}

impl<T: Searchable> ListScreen<T> {
    pub(crate) fn set_rows(&mut self, rows: Vec<T>) {
        self.rows = rows;
        self.apply_filter();
    }

    pub(crate) fn apply_filter(&mut self) {
        let needle = self
            .filter
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .unwrap_or_default();

        self.visible = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| needle.is_empty() || row.matches(&needle))
            .map(|(idx, _)| idx)
            .collect();
        self.ensure_in_bounds();
    }

    pub(crate) fn has_filter(&self) -> bool {
        self.filter
            .as_ref()
            .map(|q| !q.trim().is_empty())
            .unwrap_or(false)
    }

    pub(crate) fn current(&self) -> Option<&T> {
        self.visible
            .get(self.selected)
            .and_then(|idx| self.rows.get(*idx))
    }

    pub(crate) fn visible_rows(&self) -> impl Iterator<Item = &T> {
        self.visible.iter().filter_map(|idx| self.rows.get(*idx))
    }

    fn ensure_in_bounds(&mut self) {
        if self.visible.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.visible.len() {
            self.selected = self.visible.len() - 1;
        }
    }
}

impl<T: Searchable> Navigable for ListScreen<T> {
    fn move_selection(&mut self, offset: isize) {
        if self.visible.is_empty() {
            return;
        }
        let len = self.visible.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    fn select_first(&mut self) {
        self.selected = 0;
    }

    fn select_last(&mut self) {
        self.selected = self.visible.len().saturating_sub(1);
    }

    fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
        self.apply_filter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaType;

    fn catalog() -> ListScreen<Media> {
        let mut screen = ListScreen::default();
        let titles = ["Emma", "Persuasion", "Animal Farm"];
        screen.set_rows(
            titles
                .iter()
                .enumerate()
                .map(|(idx, title)| {
                    let mut media = Media::new(title, MediaType::Book, 1);
                    media.id = idx as i64 + 1;
                    media
                })
                .collect(),
        );
        screen
    }

    #[test]
    fn tabs_wrap_around() {
        assert_eq!(Tab::Loans.offset(-1), Tab::Media);
        assert_eq!(Tab::Media.offset(1), Tab::Loans);
        assert_eq!(Tab::Fines.index(), 2);
    }

    #[test]
    fn filter_narrows_and_clamps_selection() {
        let mut screen = catalog();
        screen.select_last();
        assert_eq!(screen.current().map(|m| m.title.as_str()), Some("Animal Farm"));

        screen.set_filter(Some("EMMA".to_string()));
        assert_eq!(screen.visible.len(), 1);
        assert_eq!(screen.selected, 0);
        assert_eq!(screen.current().map(|m| m.id), Some(1));

        screen.set_filter(None);
        assert_eq!(screen.visible_rows().count(), 3);
    }

    #[test]
    fn selection_stays_in_range() {
        let mut screen = catalog();
        screen.move_selection(10);
        assert_eq!(screen.selected, 2);
        screen.move_selection(-10);
        assert_eq!(screen.selected, 0);
    }
}
