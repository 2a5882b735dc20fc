use anyhow::{anyhow, Context, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::Fine;
use crate::services::{LoanSummary, NoticeTemplate, OverdueNotice};

/// Input state of the "new loan" popup: member and media ids typed by hand.
#[derive(Default, Clone)]
pub(crate) struct LoanForm {
    pub(crate) member_id: String,
    pub(crate) media_id: String,
    pub(crate) active: LoanField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum LoanField {
    #[default]
    Member,
    Media,
}

impl LoanField {
    pub(crate) fn label(self) -> &'static str {
        match self {
            LoanField::Member => "Member ID",
            LoanField::Media => "Media ID",
        }
    }
}

impl LoanForm {
    /// Pre-fill whichever id the selected row already tells us and focus the
    /// other one.
    pub(crate) fn prefilled(member_id: Option<i64>, media_id: Option<i64>) -> Self {
        let mut form = Self::default();
        if let Some(id) = member_id {
            form.member_id = id.to_string();
            form.active = LoanField::Media;
        }
        if let Some(id) = media_id {
            form.media_id = id.to_string();
            if member_id.is_none() {
                form.active = LoanField::Member;
            }
        }
        form
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            LoanField::Member => LoanField::Media,
            LoanField::Media => LoanField::Member,
        };
    }

    /// Only digits are accepted; ids are positive integers.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if !ch.is_ascii_digit() {
            return false;
        }
        self.field_mut().push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.field_mut().pop();
    }

    fn field_mut(&mut self) -> &mut String {
        match self.active {
            LoanField::Member => &mut self.member_id,
            LoanField::Media => &mut self.media_id,
        }
    }

    fn value(&self, field: LoanField) -> &str {
        match field {
            LoanField::Member => &self.member_id,
            LoanField::Media => &self.media_id,
        }
    }

    /// Typed `(member id, media id)` ready for the loan service.
    pub(crate) fn parse_inputs(&self) -> Result<(i64, i64)> {
        let member = parse_id(&self.member_id, "Member ID")?;
        let media = parse_id(&self.media_id, "Media ID")?;
        Ok((member, media))
    }

    pub(crate) fn build_line(&self, field: LoanField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;

        let display = if value.is_empty() {
            "<required>".to_string()
        } else {
            value.to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ])
    }

    /// Cursor column offset inside the popup for the active field.
    pub(crate) fn cursor_offset(&self) -> usize {
        format!("{}: ", self.active.label()).len() + self.value(self.active).chars().count()
    }
}

fn parse_id(raw: &str, field: &str) -> Result<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(anyhow!("{field} is required."));
    }
    let id = raw
        .parse::<i64>()
        .with_context(|| format!("{field} must be a number."))?;
    if id <= 0 {
        return Err(anyhow!("{field} must be positive."));
    }
    Ok(id)
}

/// Pending return, showing the fee that will be charged.
#[derive(Clone)]
pub(crate) struct ConfirmReturn {
    pub(crate) loan: LoanSummary,
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum FineAction {
    Pay,
    Waive,
}

impl FineAction {
    pub(crate) fn verb(self) -> &'static str {
        match self {
            FineAction::Pay => "Mark as paid",
            FineAction::Waive => "Waive",
        }
    }
}

#[derive(Clone)]
pub(crate) struct ConfirmFine {
    pub(crate) fine: Fine,
    pub(crate) member_name: String,
    pub(crate) action: FineAction,
}

/// Reminder being composed for an overdue loan.
#[derive(Clone)]
pub(crate) struct ContactState {
    pub(crate) loan_id: i64,
    pub(crate) template: NoticeTemplate,
    pub(crate) notice: OverdueNotice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefill_focuses_the_missing_id() {
        let form = LoanForm::prefilled(Some(3), None);
        assert_eq!(form.member_id, "3");
        assert!(form.active == LoanField::Media);

        let form = LoanForm::prefilled(None, Some(8));
        assert_eq!(form.media_id, "8");
        assert!(form.active == LoanField::Member);
    }

    #[test]
    fn only_digits_are_typed() {
        let mut form = LoanForm::default();
        assert!(form.push_char('4'));
        assert!(!form.push_char('x'));
        form.toggle_field();
        form.push_char('1');
        form.push_char('2');
        form.backspace();
        assert_eq!(form.parse_inputs().unwrap(), (4, 1));
    }

    #[test]
    fn empty_or_zero_ids_are_rejected() {
        let form = LoanForm::default();
        assert_eq!(
            form.parse_inputs().unwrap_err().to_string(),
            "Member ID is required."
        );

        let form = LoanForm::prefilled(Some(0), Some(2));
        assert!(form.parse_inputs().is_err());
    }
}
