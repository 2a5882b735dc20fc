use std::fmt;

use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::error::{LibraryError, LibraryResult};
use crate::models::{Loan, Media, Member};
use crate::store::{LibraryStore, Repository};

use super::Library;

/// Wording of an overdue reminder, from gentle to last call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeTemplate {
    FriendlyReminder,
    UrgentNotice,
    FinalWarning,
}

impl NoticeTemplate {
    pub const ALL: [NoticeTemplate; 3] = [
        NoticeTemplate::FriendlyReminder,
        NoticeTemplate::UrgentNotice,
        NoticeTemplate::FinalWarning,
    ];

    /// Escalate with lateness: a week late is urgent, a month is final.
    pub fn for_days_overdue(days: i64) -> Self {
        match days {
            d if d >= 30 => NoticeTemplate::FinalWarning,
            d if d >= 7 => NoticeTemplate::UrgentNotice,
            _ => NoticeTemplate::FriendlyReminder,
        }
    }

    pub fn next(self) -> Self {
        match self {
            NoticeTemplate::FriendlyReminder => NoticeTemplate::UrgentNotice,
            NoticeTemplate::UrgentNotice => NoticeTemplate::FinalWarning,
            NoticeTemplate::FinalWarning => NoticeTemplate::FriendlyReminder,
        }
    }
}

impl fmt::Display for NoticeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NoticeTemplate::FriendlyReminder => "Friendly Reminder",
            NoticeTemplate::UrgentNotice => "Urgent Notice",
            NoticeTemplate::FinalWarning => "Final Warning",
        };
        f.write_str(label)
    }
}

/// A ready-to-send message about one overdue loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverdueNotice {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OverdueNotice {
    /// `mailto:` link that opens the user's mail client with the notice
    /// filled in. Spaces are sent as `%20`; mail clients do not decode `+`.
    pub fn mailto_url(&self) -> LibraryResult<Url> {
        let mut url = Url::parse(&format!("mailto:{}", self.to.trim())).map_err(|err| {
            LibraryError::validation(format!("Cannot address '{}': {err}", self.to))
        })?;
        let query = format!(
            "subject={}&body={}",
            encode(&self.subject),
            encode(&self.body)
        );
        url.set_query(Some(&query));
        Ok(url)
    }
}

fn encode(text: &str) -> String {
    byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl<S: LibraryStore> Library<S> {
    /// Compose a reminder for an overdue loan with today's figures.
    pub fn overdue_notice(
        &self,
        loan_id: i64,
        template: NoticeTemplate,
    ) -> LibraryResult<OverdueNotice> {
        let today = self.today();
        let loan: Loan = self.store.get(loan_id)?;
        if !loan.is_overdue(today) {
            return Err(LibraryError::validation(format!(
                "Loan #{loan_id} is not overdue."
            )));
        }
        let member: Member = self.store.get(loan.member_id)?;
        if member.email.trim().is_empty() {
            return Err(LibraryError::validation(format!(
                "{} has no email address on file.",
                member.full_name()
            )));
        }
        let media: Media = self.store.get(loan.media_id)?;

        let days = loan.days_overdue(today);
        let fine = loan.calculate_fine(today, &self.policy);
        let due = loan.due_date().format("%d/%m/%Y");
        let details = format!(
            "Title: {}\nDue Date: {due}\nDays Overdue: {days}\n",
            media.title
        );
        let name = &member.first_name;

        let (subject, body) = match template {
            NoticeTemplate::FriendlyReminder => (
                format!("Reminder: '{}' is overdue", media.title),
                format!(
                    "Dear {name},\n\n\
                     This is a friendly reminder that the following item is overdue:\n\n\
                     {details}\n\
                     Please return this item at your earliest convenience. \
                     A fine of €{fine:.2} has been applied to your account.\n\n\
                     If you have already returned this item, please disregard this message. \
                     If you need to renew the loan, please contact us.\n\n\
                     Best regards,\nLibrary Staff"
                ),
            ),
            NoticeTemplate::UrgentNotice => (
                format!("URGENT: Overdue item '{}'", media.title),
                format!(
                    "Dear {name},\n\n\
                     Our records show an overdue item that requires immediate attention:\n\n\
                     {details}Current Fine: €{fine:.2}\n\n\
                     Please return this item immediately to avoid additional penalties. \
                     Overdue items may lead to suspension of your borrowing privileges.\n\n\
                     Library Administration"
                ),
            ),
            NoticeTemplate::FinalWarning => (
                format!("FINAL WARNING: '{}' must be returned", media.title),
                format!(
                    "Dear {name},\n\n\
                     This is your final warning regarding the following item:\n\n\
                     {details}Current Fine: €{fine:.2}\n\n\
                     Please return the item within 48 hours and settle the outstanding fine. \
                     Otherwise your library account will be suspended.\n\n\
                     Library Administration"
                ),
            ),
        };

        Ok(OverdueNotice {
            to: member.email,
            subject,
            body,
        })
    }
}
