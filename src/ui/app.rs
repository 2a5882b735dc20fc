use std::mem;

use anyhow::{anyhow, Result};
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;
use tracing::warn;

use crate::models::{FineStatus, Media};
use crate::services::{
    FineScope, FineSummary, Library, LibraryStats, LoanScope, LoanSummary, MemberSummary,
    NoticeTemplate,
};
use crate::store::LibraryStore;

use super::forms::{
    ConfirmFine, ConfirmReturn, ContactState, FineAction, LoanField, LoanForm,
};
use super::helpers::{centered_rect, surface_error};
use super::screens::{ListScreen, Navigable, Searchable, Tab};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Tab bar plus the one-line dashboard under it.
const HEADER_HEIGHT: u16 = 4;
const PAGE: isize = 5;

enum Mode {
    Normal,
    Searching(SearchState),
    NewLoan(LoanForm),
    ConfirmReturn(ConfirmReturn),
    ConfirmFine(ConfirmFine),
    Contact(ContactState),
}

struct SearchState {
    query: String,
}

struct StatusMessage {
    text: String,
    kind: StatusKind,
}

enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Circulation desk state: the library services plus one list per tab.
pub struct App<S: LibraryStore> {
    library: Library<S>,
    tab: Tab,
    loans: ListScreen<LoanSummary>,
    overdue: ListScreen<LoanSummary>,
    fines: ListScreen<FineSummary>,
    members: ListScreen<MemberSummary>,
    media: ListScreen<Media>,
    stats: LibraryStats,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl<S: LibraryStore> App<S> {
    pub fn new(library: Library<S>) -> Result<Self> {
        let mut app = Self {
            library,
            tab: Tab::Loans,
            loans: ListScreen::default(),
            overdue: ListScreen::default(),
            fines: ListScreen::default(),
            members: ListScreen::default(),
            media: ListScreen::default(),
            stats: LibraryStats::default(),
            mode: Mode::Normal,
            status: None,
        };
        app.reload()?;
        Ok(app)
    }

    /// Returns `true` once the user asked to leave.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Searching(state) => self.handle_search(code, state),
            Mode::NewLoan(form) => self.handle_new_loan(code, form),
            Mode::ConfirmReturn(confirm) => self.handle_confirm_return(code, confirm),
            Mode::ConfirmFine(confirm) => self.handle_confirm_fine(code, confirm),
            Mode::Contact(state) => self.handle_contact(code, state),
        };

        self.mode = mode;
        Ok(exit)
    }

    /// Reload every list from the store and report it in the footer.
    pub(crate) fn refresh(&mut self) -> Result<()> {
        match self.reload() {
            Ok(()) => self.set_status("Refreshed.", StatusKind::Info),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
        Ok(())
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Tab | KeyCode::Right => self.switch_tab(self.tab.offset(1)),
            KeyCode::BackTab | KeyCode::Left => self.switch_tab(self.tab.offset(-1)),
            KeyCode::Char(ch @ '1'..='5') => {
                let idx = ch as usize - '1' as usize;
                self.switch_tab(Tab::ALL[idx]);
            }
            KeyCode::Up => self.current_list().move_selection(-1),
            KeyCode::Down => self.current_list().move_selection(1),
            KeyCode::PageUp => self.current_list().move_selection(-PAGE),
            KeyCode::PageDown => self.current_list().move_selection(PAGE),
            KeyCode::Home => self.current_list().select_first(),
            KeyCode::End => self.current_list().select_last(),
            KeyCode::F(5) => self.refresh()?,
            KeyCode::Char('/') => {
                let query = self.current_list().filter().unwrap_or_default().to_string();
                return Ok(Mode::Searching(SearchState { query }));
            }
            KeyCode::Char('n') => {
                let member = match self.tab {
                    Tab::Members => self.members.current().map(|row| row.member.id),
                    _ => None,
                };
                let media = match self.tab {
                    Tab::Media => self.media.current().map(|row| row.id),
                    _ => None,
                };
                return Ok(Mode::NewLoan(LoanForm::prefilled(member, media)));
            }
            KeyCode::Char('r') => {
                if let Some(row) = self.current_loan().cloned() {
                    self.report(|app| app.renew(&row));
                } else {
                    self.set_status("Select a loan to renew.", StatusKind::Error);
                }
            }
            KeyCode::Char('x') => {
                if let Some(loan) = self.current_loan().cloned() {
                    return Ok(Mode::ConfirmReturn(ConfirmReturn { loan }));
                }
                self.set_status("Select a loan to return.", StatusKind::Error);
            }
            KeyCode::Char('g') => self.report(Self::generate_fines),
            KeyCode::Char('c') => self.report(Self::reconcile),
            KeyCode::Char(key @ ('p' | 'w')) => {
                let action = if key == 'p' {
                    FineAction::Pay
                } else {
                    FineAction::Waive
                };
                return Ok(self.fine_prompt(action));
            }
            KeyCode::Char('m') => return Ok(self.contact_prompt()),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.current_list().set_filter(None);
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Up => self.current_list().move_selection(-1),
            KeyCode::Down => self.current_list().move_selection(1),
            KeyCode::PageUp => self.current_list().move_selection(-PAGE),
            KeyCode::PageDown => self.current_list().move_selection(PAGE),
            KeyCode::Backspace => {
                state.query.pop();
                self.apply_query(&state.query);
            }
            KeyCode::Char(ch) => {
                state.query.push(ch);
                self.apply_query(&state.query);
            }
            _ => {}
        }
        Mode::Searching(state)
    }

    fn handle_new_loan(&mut self, code: KeyCode, mut form: LoanForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("New loan cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_loan(&form) {
                Ok(()) => return Mode::Normal,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::NewLoan(form)
    }

    fn handle_confirm_return(&mut self, code: KeyCode, confirm: ConfirmReturn) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Return cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.report(|app| app.perform_return(&confirm.loan));
                Mode::Normal
            }
            _ => Mode::ConfirmReturn(confirm),
        }
    }

    fn handle_confirm_fine(&mut self, code: KeyCode, confirm: ConfirmFine) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Nothing changed.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.report(|app| app.settle_fine(&confirm));
                Mode::Normal
            }
            _ => Mode::ConfirmFine(confirm),
        }
    }

    fn handle_contact(&mut self, code: KeyCode, mut state: ContactState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Reminder discarded.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab => {
                let template = state.template.next();
                match self.library.overdue_notice(state.loan_id, template) {
                    Ok(notice) => {
                        state.template = template;
                        state.notice = notice;
                    }
                    Err(err) => self.set_status(err.to_string(), StatusKind::Error),
                }
            }
            KeyCode::Enter => {
                match self.send_notice(&state) {
                    Ok(()) => return Mode::Normal,
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
            }
            _ => {}
        }
        Mode::Contact(state)
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT.min(area.height.saturating_sub(footer_height))),
                Constraint::Min(0),
                Constraint::Length(footer_height),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);

        match self.tab {
            Tab::Loans => draw_list(frame, chunks[1], "Active loans", &self.loans, loan_item),
            Tab::Overdue => draw_list(frame, chunks[1], "Overdue loans", &self.overdue, loan_item),
            Tab::Fines => draw_list(frame, chunks[1], "Fines", &self.fines, fine_item),
            Tab::Members => draw_list(frame, chunks[1], "Members", &self.members, member_item),
            Tab::Media => draw_list(frame, chunks[1], "Catalog", &self.media, media_item),
        }

        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Normal => {}
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::NewLoan(form) => self.draw_loan_form(frame, area, form),
            Mode::ConfirmReturn(confirm) => self.draw_confirm_return(frame, area, confirm),
            Mode::ConfirmFine(confirm) => self.draw_confirm_fine(frame, area, confirm),
            Mode::Contact(state) => self.draw_contact(frame, area, state),
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        if area.height == 0 {
            return;
        }
        let titles: Vec<Line> = Tab::ALL
            .iter()
            .enumerate()
            .map(|(idx, tab)| Line::from(format!("{} {}", idx + 1, tab.title())))
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Library Desk • {}",
                self.library.today().format("%d/%m/%Y")
            )))
            .select(self.tab.index())
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        frame.render_widget(tabs, chunks[0]);

        let s = &self.stats;
        let summary = format!(
            " Members {} ({} inactive) • Titles {} • On loan {}/{} • Overdue {} • Outstanding €{:.2} in {} fines",
            s.total_members,
            s.inactive_members(),
            s.titles,
            s.copies_on_loan(),
            s.total_copies,
            s.overdue_loans,
            s.outstanding_amount,
            s.outstanding_fines,
        );
        frame.render_widget(
            Paragraph::new(summary).style(Style::default().fg(Color::Gray)),
            chunks[1],
        );
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let mut keys: Vec<(&str, &str)> = match &self.mode {
            Mode::Searching(_) => vec![("[Enter]", "Keep filter"), ("[Esc]", "Clear")],
            Mode::Contact(_) => vec![
                ("[Tab]", "Next template"),
                ("[Enter]", "Open in mail client"),
                ("[Esc]", "Discard"),
            ],
            Mode::NewLoan(_) | Mode::ConfirmReturn(_) | Mode::ConfirmFine(_) => Vec::new(),
            Mode::Normal => {
                let mut keys = vec![("[1-5]", "Tabs"), ("[/]", "Search"), ("[n]", "New loan")];
                match self.tab {
                    Tab::Loans => keys.extend([("[r]", "Renew"), ("[x]", "Return")]),
                    Tab::Overdue => {
                        keys.extend([("[x]", "Return"), ("[m]", "Remind"), ("[g]", "Issue fines")])
                    }
                    Tab::Fines => keys.extend([("[p]", "Pay"), ("[w]", "Waive")]),
                    Tab::Members => keys.push(("[c]", "Reconcile counts")),
                    Tab::Media => {}
                }
                keys.extend([("[F5]", "Refresh"), ("[q]", "Quit")]);
                keys
            }
        };

        let mut spans = Vec::with_capacity(keys.len() * 2);
        for (key, label) in keys.drain(..) {
            spans.push(Span::styled(key.to_string(), key_style));
            spans.push(Span::raw(format!(" {label}   ")));
        }
        Line::from(spans)
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Search {}", self.tab.title()));
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_loan_form(&self, frame: &mut Frame, area: Rect, form: &LoanForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("New Loan").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line(LoanField::Member),
            form.build_line(LoanField::Media),
            Line::from(""),
        ];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to lend • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let row = match form.active {
            LoanField::Member => 0,
            LoanField::Media => 1,
        };
        frame.set_cursor_position((inner.x + form.cursor_offset() as u16, inner.y + row));
    }

    fn draw_confirm_return(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmReturn) {
        let row = &confirm.loan;
        let mut lines = vec![Line::from(format!(
            "Return '{}' borrowed by {}?",
            row.media_title, row.member_name
        ))];
        if row.days_overdue > 0 {
            lines.push(Line::from(Span::styled(
                format!(
                    "{} days late. A fine of €{:.2} will be issued.",
                    row.days_overdue, row.fine_due
                ),
                Style::default().fg(Color::Yellow),
            )));
        } else {
            lines.push(Line::from("Returned on time, no fine."));
        }
        draw_confirm(frame, area, "Confirm Return", lines);
    }

    fn draw_confirm_fine(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmFine) {
        let lines = vec![
            Line::from(format!(
                "{} fine #{} of {} for {}?",
                confirm.action.verb(),
                confirm.fine.id,
                confirm.fine.formatted_amount(),
                confirm.member_name
            )),
            Line::from(confirm.fine.reason.clone()),
        ];
        draw_confirm(frame, area, "Confirm Fine", lines);
    }

    fn draw_contact(&self, frame: &mut Frame, area: Rect, state: &ContactState) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("Reminder • {}", state.template))
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(format!("To: {}", state.notice.to)),
            Line::from(format!("Subject: {}", state.notice.subject)),
            Line::from(""),
        ];
        lines.extend(state.notice.body.lines().map(|l| Line::from(l.to_string())));

        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Left)
                .wrap(Wrap { trim: false }),
            inner,
        );
    }

    fn set_status<T: Into<String>>(&mut self, text: T, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    /// Run an action and put its message, or its error, in the footer.
    fn report(&mut self, action: impl FnOnce(&mut Self) -> Result<String>) {
        match action(self) {
            Ok(message) => self.set_status(message, StatusKind::Info),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.status = None;
    }

    fn current_list(&mut self) -> &mut dyn Navigable {
        match self.tab {
            Tab::Loans => &mut self.loans,
            Tab::Overdue => &mut self.overdue,
            Tab::Fines => &mut self.fines,
            Tab::Members => &mut self.members,
            Tab::Media => &mut self.media,
        }
    }

    fn apply_query(&mut self, query: &str) {
        let filter = if query.trim().is_empty() {
            None
        } else {
            Some(query.to_string())
        };
        self.current_list().set_filter(filter);
    }

    fn current_loan(&self) -> Option<&LoanSummary> {
        match self.tab {
            Tab::Loans => self.loans.current(),
            Tab::Overdue => self.overdue.current(),
            _ => None,
        }
    }

    fn reload(&mut self) -> Result<()> {
        self.loans
            .set_rows(self.library.loan_summaries(LoanScope::Active)?);
        self.overdue
            .set_rows(self.library.loan_summaries(LoanScope::Overdue)?);
        self.fines.set_rows(self.library.fine_summaries(FineScope::All)?);
        self.members.set_rows(self.library.member_summaries()?);
        self.media.set_rows(self.library.search_media("")?);
        self.stats = self.library.stats()?;
        Ok(())
    }

    fn save_new_loan(&mut self, form: &LoanForm) -> Result<()> {
        let (member_id, media_id) = form.parse_inputs()?;
        let loan = self.library.create_loan(member_id, media_id)?;
        self.reload()?;
        self.set_status(
            format!(
                "Loan #{} created, due {}.",
                loan.id,
                loan.due_date().format("%d/%m/%Y")
            ),
            StatusKind::Info,
        );
        Ok(())
    }

    fn renew(&mut self, row: &LoanSummary) -> Result<String> {
        let loan = self.library.renew_loan(row.loan.id)?;
        self.reload()?;
        Ok(format!(
            "Renewed '{}' until {} ({}/{} renewals used).",
            row.media_title,
            loan.due_date().format("%d/%m/%Y"),
            loan.renewal_count,
            loan.max_renewals
        ))
    }

    fn perform_return(&mut self, row: &LoanSummary) -> Result<String> {
        let receipt = self.library.return_loan(row.loan.id)?;
        let fine = self.library.issue_return_fine(&receipt)?;
        self.reload()?;
        Ok(match fine {
            Some(fine) => format!(
                "Returned '{}' {} days late. Fine #{} of {} issued.",
                row.media_title,
                receipt.days_overdue,
                fine.id,
                fine.formatted_amount()
            ),
            None => format!("Returned '{}'.", row.media_title),
        })
    }

    fn generate_fines(&mut self) -> Result<String> {
        let issued = self.library.generate_overdue_fines()?;
        self.reload()?;
        Ok(match issued.len() {
            0 => "No new overdue fines.".to_string(),
            n => format!("Issued {n} overdue fines."),
        })
    }

    fn reconcile(&mut self) -> Result<String> {
        let drifts = self.library.reconcile_loan_counts()?;
        self.reload()?;
        Ok(match drifts.len() {
            0 => "Loan counts already match.".to_string(),
            n => format!("Corrected loan counts for {n} members."),
        })
    }

    fn fine_prompt(&mut self, action: FineAction) -> Mode {
        if self.tab != Tab::Fines {
            self.set_status("Switch to the Fines tab first.", StatusKind::Error);
            return Mode::Normal;
        }
        match self.fines.current() {
            Some(row) if row.fine.status() == FineStatus::Outstanding => {
                Mode::ConfirmFine(ConfirmFine {
                    fine: row.fine.clone(),
                    member_name: row.member_name.clone(),
                    action,
                })
            }
            Some(row) => {
                let status = row.fine.status().as_str().to_lowercase();
                self.set_status(format!("Fine is already {status}."), StatusKind::Error);
                Mode::Normal
            }
            None => {
                self.set_status("No fine selected.", StatusKind::Error);
                Mode::Normal
            }
        }
    }

    fn settle_fine(&mut self, confirm: &ConfirmFine) -> Result<String> {
        let fine = match confirm.action {
            FineAction::Pay => self.library.pay_fine(confirm.fine.id)?,
            FineAction::Waive => self.library.waive_fine(confirm.fine.id)?,
        };
        self.reload()?;
        Ok(format!(
            "Fine #{} for {} is now {}.",
            fine.id,
            confirm.member_name,
            fine.status().as_str().to_lowercase()
        ))
    }

    fn contact_prompt(&mut self) -> Mode {
        let Some(row) = (self.tab == Tab::Overdue)
            .then(|| self.overdue.current())
            .flatten()
        else {
            self.set_status("Select an overdue loan to send a reminder.", StatusKind::Error);
            return Mode::Normal;
        };

        let loan_id = row.loan.id;
        let template = NoticeTemplate::for_days_overdue(row.days_overdue);
        match self.library.overdue_notice(loan_id, template) {
            Ok(notice) => Mode::Contact(ContactState {
                loan_id,
                template,
                notice,
            }),
            Err(err) => {
                self.set_status(err.to_string(), StatusKind::Error);
                Mode::Normal
            }
        }
    }

    fn send_notice(&mut self, state: &ContactState) -> Result<()> {
        let url = state.notice.mailto_url()?;
        open_link(url.as_str()).map_err(|err| {
            warn!(error = %err, "mail client did not start");
            anyhow!("Could not open the mail client: {err}")
        })?;
        self.set_status(
            format!("{} opened for {}.", state.template, state.notice.to),
            StatusKind::Info,
        );
        Ok(())
    }
}

fn draw_list<T: Searchable>(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    screen: &ListScreen<T>,
    item: fn(&T) -> ListItem<'static>,
) {
    if area.height == 0 {
        return;
    }
    let title = if screen.has_filter() {
        format!(
            "{title} • filter \"{}\" • {}/{}",
            screen.filter.as_deref().unwrap_or_default().trim(),
            screen.visible.len(),
            screen.rows.len()
        )
    } else {
        format!("{title} • {}", screen.rows.len())
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if screen.visible.is_empty() {
        let text = if screen.has_filter() {
            "Nothing matches the current search."
        } else {
            "Nothing to show."
        };
        frame.render_widget(
            Paragraph::new(text).alignment(Alignment::Center).block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = screen.visible_rows().map(item).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(screen.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_confirm(frame: &mut Frame, area: Rect, title: &str, mut lines: Vec<Line<'static>>) {
    let popup_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press Y to confirm or N / Esc to cancel.",
        Style::default().fg(Color::Gray),
    )));
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true }),
        inner,
    );
}

fn loan_item(row: &LoanSummary) -> ListItem<'static> {
    let mut spans = vec![
        Span::styled(format!("#{:<5}", row.loan.id), Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{:<32} {:<22} due {}", row.media_title, row.member_name, row.loan.due_date().format("%d/%m/%Y"))),
    ];
    if row.days_overdue > 0 {
        spans.push(Span::styled(
            format!("  {} days late • €{:.2}", row.days_overdue, row.fine_due),
            Style::default().fg(Color::Red),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn fine_item(row: &FineSummary) -> ListItem<'static> {
    let status = row.fine.status();
    let color = match status {
        FineStatus::Outstanding => Color::Red,
        FineStatus::Paid => Color::Green,
        FineStatus::Waived => Color::DarkGray,
    };
    ListItem::new(Line::from(vec![
        Span::styled(format!("#{:<5}", row.fine.id), Style::default().fg(Color::DarkGray)),
        Span::raw(format!(
            "{:>9} {:<22} {:<34} {}",
            row.fine.formatted_amount(),
            row.member_name,
            row.fine.reason,
            row.fine.issue_date.format("%d/%m/%Y")
        )),
        Span::styled(format!("  {}", status.as_str()), Style::default().fg(color)),
    ]))
}

fn member_item(row: &MemberSummary) -> ListItem<'static> {
    let member = &row.member;
    let mut spans = vec![
        Span::styled(format!("#{:<5}", member.id), Style::default().fg(Color::DarkGray)),
        Span::raw(format!(
            "{:<24} {:<30} loans {}/{}",
            member.full_name(),
            member.email,
            row.active_loans,
            member.max_loans
        )),
    ];
    if !row.outstanding.is_zero() {
        spans.push(Span::styled(
            format!("  owes €{:.2}", row.outstanding),
            Style::default().fg(Color::Red),
        ));
    }
    if !member.is_active() {
        spans.push(Span::styled(
            format!("  {}", member.status.as_str()),
            Style::default().fg(Color::Yellow),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn media_item(media: &Media) -> ListItem<'static> {
    let availability = if media.is_available() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    };
    ListItem::new(Line::from(vec![
        Span::styled(format!("#{:<5}", media.id), Style::default().fg(Color::DarkGray)),
        Span::raw(format!(
            "{:<32} {:<20} {:<12}",
            media.title,
            media.author_name(),
            media.category_name()
        )),
        Span::styled(
            format!(" {}/{} available", media.available_copies(), media.total_copies()),
            availability,
        ),
    ]))
}
