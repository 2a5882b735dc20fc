use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::error::LibraryError;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// The message a desk clerk should see: the outermost context for our own
/// errors, the root cause when a lower layer failed.
pub(crate) fn surface_error(err: &Error) -> String {
    if let Some(library) = err.downcast_ref::<LibraryError>() {
        if library.is_rejection() {
            return library.to_string();
        }
    }
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::error::EntityKind;

    #[test]
    fn rejections_keep_their_own_wording() {
        let err = anyhow::Error::new(LibraryError::not_found(EntityKind::Member, 7));
        assert_eq!(surface_error(&err), LibraryError::not_found(EntityKind::Member, 7).to_string());
    }

    #[test]
    fn wrapped_failures_show_the_root_cause() {
        let err = anyhow!("disk full").context("saving loan");
        assert_eq!(surface_error(&err), "disk full");
    }

    #[test]
    fn popup_sits_in_the_middle() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 40, area);
        assert_eq!((popup.x, popup.width), (20, 60));
        assert_eq!((popup.y, popup.height), (15, 20));
    }
}
