//! Common view rendering helpers.

use crate::state::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Standard two-column layout; `left_percent` of the width for the list.
pub fn two_column(area: Rect, left_percent: u16) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(left_percent),
            Constraint::Percentage(100 - left_percent),
        ])
        .split(area);
    (chunks[0], chunks[1])
}

/// Split off a one-line banner above the content when there is an error
/// to show alongside stale data.
pub fn with_banner(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Render the stale-data error affordance: previous content stays up,
/// this banner names the failure and the retry key.
pub fn error_banner(f: &mut Frame<'_>, app: &App, area: Rect, message: &str) {
    let banner = Paragraph::new(format!("{message} (r to retry)"))
        .style(Style::default().fg(app.theme.error));
    f.render_widget(banner, area);
}

/// Full-pane message for loading/empty/never-loaded states.
pub fn message_pane(f: &mut Frame<'_>, app: &App, area: Rect, title: &str, message: &str) {
    let widget = Paragraph::new(message.to_string())
        .style(Style::default().fg(app.theme.text_dim))
        .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(widget, area);
}

pub fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
