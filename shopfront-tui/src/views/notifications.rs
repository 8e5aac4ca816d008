//! Notifications view: unread first, read below, mark-as-read action.

use crate::state::App;
use crate::views::helpers;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};
use shopfront_core::Notification;

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let state = &app.notifications_view;

    if !app.session.is_authenticated() {
        helpers::message_pane(f, app, area, "Notifications", "Log in to view notifications. (8)");
        return;
    }

    let (area, _) = match &state.error {
        Some(message) if !state.items.is_empty() => {
            let (banner, rest) = helpers::with_banner(area);
            helpers::error_banner(f, app, banner, message);
            (rest, true)
        }
        _ => (area, false),
    };

    if state.items.is_empty() {
        if state.loading {
            helpers::message_pane(f, app, area, "Notifications", "Loading notifications...");
        } else if let Some(message) = &state.error {
            helpers::message_pane(f, app, area, "Notifications", message);
        } else {
            helpers::message_pane(f, app, area, "Notifications", "No notifications.");
        }
        return;
    }

    let title = if state.unread_count() > 0 {
        format!("Notifications ({} unread)", state.unread_count())
    } else {
        "Notifications (all caught up)".to_string()
    };

    let items: Vec<ListItem> = state
        .items
        .iter()
        .enumerate()
        .map(|(index, notification)| render_item(app, index, notification))
        .collect();

    let list = List::new(items).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(list, area);
}

fn render_item(app: &App, index: usize, notification: &Notification) -> ListItem<'static> {
    let state = &app.notifications_view;
    let selected = state.selected == Some(index);
    let marking = state.marking.as_deref() == Some(notification.id.as_str());

    let marker = if notification.read { "  " } else { "• " };
    let mut style = if notification.read {
        Style::default().fg(app.theme.text_dim)
    } else {
        Style::default().fg(app.theme.text)
    };
    if selected {
        style = style.fg(app.theme.primary).add_modifier(Modifier::BOLD);
    }

    let when = notification
        .created_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();

    let mut spans = vec![
        Span::styled(marker.to_string(), Style::default().fg(app.theme.secondary)),
        Span::styled(notification.heading().to_string(), style),
    ];
    if marking {
        spans.push(Span::styled(
            "  marking...".to_string(),
            Style::default().fg(app.theme.text_dim),
        ));
    }
    if !when.is_empty() {
        spans.push(Span::styled(
            format!("  {when}"),
            Style::default().fg(app.theme.text_muted),
        ));
    }

    let mut lines = vec![Line::from(spans)];
    if notification.title.is_some() && notification.title.as_deref() != Some(&notification.message) {
        lines.push(Line::styled(
            format!("  {}", notification.message),
            Style::default().fg(app.theme.text_dim),
        ));
    }
    ListItem::new(lines)
}
