//! Profile view: read-only card with an edit form for name and phone.

use crate::state::{App, ProfileField};
use crate::views::helpers;
use crate::widgets::DetailPanel;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let state = &app.profile_view;

    if !app.session.is_authenticated() {
        helpers::message_pane(f, app, area, "Profile", "Log in to view your profile. (8)");
        return;
    }

    let (area, _) = match &state.error {
        Some(message) if state.profile.is_some() => {
            let (banner, rest) = helpers::with_banner(area);
            helpers::error_banner(f, app, banner, message);
            (rest, true)
        }
        _ => (area, false),
    };

    let Some(profile) = &state.profile else {
        if state.loading {
            helpers::message_pane(f, app, area, "Profile", "Loading profile...");
        } else if let Some(message) = &state.error {
            helpers::message_pane(f, app, area, "Profile", message);
        }
        return;
    };

    if state.editing {
        render_form(f, app, area);
        return;
    }

    let card = DetailPanel {
        title: "My Profile (e to edit)",
        fields: vec![
            ("User ID", profile.id.clone()),
            ("Username", profile.username.clone()),
            (
                "Email",
                profile.email.clone().unwrap_or_else(|| "N/A".to_string()),
            ),
            (
                "Name",
                profile.name.clone().unwrap_or_else(|| "Not set".to_string()),
            ),
            (
                "Phone",
                profile
                    .phone
                    .clone()
                    .unwrap_or_else(|| "Not set".to_string()),
            ),
        ],
        style: Style::default().fg(app.theme.secondary),
    };
    card.render(f, area);
}

fn render_form(f: &mut Frame<'_>, app: &App, area: Rect) {
    let state = &app.profile_view;
    let block = Block::default()
        .title(if state.saving {
            "Edit profile (saving...)"
        } else {
            "Edit profile (Enter save, Esc cancel, Tab switch field)"
        })
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_focus));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let focused = Style::default().fg(app.theme.border_focus);
    let blurred = Style::default().fg(app.theme.border);

    let mut name = state.name.clone();
    name.set_block(
        Block::default()
            .title("Name")
            .borders(Borders::ALL)
            .border_style(if state.focus == ProfileField::Name {
                focused
            } else {
                blurred
            }),
    );
    f.render_widget(&name, rows[0]);

    let mut phone = state.phone.clone();
    phone.set_block(
        Block::default()
            .title("Phone")
            .borders(Borders::ALL)
            .border_style(if state.focus == ProfileField::Phone {
                focused
            } else {
                blurred
            }),
    );
    f.render_widget(&phone, rows[1]);

    let hint = Paragraph::new("Only name and phone are editable.")
        .style(Style::default().fg(app.theme.text_dim));
    f.render_widget(hint, rows[2]);
}
