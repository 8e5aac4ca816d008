//! Login / register view.

use crate::state::{App, AuthMode, LoginField};
use crate::views::helpers;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let state = &app.login_view;

    // Already authenticated: short-circuit with a logout affordance.
    if app.session.is_authenticated() {
        let user = app
            .session
            .current_user()
            .map(|u| u.username)
            .unwrap_or_default();
        helpers::message_pane(
            f,
            app,
            area,
            "Account",
            &format!("Logged in as {user}. ctrl-l to log out, 1 for products."),
        );
        return;
    }

    let form_area = helpers::centered_rect(area, 50, 80);
    let title = match (state.mode, state.submitting) {
        (AuthMode::Login, false) => "Login (n to register)",
        (AuthMode::Login, true) => "Login (please wait...)",
        (AuthMode::Register, false) => "Register (n to login)",
        (AuthMode::Register, true) => "Register (please wait...)",
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_focus));
    let inner = block.inner(form_area);
    f.render_widget(block, form_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let focused = Style::default().fg(app.theme.border_focus);
    let blurred = Style::default().fg(app.theme.border);
    let border_for = |field: LoginField| {
        if state.focus == field {
            focused
        } else {
            blurred
        }
    };

    let mut username = state.username.clone();
    username.set_block(
        Block::default()
            .title("Username")
            .borders(Borders::ALL)
            .border_style(border_for(LoginField::Username)),
    );
    f.render_widget(&username, rows[0]);

    let mut next_row = 1;
    if state.mode == AuthMode::Register {
        let mut email = state.email.clone();
        email.set_block(
            Block::default()
                .title("Email")
                .borders(Borders::ALL)
                .border_style(border_for(LoginField::Email)),
        );
        f.render_widget(&email, rows[next_row]);
        next_row += 1;
    }

    let mut password = state.password.clone();
    password.set_block(
        Block::default()
            .title("Password")
            .borders(Borders::ALL)
            .border_style(border_for(LoginField::Password)),
    );
    f.render_widget(&password, rows[next_row]);

    let hint = Paragraph::new("Tab to switch fields, Enter to submit.")
        .style(Style::default().fg(app.theme.text_dim));
    f.render_widget(hint, rows[next_row + 1]);
}
