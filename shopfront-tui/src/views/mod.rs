//! View rendering dispatch.

pub mod cart;
pub mod checkout;
pub mod helpers;
pub mod login;
pub mod notifications;
pub mod orders;
pub mod product_detail;
pub mod products;
pub mod profile;

pub use helpers::{two_column, error_banner};

use crate::nav::View;
use crate::state::App;
use crate::theme::toast_level_color;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);

    match app.active_view {
        View::Products => products::render(f, app, layout[1]),
        View::ProductDetail => product_detail::render(f, app, layout[1]),
        View::Cart => cart::render(f, app, layout[1]),
        View::Checkout => checkout::render(f, app, layout[1]),
        View::Orders => orders::render(f, app, layout[1]),
        View::Notifications => notifications::render(f, app, layout[1]),
        View::Profile => profile::render(f, app, layout[1]),
        View::Login => login::render(f, app, layout[1]),
    }

    render_footer(f, app, layout[2]);

    if let Some(modal) = &app.modal {
        render_modal(f, app, modal);
    }
}

fn render_header(f: &mut Frame<'_>, app: &App, area: ratatui::layout::Rect) {
    let user = app
        .session
        .current_user()
        .map(|u| u.username)
        .unwrap_or_else(|| "guest".to_string());
    let title = format!(
        "Shopfront | {} | Cart({}) Bell({}) | {}",
        app.active_view.title(),
        app.cart_count,
        app.notification_count,
        user
    );
    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        title,
        Style::default().fg(app.theme.primary),
    ));
    f.render_widget(block, area);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: ratatui::layout::Rect) {
    let help = match app.active_view {
        View::Products => "j/k move • Enter open • a add to cart • [ ] page • Tab view • q quit",
        View::ProductDetail => "h/l quantity • a add to cart • n review • Esc back • q quit",
        View::Cart => "j/k move • h/l quantity • d remove • Enter checkout • q quit",
        View::Checkout => "Enter place order • Esc back to cart • q quit",
        View::Orders => "j/k move • Enter details • r refresh • q quit",
        View::Notifications => "j/k move • m mark read • r refresh • q quit",
        View::Profile => "e edit • Enter save • Esc cancel • ctrl-l logout • q quit",
        View::Login => "Tab next field • Enter submit • n toggle register • Esc back",
    };
    let (text, style) = if let Some(toast) = app.toasts.last() {
        (
            toast.message.clone(),
            Style::default().fg(toast_level_color(toast.level, &app.theme)),
        )
    } else {
        (help.to_string(), Style::default().fg(app.theme.text_dim))
    };
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(style);
    f.render_widget(footer, area);
}

fn render_modal(f: &mut Frame<'_>, app: &App, modal: &crate::state::Modal) {
    let area = helpers::centered_rect(f.size(), 60, 40);
    f.render_widget(Clear, area);
    let widget = Paragraph::new(modal.message.clone())
        .block(
            Block::default()
                .title(modal.title.as_str())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border_focus)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(widget, area);
}
