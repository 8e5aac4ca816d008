//! Cart view: line items plus the server-computed summary.

use crate::state::App;
use crate::views::helpers::{self, two_column};
use crate::widgets::DetailPanel;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let state = &app.cart_view;

    if !app.session.is_authenticated() {
        helpers::message_pane(f, app, area, "Cart", "Log in to view your cart. (8)");
        return;
    }

    let (area, _) = match &state.error {
        Some(message) if state.cart.is_some() => {
            let (banner, rest) = helpers::with_banner(area);
            helpers::error_banner(f, app, banner, message);
            (rest, true)
        }
        _ => (area, false),
    };

    let Some(cart) = &state.cart else {
        if state.loading {
            helpers::message_pane(f, app, area, "Cart", "Loading cart...");
        } else if let Some(message) = &state.error {
            helpers::message_pane(f, app, area, "Cart", message);
        } else {
            helpers::message_pane(f, app, area, "Cart", "Your cart is empty.");
        }
        return;
    };

    if cart.is_empty() {
        helpers::message_pane(f, app, area, "Cart", "Your cart is empty. Browse products. (1)");
        return;
    }

    let (list_area, summary_area) = two_column(area, 60);

    let items: Vec<ListItem> = cart
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let busy = state.busy_item.as_deref() == Some(item.id.as_str());
            let subtotal = item
                .subtotal
                .unwrap_or(item.product_price * f64::from(item.quantity));
            let line = format!(
                "{:<30} x{:<3} ${:>8.2}{}",
                item.product_name,
                item.quantity,
                subtotal,
                if busy { "  ..." } else { "" }
            );
            let style = if state.selected == Some(index) {
                Style::default()
                    .fg(app.theme.primary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme.text)
            };
            ListItem::new(Line::styled(line, style))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(format!("Items ({})", cart.item_count))
            .borders(Borders::ALL),
    );
    f.render_widget(list, list_area);

    let summary = DetailPanel {
        title: "Order Summary",
        fields: vec![
            ("Subtotal", format!("${:.2}", cart.subtotal)),
            ("Shipping", format!("${:.2}", cart.shipping)),
            ("Total", format!("${:.2}", cart.total)),
            ("", String::new()),
            ("Checkout", "press Enter".to_string()),
        ],
        style: Style::default().fg(app.theme.secondary),
    };
    summary.render(f, summary_area);
}
