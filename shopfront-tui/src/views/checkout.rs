//! Checkout view: order lines, summary, and the created-order receipt.

use crate::state::App;
use crate::views::helpers::{self, two_column};
use crate::widgets::DetailPanel;
use ratatui::{
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let state = &app.checkout_view;

    if !app.session.is_authenticated() {
        helpers::message_pane(f, app, area, "Checkout", "Log in to check out. (8)");
        return;
    }

    // Receipt replaces the form once the order exists.
    if let Some(order) = &state.placed {
        let receipt = DetailPanel {
            title: "Order created",
            fields: vec![
                ("Order ID", order.id.clone()),
                ("Status", order.status.to_string()),
                ("Total", format!("${:.2}", order.total)),
                ("", String::new()),
                ("Next", "press Enter to view orders".to_string()),
            ],
            style: Style::default().fg(app.theme.success),
        };
        receipt.render(f, area);
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
            helpers::message_pane(f, app, area, "Checkout", "Loading...");
        } else if let Some(message) = &state.error {
            helpers::message_pane(f, app, area, "Checkout", message);
        } else {
            helpers::message_pane(f, app, area, "Checkout", "Cart is empty. Add items first. (1)");
        }
        return;
    };

    if cart.is_empty() {
        helpers::message_pane(f, app, area, "Checkout", "Cart is empty. Add items first. (1)");
        return;
    }

    let (list_area, summary_area) = two_column(area, 60);

    let items: Vec<ListItem> = cart
        .items
        .iter()
        .map(|item| {
            let subtotal = item
                .subtotal
                .unwrap_or(item.product_price * f64::from(item.quantity));
            ListItem::new(Line::styled(
                format!(
                    "{:<30} x{:<3} ${:>8.2}",
                    item.product_name, item.quantity, subtotal
                ),
                Style::default().fg(app.theme.text),
            ))
        })
        .collect();

    let list = List::new(items).block(Block::default().title("Order Items").borders(Borders::ALL));
    f.render_widget(list, list_area);

    let action = if state.submitting {
        "creating order..."
    } else {
        "press Enter to place order"
    };
    let summary = DetailPanel {
        title: "Order Summary",
        fields: vec![
            ("Subtotal", format!("${:.2}", cart.subtotal)),
            ("Shipping", format!("${:.2}", cart.shipping)),
            ("Total", format!("${:.2}", cart.total)),
            ("", String::new()),
            ("Place order", action.to_string()),
        ],
        style: Style::default().fg(app.theme.secondary),
    };
    summary.render(f, summary_area);
}
