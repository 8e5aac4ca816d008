//! Orders view: order list with an aggregated details panel (shipment
//! included when the shipping service knows about the order).

use crate::state::App;
use crate::theme::{order_status_color, shipment_status_color};
use crate::views::helpers::{self, two_column};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let state = &app.orders_view;

    if !app.session.is_authenticated() {
        helpers::message_pane(f, app, area, "Orders", "Log in to view your orders. (8)");
        return;
    }

    let (area, _) = match &state.error {
        Some(message) if !state.orders.is_empty() => {
            let (banner, rest) = helpers::with_banner(area);
            helpers::error_banner(f, app, banner, message);
            (rest, true)
        }
        _ => (area, false),
    };

    if state.orders.is_empty() {
        if state.loading {
            helpers::message_pane(f, app, area, "Orders", "Loading orders...");
        } else if let Some(message) = &state.error {
            helpers::message_pane(f, app, area, "Orders", message);
        } else {
            helpers::message_pane(f, app, area, "Orders", "No orders yet.");
        }
        return;
    }

    let (list_area, detail_area) = two_column(area, 45);

    let items: Vec<ListItem> = state
        .orders
        .iter()
        .enumerate()
        .map(|(index, order)| {
            let selected = state.selected == Some(index);
            let base = if selected {
                Style::default()
                    .fg(app.theme.primary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme.text)
            };
            let line = Line::from(vec![
                Span::styled(format!("{:<14} ", order.id), base),
                Span::styled(
                    format!("{:<11}", order.status.to_string()),
                    Style::default().fg(order_status_color(order.status, &app.theme)),
                ),
                Span::styled(format!(" ${:>8.2}", order.total), base),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(format!("Orders ({})", state.orders.len()))
            .borders(Borders::ALL),
    );
    f.render_widget(list, list_area);

    render_details(f, app, detail_area);
}

fn render_details(f: &mut Frame<'_>, app: &App, area: Rect) {
    let state = &app.orders_view;

    if state.details_loading {
        helpers::message_pane(f, app, area, "Details", "Loading order details...");
        return;
    }
    let Some(details) = &state.details else {
        helpers::message_pane(f, app, area, "Details", "Select an order and press Enter.");
        return;
    };

    let order = &details.order;
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Order: ", Style::default().fg(app.theme.secondary)),
            Span::raw(order.id.clone()),
        ]),
        Line::from(vec![
            Span::styled("Status: ", Style::default().fg(app.theme.secondary)),
            Span::styled(
                order.status.to_string(),
                Style::default().fg(order_status_color(order.status, &app.theme)),
            ),
        ]),
        Line::from(vec![
            Span::styled("Placed: ", Style::default().fg(app.theme.secondary)),
            Span::raw(order.created_at.to_rfc3339()),
        ]),
        Line::raw(""),
    ];

    for item in &order.items {
        lines.push(Line::raw(format!(
            "  {} x{} @ ${:.2}",
            item.product_name, item.quantity, item.price
        )));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::styled("Total: ", Style::default().fg(app.theme.secondary)),
        Span::raw(format!("${:.2}", order.total)),
    ]));

    match &details.shipment {
        Some(shipment) => {
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                "Shipment",
                Style::default().add_modifier(Modifier::BOLD),
            ));
            if let Some(carrier) = &shipment.carrier {
                lines.push(Line::raw(format!("  Carrier: {carrier}")));
            }
            lines.push(Line::from(vec![
                Span::raw("  Status: "),
                Span::styled(
                    shipment.status.to_string(),
                    Style::default().fg(shipment_status_color(shipment.status, &app.theme)),
                ),
            ]));
            lines.push(Line::raw(format!(
                "  Tracking: {}",
                shipment.tracking_number
            )));
            if let Some(estimated) = &shipment.estimated_delivery {
                lines.push(Line::raw(format!(
                    "  Est: {}",
                    estimated.format("%Y-%m-%d")
                )));
            }
        }
        None if order.status == shopfront_core::OrderStatus::Shipped => {
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                "Shipment info not available yet.",
                Style::default().fg(app.theme.text_dim),
            ));
        }
        None => {}
    }

    let widget = Paragraph::new(lines)
        .block(Block::default().title("Details").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(widget, area);
}
