//! Product catalog view: paginated table with a detail side panel.

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
    let state = &app.products_view;

    let (area, banner) = match &state.error {
        // Stale data stays on screen; the failure gets a banner.
        Some(message) if !state.items.is_empty() => {
            let (banner, rest) = helpers::with_banner(area);
            helpers::error_banner(f, app, banner, message);
            (rest, true)
        }
        _ => (area, false),
    };

    if state.items.is_empty() {
        if state.loading {
            helpers::message_pane(f, app, area, "Products", "Loading products...");
        } else if let Some(message) = &state.error {
            // Never loaded: the error replaces the page.
            if !banner {
                helpers::message_pane(f, app, area, "Products", message);
            }
        } else {
            helpers::message_pane(f, app, area, "Products", "No products found.");
        }
        return;
    }

    let (list_area, detail_area) = two_column(area, 60);

    let items: Vec<ListItem> = state
        .items
        .iter()
        .enumerate()
        .map(|(index, product)| {
            let line = format!("{:<40} ${:>8.2}", truncate(&product.name, 40), product.price);
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

    let title = format!(
        "Products (page {}/{}, {} total){}",
        state.page,
        state.total_pages().max(1),
        state.total,
        if state.loading { " ..." } else { "" }
    );
    let list = List::new(items).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(list, list_area);

    render_detail(f, app, detail_area);
}

fn render_detail(f: &mut Frame<'_>, app: &App, area: Rect) {
    let mut fields = Vec::new();
    if let Some(product) = app.products_view.selected_product() {
        fields.push(("ID", product.id.clone()));
        fields.push(("Name", product.name.clone()));
        fields.push(("Price", format!("${:.2}", product.price)));
        if let Some(description) = &product.description {
            fields.push(("About", description.clone()));
        }
        if let Some(stock) = product.stock {
            fields.push(("Stock", stock.to_string()));
        }
    }

    let detail = DetailPanel {
        title: "Details",
        fields,
        style: Style::default().fg(app.theme.secondary),
    };
    detail.render(f, area);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
