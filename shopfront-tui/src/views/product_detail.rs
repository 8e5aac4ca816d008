//! Product detail view: aggregated product + stock + reviews, quantity
//! selector, review form.

use crate::state::{App, ReviewField};
use crate::theme::stock_color;
use crate::views::helpers::{self, two_column};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};
use shopfront_core::average_rating;

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let state = &app.product_detail_view;

    let (area, _) = match &state.error {
        Some(message) if state.details.is_some() => {
            let (banner, rest) = helpers::with_banner(area);
            helpers::error_banner(f, app, banner, message);
            (rest, true)
        }
        _ => (area, false),
    };

    if state.details.is_none() {
        if state.loading {
            helpers::message_pane(f, app, area, "Product", "Loading product...");
        } else if let Some(message) = &state.error {
            helpers::message_pane(f, app, area, "Product", message);
        } else {
            helpers::message_pane(f, app, area, "Product", "Open a product from the catalog.");
        }
        return;
    }

    let (info_area, reviews_area) = two_column(area, 50);
    render_info(f, app, info_area);
    if state.review.active {
        render_review_form(f, app, reviews_area);
    } else {
        render_reviews(f, app, reviews_area);
    }
}

fn render_info(f: &mut Frame<'_>, app: &App, area: Rect) {
    let state = &app.product_detail_view;
    let Some(details) = &state.details else {
        return;
    };
    let product = &details.product;

    let mut lines = vec![
        Line::from(Span::styled(
            product.name.clone(),
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::styled("Price: ", Style::default().fg(app.theme.secondary)),
            Span::raw(format!("${:.2}", product.price)),
        ]),
    ];

    let stock = details.stock.or(product.stock);
    if let Some(stock) = stock {
        let label = if stock > 0 {
            format!("{stock} in stock")
        } else {
            "out of stock".to_string()
        };
        lines.push(Line::from(vec![
            Span::styled("Stock: ", Style::default().fg(app.theme.secondary)),
            Span::styled(label, Style::default().fg(stock_color(stock, &app.theme))),
        ]));
    }

    if let Some(description) = &product.description {
        lines.push(Line::raw(""));
        lines.push(Line::raw(description.clone()));
    }

    lines.push(Line::raw(""));
    let adding = if state.adding { " (adding...)" } else { "" };
    lines.push(Line::from(vec![
        Span::styled("Quantity: ", Style::default().fg(app.theme.secondary)),
        Span::raw(format!("{}{}", state.quantity, adding)),
    ]));

    let widget = Paragraph::new(lines)
        .block(Block::default().title("Product").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(widget, area);
}

fn render_reviews(f: &mut Frame<'_>, app: &App, area: Rect) {
    let state = &app.product_detail_view;
    let Some(details) = &state.details else {
        return;
    };
    let reviews = &details.reviews;

    let title = match average_rating(reviews) {
        Some(avg) => format!("Reviews ({}, avg {:.1}/5)", reviews.len(), avg),
        None => "Reviews (none yet)".to_string(),
    };

    if reviews.is_empty() {
        helpers::message_pane(f, app, area, &title, "Be the first to review. (n)");
        return;
    }

    let items: Vec<ListItem> = reviews
        .iter()
        .map(|review| {
            let stars = "*".repeat(usize::from(review.rating.min(5)));
            let author = review.username.as_deref().unwrap_or("Guest");
            let mut lines = vec![Line::from(vec![
                Span::styled(
                    format!("{stars:<5} "),
                    Style::default().fg(app.theme.secondary),
                ),
                Span::styled(
                    review.title.clone().unwrap_or_default(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  - {author}"),
                    Style::default().fg(app.theme.text_dim),
                ),
            ])];
            if let Some(comment) = &review.comment {
                lines.push(Line::styled(
                    comment.clone(),
                    Style::default().fg(app.theme.text),
                ));
            }
            lines.push(Line::raw(""));
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(list, area);
}

fn render_review_form(f: &mut Frame<'_>, app: &App, area: Rect) {
    let state = &app.product_detail_view;
    let form = &state.review;

    let block = Block::default()
        .title(if state.submitting_review {
            "New review (submitting...)"
        } else {
            "New review"
        })
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_focus));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .split(inner);

    let rating = Paragraph::new(format!(
        "Rating: {} (h/l to adjust, Enter to submit, Esc to cancel)",
        "*".repeat(usize::from(form.rating))
    ))
    .style(Style::default().fg(app.theme.secondary));
    f.render_widget(rating, rows[0]);

    let focused = Style::default().fg(app.theme.border_focus);
    let blurred = Style::default().fg(app.theme.border);

    let mut title = form.title.clone();
    title.set_block(
        Block::default()
            .title("Title")
            .borders(Borders::ALL)
            .border_style(if form.focus == ReviewField::Title {
                focused
            } else {
                blurred
            }),
    );
    f.render_widget(&title, rows[1]);

    let mut comment = form.comment.clone();
    comment.set_block(
        Block::default()
            .title("Comment")
            .borders(Borders::ALL)
            .border_style(if form.focus == ReviewField::Comment {
                focused
            } else {
                blurred
            }),
    );
    f.render_widget(&comment, rows[2]);
}
