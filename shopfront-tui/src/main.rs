//! Shopfront TUI entry point.

use chrono::Utc;
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use shopfront_client::api;
use shopfront_client::cache::CacheStore;
use shopfront_client::keys as cache_keys;
use shopfront_client::mutation::{MutationCoordinator, MutationOptions, Notice};
use shopfront_client::query::{to_cache_value, QueryCoordinator, RevalidationPolicy};
use shopfront_client::session::{self, FileCredentialStore, Session, SessionEvent};
use shopfront_client::transport::Transport;
use shopfront_core::{
    has_reviewed, AddToCartRequest, Cart, CreateOrderRequest, CreateReviewRequest, Notification,
    Order, OrderDetails, OrderItem, ProductDetails, ProductListParams, ProductPage, UserProfile,
};
use shopfront_tui::config::ShopConfig;
use shopfront_tui::error::TuiError;
use shopfront_tui::events::ShopEvent;
use shopfront_tui::keys::{map_key, Action};
use shopfront_tui::nav::View;
use shopfront_tui::persistence::{self, PersistedState};
use shopfront_tui::state::{App, AuthMode, CartViewState, LoginField, Modal, ProfileField, ReviewField};
use shopfront_tui::toasts::ToastLevel;
use shopfront_tui::views::render_view;
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    run().await?;
    Ok(())
}

async fn run() -> Result<(), TuiError> {
    let config = ShopConfig::load()?;
    let session = Session::new(Box::new(FileCredentialStore::new(&config.credentials_path)))?;
    let _watcher = session::spawn_store_watcher(
        session.clone(),
        Duration::from_millis(config.session_poll_ms),
    );

    let transport = Transport::new(
        &config.api_base_url,
        Duration::from_millis(config.request_timeout_ms),
        session.clone(),
    )?;
    let store = CacheStore::new(Duration::from_millis(config.cache_retention_ms));
    let queries = QueryCoordinator::new(store);
    let (mutations, notice_rx) = MutationCoordinator::new(queries.clone());

    let mut app = App::new(config, transport, session.clone(), queries, mutations);
    app.rebuild_badges();

    if let Ok(Some(persisted)) = persistence::load(&app.config.persistence_path) {
        app.active_view = persisted.active_view;
        app.products_view.page = persisted.products_page.max(1);
    }
    if app.active_view.requires_auth() && !app.session.is_authenticated() {
        app.active_view = View::Products;
    }

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    let (event_tx, mut event_rx) = mpsc::channel::<ShopEvent>(256);
    spawn_input_reader(event_tx.clone());
    spawn_notice_forwarder(notice_rx, event_tx.clone());
    spawn_session_forwarder(session.subscribe(), event_tx.clone());

    refresh_active_view(&mut app).await;

    let tick = Duration::from_millis(app.config.tick_ms);
    let mut ticker = tokio::time::interval(tick);

    loop {
        terminal.draw(|f| render_view(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => {
                app.sync_badges();
                prune_toasts(&mut app);
            }
            Some(event) = event_rx.recv() => {
                if handle_event(&mut app, event).await {
                    break;
                }
            }
        }
    }

    let persisted = PersistedState {
        active_view: app.active_view,
        products_page: app.products_view.page,
    };
    let _ = persistence::save(&app.config.persistence_path, &persisted);

    Ok(())
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, DisableFocusChange);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<ShopEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                let mapped = match evt {
                    CrosstermEvent::Key(key) => Some(ShopEvent::Input(key)),
                    CrosstermEvent::Resize(width, height) => {
                        Some(ShopEvent::Resize { width, height })
                    }
                    CrosstermEvent::FocusGained => Some(ShopEvent::Focus(true)),
                    CrosstermEvent::FocusLost => Some(ShopEvent::Focus(false)),
                    _ => None,
                };
                if let Some(event) = mapped {
                    if sender.blocking_send(event).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn spawn_notice_forwarder(
    mut notices: mpsc::UnboundedReceiver<Notice>,
    sender: mpsc::Sender<ShopEvent>,
) {
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            if sender.send(ShopEvent::Notice(notice)).await.is_err() {
                break;
            }
        }
    });
}

fn spawn_session_forwarder(
    mut events: tokio::sync::broadcast::Receiver<SessionEvent>,
    sender: mpsc::Sender<ShopEvent>,
) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if sender.send(ShopEvent::Session(event)).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn prune_toasts(app: &mut App) {
    let now = Utc::now();
    app.toasts
        .retain(|toast| (now - toast.created_at).num_seconds() < 5);
}

async fn handle_event(app: &mut App, event: ShopEvent) -> bool {
    match event {
        ShopEvent::Input(key) => {
            if app.modal.is_some() {
                app.modal = None;
                return false;
            }
            if in_form_mode(app) {
                return handle_form_input(app, key).await;
            }
            if let Some(action) = map_key(key) {
                return handle_action(app, action).await;
            }
        }
        ShopEvent::Focus(gained) => {
            if gained {
                app.queries.notify_focus();
            }
        }
        ShopEvent::Session(event) => {
            app.apply_session_event(event);
            if event == SessionEvent::LoggedOut {
                app.toast(ToastLevel::Info, "Session ended. Log in to continue.");
            }
            refresh_active_view(app).await;
        }
        ShopEvent::Notice(notice) => {
            app.toasts.push(notice.into());
        }
        ShopEvent::Resize { .. } => {}
    }
    false
}

/// Views that currently capture raw keystrokes into a text field.
fn in_form_mode(app: &App) -> bool {
    match app.active_view {
        View::Login => !app.session.is_authenticated(),
        View::Profile => app.profile_view.editing,
        View::ProductDetail => app.product_detail_view.review.active,
        _ => false,
    }
}

async fn handle_form_input(app: &mut App, key: KeyEvent) -> bool {
    match app.active_view {
        View::Login => handle_login_input(app, key).await,
        View::Profile => handle_profile_input(app, key).await,
        View::ProductDetail => handle_review_input(app, key).await,
        _ => {}
    }
    false
}

async fn handle_login_input(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('n') => app.login_view.toggle_mode(),
            KeyCode::Char('c') => app.active_view = View::Products,
            _ => {}
        }
        return;
    }
    match key.code {
        KeyCode::Esc => {
            app.login_view.return_to = None;
            app.active_view = View::Products;
        }
        KeyCode::Tab => app.login_view.focus_next(),
        KeyCode::Enter => submit_auth(app).await,
        _ => {
            let state = &mut app.login_view;
            let field = match state.focus {
                LoginField::Username => &mut state.username,
                LoginField::Email => &mut state.email,
                LoginField::Password => &mut state.password,
            };
            field.input(key);
        }
    }
}

async fn handle_profile_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.profile_view.cancel_edit(),
        KeyCode::Tab => {
            app.profile_view.focus = match app.profile_view.focus {
                ProfileField::Name => ProfileField::Phone,
                ProfileField::Phone => ProfileField::Name,
            };
        }
        KeyCode::Enter => save_profile(app).await,
        _ => {
            let state = &mut app.profile_view;
            let field = match state.focus {
                ProfileField::Name => &mut state.name,
                ProfileField::Phone => &mut state.phone,
            };
            field.input(key);
        }
    }
}

async fn handle_review_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.product_detail_view.review.reset(),
        KeyCode::Tab => {
            let form = &mut app.product_detail_view.review;
            form.focus = match form.focus {
                ReviewField::Title => ReviewField::Comment,
                ReviewField::Comment => ReviewField::Title,
            };
        }
        KeyCode::Left => {
            let form = &mut app.product_detail_view.review;
            form.rating = form.rating.saturating_sub(1).max(1);
        }
        KeyCode::Right => {
            let form = &mut app.product_detail_view.review;
            form.rating = (form.rating + 1).min(5);
        }
        KeyCode::Enter => submit_review(app).await,
        _ => {
            let form = &mut app.product_detail_view.review;
            let field = match form.focus {
                ReviewField::Title => &mut form.title,
                ReviewField::Comment => &mut form.comment,
            };
            field.input(key);
        }
    }
}

async fn handle_action(app: &mut App, action: Action) -> bool {
    match action {
        Action::Quit => return true,
        Action::NextView => switch_to(app, app.active_view.next()).await,
        Action::PrevView => switch_to(app, app.active_view.previous()).await,
        Action::SwitchView(index) => {
            if let Some(view) = View::from_index(index) {
                switch_to(app, view).await;
            }
        }
        Action::MoveDown => app.select_next(),
        Action::MoveUp => app.select_previous(),
        Action::Refresh => refresh_active_view(app).await,
        Action::Logout => {
            if app.session.is_authenticated() {
                if app.session.logout().is_err() {
                    app.toast(ToastLevel::Error, "Failed to clear stored credentials.");
                }
            }
        }
        Action::OpenHelp => {
            app.modal = Some(Modal {
                title: "Keybindings".to_string(),
                message: "j/k or arrows move, Tab cycles views, digits jump, Enter confirms, \
                          a adds to cart, [ ] page, m marks read, e edits, ctrl-l logs out, \
                          q quits. Any key closes this."
                    .to_string(),
            });
        }
        Action::Cancel => match app.active_view {
            View::ProductDetail => switch_to(app, View::Products).await,
            View::Checkout => switch_to(app, View::Cart).await,
            _ => {}
        },
        Action::NextPage => {
            if app.products_view.page < app.products_view.total_pages().max(1) {
                app.products_view.page += 1;
                refresh_products(app).await;
            }
        }
        Action::PrevPage => {
            if app.products_view.page > 1 {
                app.products_view.page -= 1;
                refresh_products(app).await;
            }
        }
        Action::Confirm => handle_confirm(app).await,
        Action::AddItem => handle_add_item(app).await,
        Action::DeleteItem => {
            if app.active_view == View::Cart {
                remove_cart_item(app).await;
            }
        }
        Action::Increase => handle_quantity(app, 1).await,
        Action::Decrease => handle_quantity(app, -1).await,
        Action::MarkRead => {
            if app.active_view == View::Notifications {
                mark_selected_read(app).await;
            }
        }
        Action::EditItem => {
            if app.active_view == View::Profile && app.profile_view.profile.is_some() {
                app.profile_view.begin_edit();
            }
        }
        Action::NewItem => {
            if app.active_view == View::ProductDetail {
                open_review_form(app);
            }
        }
    }
    false
}

async fn handle_confirm(app: &mut App) {
    match app.active_view {
        View::Products => {
            if let Some(product) = app.products_view.selected_product() {
                let id = product.id.clone();
                app.product_detail_view.open(id);
                app.active_view = View::ProductDetail;
                refresh_product_detail(app).await;
            }
        }
        View::Cart => switch_to(app, View::Checkout).await,
        View::Checkout => {
            if app.checkout_view.placed.is_some() {
                app.checkout_view = Default::default();
                switch_to(app, View::Orders).await;
            } else {
                submit_order(app).await;
            }
        }
        View::Orders => load_order_details(app).await,
        View::Notifications => mark_selected_read(app).await,
        _ => {}
    }
}

async fn handle_add_item(app: &mut App) {
    match app.active_view {
        View::Products => {
            if let Some(product) = app.products_view.selected_product().cloned() {
                add_to_cart(app, &product.id, &product.name, product.price, 1).await;
            }
        }
        View::ProductDetail => {
            let quantity = app.product_detail_view.quantity;
            if let Some(details) = app.product_detail_view.details.clone() {
                let product = details.product;
                add_to_cart(app, &product.id, &product.name, product.price, quantity).await;
            }
        }
        _ => {}
    }
}

async fn handle_quantity(app: &mut App, delta: i64) {
    match app.active_view {
        View::ProductDetail => {
            let state = &mut app.product_detail_view;
            let next = i64::from(state.quantity) + delta;
            state.quantity = next.clamp(1, 99) as u32;
        }
        View::Cart => {
            let Some(item) = app.cart_view.selected_item() else {
                return;
            };
            let next = i64::from(item.quantity) + delta;
            if next < 1 {
                return;
            }
            let item_id = item.id.clone();
            update_cart_quantity(app, item_id, next as u32).await;
        }
        _ => {}
    }
}

async fn switch_to(app: &mut App, view: View) {
    if view.requires_auth() && !app.require_auth(view) {
        return;
    }
    app.active_view = view;
    refresh_active_view(app).await;
}

// ----------------------------------------------------------------------------
// Refresh: every read goes through the query coordinator, so repeated
// switches within the dedupe window render straight from the cache.
// ----------------------------------------------------------------------------

fn page_policy(app: &App) -> RevalidationPolicy {
    RevalidationPolicy::default()
        .with_dedupe_window(Duration::from_millis(app.config.query_dedupe_ms))
}

async fn refresh_active_view(app: &mut App) {
    match app.active_view {
        View::Products => refresh_products(app).await,
        View::ProductDetail => refresh_product_detail(app).await,
        View::Cart => refresh_cart(app).await,
        View::Checkout => refresh_checkout(app).await,
        View::Orders => refresh_orders(app).await,
        View::Notifications => refresh_notifications(app).await,
        View::Profile => refresh_profile(app).await,
        View::Login => {}
    }
}

async fn refresh_products(app: &mut App) {
    let page = app.products_view.page;
    let limit = app.products_view.limit;
    let key = cache_keys::products(page, limit);
    let policy = page_policy(app);
    let transport = app.transport.clone();
    let params = ProductListParams { page, limit };

    app.products_view.loading = true;
    let snap = app
        .queries
        .fetch(
            Some(&key),
            move || async move {
                api::products::get_products(&transport, params)
                    .await
                    .map(to_cache_value)
            },
            &policy,
        )
        .await;
    app.products_view.loading = false;

    // Keep previous items while a page load fails or is in flight.
    if let Some(page_data) = snap.data_as::<ProductPage>() {
        app.products_view.items = page_data.items;
        app.products_view.total = page_data.total;
        let len = app.products_view.items.len();
        if len == 0 {
            app.products_view.selected = None;
        } else if app.products_view.selected.map(|s| s >= len).unwrap_or(true) {
            app.products_view.selected = Some(0);
        }
    }
    app.products_view.error = snap.error_message();
}

async fn refresh_product_detail(app: &mut App) {
    let Some(product_id) = app.product_detail_view.product_id.clone() else {
        return;
    };
    let key = cache_keys::product_details(&product_id);
    let policy = page_policy(app);
    let transport = app.transport.clone();

    app.product_detail_view.loading = true;
    let snap = app
        .queries
        .fetch(
            Some(&key),
            move || async move {
                api::products::get_product_details(&transport, &product_id)
                    .await
                    .map(to_cache_value)
            },
            &policy,
        )
        .await;
    app.product_detail_view.loading = false;

    if let Some(details) = snap.data_as::<ProductDetails>() {
        app.product_detail_view.details = Some(details);
    }
    app.product_detail_view.error = snap.error_message();
}

async fn refresh_cart(app: &mut App) {
    let key = app
        .session
        .is_authenticated()
        .then(|| cache_keys::CART.to_string());
    let Some(key) = key else {
        app.cart_view = CartViewState::new();
        return;
    };
    let policy = page_policy(app);
    let transport = app.transport.clone();

    app.cart_view.loading = true;
    let snap = app
        .queries
        .fetch(
            Some(&key),
            move || async move { api::cart::get_cart(&transport).await.map(to_cache_value) },
            &policy,
        )
        .await;
    app.cart_view.loading = false;

    if let Some(cart) = snap.data_as::<Cart>() {
        let len = cart.items.len();
        app.cart_view.cart = Some(cart);
        if len == 0 {
            app.cart_view.selected = None;
        } else if app.cart_view.selected.map(|s| s >= len).unwrap_or(true) {
            app.cart_view.selected = Some(0);
        }
    }
    app.cart_view.error = snap.error_message();
}

async fn refresh_checkout(app: &mut App) {
    if !app.session.is_authenticated() {
        return;
    }
    let policy = page_policy(app);
    let transport = app.transport.clone();

    app.checkout_view.loading = true;
    let snap = app
        .queries
        .fetch(
            Some(cache_keys::CART),
            move || async move { api::cart::get_cart(&transport).await.map(to_cache_value) },
            &policy,
        )
        .await;
    app.checkout_view.loading = false;
    if let Some(cart) = snap.data_as::<Cart>() {
        app.checkout_view.cart = Some(cart);
    }
    app.checkout_view.error = snap.error_message();
}

async fn refresh_orders(app: &mut App) {
    if !app.session.is_authenticated() {
        return;
    }
    let policy = page_policy(app);
    let transport = app.transport.clone();

    app.orders_view.loading = true;
    let snap = app
        .queries
        .fetch(
            Some(cache_keys::ORDERS),
            move || async move { api::orders::get_orders(&transport).await.map(to_cache_value) },
            &policy,
        )
        .await;
    app.orders_view.loading = false;
    if let Some(orders) = snap.data_as::<Vec<Order>>() {
        let len = orders.len();
        app.orders_view.orders = orders;
        if len == 0 {
            app.orders_view.selected = None;
        } else if app.orders_view.selected.map(|s| s >= len).unwrap_or(true) {
            app.orders_view.selected = Some(0);
        }
    }
    app.orders_view.error = snap.error_message();
}

async fn refresh_notifications(app: &mut App) {
    if !app.session.is_authenticated() {
        return;
    }
    let policy = page_policy(app);
    let transport = app.transport.clone();

    app.notifications_view.loading = true;
    let snap = app
        .queries
        .fetch(
            Some(cache_keys::NOTIFICATIONS),
            move || async move {
                api::notifications::get_notifications(&transport)
                    .await
                    .map(to_cache_value)
            },
            &policy,
        )
        .await;
    app.notifications_view.loading = false;
    if let Some(items) = snap.data_as::<Vec<Notification>>() {
        let len = items.len();
        app.notifications_view.items = items;
        if len == 0 {
            app.notifications_view.selected = None;
        } else if app
            .notifications_view
            .selected
            .map(|s| s >= len)
            .unwrap_or(true)
        {
            app.notifications_view.selected = Some(0);
        }
    }
    app.notifications_view.error = snap.error_message();
}

async fn refresh_profile(app: &mut App) {
    if !app.session.is_authenticated() {
        return;
    }
    let policy = page_policy(app);
    let transport = app.transport.clone();

    app.profile_view.loading = true;
    let snap = app
        .queries
        .fetch(
            Some(cache_keys::USER_PROFILE),
            move || async move { api::users::get_profile(&transport).await.map(to_cache_value) },
            &policy,
        )
        .await;
    app.profile_view.loading = false;
    if let Some(profile) = snap.data_as::<UserProfile>() {
        app.profile_view.profile = Some(profile);
    }
    app.profile_view.error = snap.error_message();
}

async fn load_order_details(app: &mut App) {
    let Some(order) = app.orders_view.selected_order() else {
        return;
    };
    let order_id = order.id.clone();
    let key = cache_keys::order_details(&order_id);
    let policy = page_policy(app);
    let transport = app.transport.clone();

    app.orders_view.details_loading = true;
    let snap = app
        .queries
        .fetch(
            Some(&key),
            move || async move {
                api::orders::get_order_details(&transport, &order_id)
                    .await
                    .map(to_cache_value)
            },
            &policy,
        )
        .await;
    app.orders_view.details_loading = false;
    if let Some(details) = snap.data_as::<OrderDetails>() {
        app.orders_view.details = Some(details);
    }
    if let Some(message) = snap.error_message() {
        app.toast(ToastLevel::Error, message);
    }
}

// ----------------------------------------------------------------------------
// Mutations
// ----------------------------------------------------------------------------

async fn add_to_cart(app: &mut App, product_id: &str, name: &str, price: f64, quantity: u32) {
    if !app.require_auth(app.active_view) {
        return;
    }
    let request = AddToCartRequest {
        product_id: product_id.to_string(),
        product_name: name.to_string(),
        product_price: price,
        quantity,
    };
    let transport = app.transport.clone();
    let mutation = app.mutations.mutation();

    app.product_detail_view.adding = true;
    let result = mutation
        .run(
            async move { api::cart::add_to_cart(&transport, &request).await },
            MutationOptions::default()
                .with_success("Added to cart")
                .with_error("Failed to add to cart")
                .revalidating([cache_keys::CART_COUNT, cache_keys::CART]),
        )
        .await;
    app.product_detail_view.adding = false;

    if result.is_some() && app.active_view == View::Cart {
        refresh_cart(app).await;
    }
}

async fn update_cart_quantity(app: &mut App, item_id: String, quantity: u32) {
    let transport = app.transport.clone();
    let mutation = app.mutations.mutation();
    app.cart_view.busy_item = Some(item_id.clone());
    let id = item_id.clone();
    let result = mutation
        .run(
            async move { api::cart::update_cart_item(&transport, &id, quantity).await },
            MutationOptions::default()
                .with_success("Updated!")
                .with_error("Failed to update quantity")
                .revalidating([cache_keys::CART, cache_keys::CART_COUNT]),
        )
        .await;
    app.cart_view.busy_item = None;
    if result.is_some() {
        refresh_cart(app).await;
    }
}

async fn remove_cart_item(app: &mut App) {
    let Some(item) = app.cart_view.selected_item() else {
        return;
    };
    let item_id = item.id.clone();
    let transport = app.transport.clone();
    let mutation = app.mutations.mutation();
    app.cart_view.busy_item = Some(item_id.clone());
    let id = item_id.clone();
    let result = mutation
        .run(
            async move { api::cart::remove_cart_item(&transport, &id).await },
            MutationOptions::default()
                .with_success("Removed!")
                .with_error("Failed to remove item")
                .revalidating([cache_keys::CART, cache_keys::CART_COUNT]),
        )
        .await;
    app.cart_view.busy_item = None;
    if result.is_some() {
        refresh_cart(app).await;
    }
}

async fn submit_order(app: &mut App) {
    let Some(cart) = app.checkout_view.cart.clone() else {
        return;
    };
    if cart.is_empty() {
        return;
    }
    let request = CreateOrderRequest {
        items: cart
            .items
            .iter()
            .map(|item| OrderItem {
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                price: item.product_price,
            })
            .collect(),
    };
    let transport = app.transport.clone();
    let mutation = app.mutations.mutation();

    app.checkout_view.submitting = true;
    let placed: Option<Order> = mutation
        .run(
            async move { api::orders::create_order(&transport, &request).await },
            MutationOptions::default()
                .with_success("Order created successfully!")
                .with_error("Failed to create order")
                .revalidating([cache_keys::ORDERS]),
        )
        .await;
    app.checkout_view.submitting = false;

    let Some(order) = placed else {
        return;
    };
    app.checkout_view.placed = Some(order);

    // Clear the cart for UI + backend consistency; the badge catches up
    // through the cart-count invalidation.
    let transport = app.transport.clone();
    let clear = app.mutations.mutation();
    let cleared = clear
        .run(
            async move { api::cart::clear_cart(&transport).await },
            MutationOptions::default()
                .silent()
                .revalidating([cache_keys::CART, cache_keys::CART_COUNT]),
        )
        .await;
    if cleared.is_none() {
        let reason = clear
            .last_error()
            .unwrap_or_else(|| "Something went wrong. Please try again.".to_string());
        app.toast(
            ToastLevel::Error,
            format!("Order created, but failed to clear cart: {reason}"),
        );
    }
    app.cart_view = CartViewState::new();
}

fn open_review_form(app: &mut App) {
    if !app.require_auth(View::ProductDetail) {
        return;
    }
    let Some(details) = &app.product_detail_view.details else {
        return;
    };
    let already = app
        .session
        .current_user()
        .map(|user| has_reviewed(&details.reviews, &user.id))
        .unwrap_or(false);
    if already {
        app.toast(ToastLevel::Info, "You have already reviewed this product.");
        return;
    }
    app.product_detail_view.review.reset();
    app.product_detail_view.review.active = true;
}

async fn submit_review(app: &mut App) {
    let Some(product_id) = app.product_detail_view.product_id.clone() else {
        return;
    };
    let Some(user) = app.session.current_user() else {
        return;
    };
    let (title, comment, rating) = {
        let form = &app.product_detail_view.review;
        (form.title_text(), form.comment_text(), form.rating)
    };
    if title.is_empty() {
        app.toast(ToastLevel::Error, "Give the review a title first.");
        return;
    }
    let request = CreateReviewRequest {
        product_id,
        user_id: user.id,
        rating,
        title,
        comment,
    };

    app.product_detail_view.submitting_review = true;
    let result = api::reviews::create_review(&app.transport, &request).await;
    app.product_detail_view.submitting_review = false;

    match result {
        Ok(_) => {
            app.toast(ToastLevel::Success, "Review submitted!");
            app.product_detail_view.review.reset();
            // Re-fetch the aggregation so the new review and has_reviewed
            // state come from the server, not from local guessing.
            if let Some(id) = &app.product_detail_view.product_id {
                app.queries.invalidate(&cache_keys::product_details(id));
            }
            refresh_product_detail(app).await;
        }
        Err(err) if err.is_conflict() => {
            app.toast(ToastLevel::Info, "You have already reviewed this product.");
            app.product_detail_view.review.reset();
            if let Some(id) = &app.product_detail_view.product_id {
                app.queries.invalidate(&cache_keys::product_details(id));
            }
            refresh_product_detail(app).await;
        }
        Err(err) => {
            app.toast(ToastLevel::Error, err.user_message());
        }
    }
}

async fn mark_selected_read(app: &mut App) {
    let Some(notification) = app.notifications_view.selected_notification() else {
        return;
    };
    if notification.read {
        return;
    }
    let id = notification.id.clone();

    // Optimistic: pre-apply read=true locally, reconcile by refetch on
    // both outcomes.
    let optimistic: Vec<Notification> = app
        .notifications_view
        .items
        .iter()
        .cloned()
        .map(|mut n| {
            if n.id == id {
                n.read = true;
            }
            n
        })
        .collect();

    let transport = app.transport.clone();
    let mutation = app.mutations.mutation();
    app.notifications_view.marking = Some(id.clone());
    let target = id.clone();
    let _ = mutation
        .run_optimistic(
            cache_keys::NOTIFICATIONS,
            to_cache_value(&optimistic),
            async move { api::notifications::mark_as_read(&transport, &target).await },
            MutationOptions::default()
                .with_success("Marked as read")
                .with_error("Failed to mark as read")
                .revalidating([cache_keys::NOTIFICATION_COUNT]),
        )
        .await;
    app.notifications_view.marking = None;
    refresh_notifications(app).await;
}

async fn save_profile(app: &mut App) {
    let name = app.profile_view.name_text();
    let phone = app.profile_view.phone_text();
    let transport = app.transport.clone();
    let mutation = app.mutations.mutation();

    app.profile_view.saving = true;
    let result = mutation
        .run(
            async move { api::users::update_profile(&transport, &name, &phone).await },
            MutationOptions::default()
                .with_success("Profile updated!")
                .with_error("Failed to update profile")
                .revalidating([cache_keys::USER_PROFILE]),
        )
        .await;
    app.profile_view.saving = false;

    if result.is_some() {
        app.profile_view.cancel_edit();
        refresh_profile(app).await;
    }
}

async fn submit_auth(app: &mut App) {
    let state = &app.login_view;
    let username = state.username_text();
    let password = state.password_text();
    let email = state.email_text();
    let mode = state.mode;
    if username.is_empty() || password.is_empty() {
        app.toast(ToastLevel::Error, "Username and password are required.");
        return;
    }

    app.login_view.submitting = true;
    let result = match mode {
        AuthMode::Login => api::auth::login(&app.transport, &username, &password).await,
        AuthMode::Register => {
            api::auth::register(&app.transport, &username, &email, &password).await
        }
    };
    app.login_view.submitting = false;

    match result {
        Ok(response) => {
            if let Err(err) = app.session.login(response.token, response.user) {
                app.toast(ToastLevel::Error, format!("Failed to store session: {err}"));
                return;
            }
            let message = match mode {
                AuthMode::Login => "Login successful!",
                AuthMode::Register => "Registration successful!",
            };
            app.toast(ToastLevel::Success, message);
            // The session broadcast rebuilds the badges and redirects via
            // return_to; nothing else to do here.
        }
        Err(err) => {
            app.toast(ToastLevel::Error, err.user_message());
        }
    }
}
