//! Application state and view state definitions.

use crate::config::ShopConfig;
use crate::nav::View;
use crate::theme::MarketTheme;
use crate::toasts::{Toast, ToastLevel};
use shopfront_client::api;
use shopfront_client::keys;
use shopfront_client::mutation::MutationCoordinator;
use shopfront_client::query::{to_cache_value, QueryCoordinator, RevalidationPolicy, Subscription};
use shopfront_client::session::{Session, SessionEvent};
use shopfront_client::transport::Transport;
use shopfront_core::{
    Cart, CountResponse, Notification, Order, OrderDetails, Product, ProductDetails, UserProfile,
};
use std::time::Duration;
use tui_textarea::TextArea;

pub struct App {
    pub config: ShopConfig,
    pub theme: MarketTheme,
    pub transport: Transport,
    pub session: Session,
    pub queries: QueryCoordinator,
    pub mutations: MutationCoordinator,
    pub active_view: View,

    pub products_view: ProductsViewState,
    pub product_detail_view: ProductDetailViewState,
    pub cart_view: CartViewState,
    pub checkout_view: CheckoutViewState,
    pub orders_view: OrdersViewState,
    pub notifications_view: NotificationsViewState,
    pub profile_view: ProfileViewState,
    pub login_view: LoginViewState,

    pub toasts: Vec<Toast>,
    pub modal: Option<Modal>,

    pub cart_count: u32,
    pub notification_count: u32,
    cart_badge: Option<Subscription>,
    notification_badge: Option<Subscription>,
    badge_network_down: bool,
}

impl App {
    pub fn new(
        config: ShopConfig,
        transport: Transport,
        session: Session,
        queries: QueryCoordinator,
        mutations: MutationCoordinator,
    ) -> Self {
        let theme = MarketTheme::market();
        let page_size = config.page_size;
        Self {
            config,
            theme,
            transport,
            session,
            queries,
            mutations,
            active_view: View::Products,
            products_view: ProductsViewState::new(page_size),
            product_detail_view: ProductDetailViewState::new(),
            cart_view: CartViewState::new(),
            checkout_view: CheckoutViewState::new(),
            orders_view: OrdersViewState::new(),
            notifications_view: NotificationsViewState::new(),
            profile_view: ProfileViewState::new(),
            login_view: LoginViewState::new(),
            toasts: Vec::new(),
            modal: None,
            cart_count: 0,
            notification_count: 0,
            cart_badge: None,
            notification_badge: None,
            badge_network_down: false,
        }
    }

    pub fn toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toasts.push(Toast::new(level, message));
    }

    /// Gate a view behind authentication. Remembers where the user was
    /// headed so a successful login returns there.
    pub fn require_auth(&mut self, target: View) -> bool {
        if self.session.is_authenticated() {
            return true;
        }
        self.login_view.return_to = Some(target);
        self.active_view = View::Login;
        self.toast(ToastLevel::Info, "Please log in to continue.");
        false
    }

    /// The session-gated badge subscriptions. Keys are re-evaluated here:
    /// authenticated sessions subscribe with the real keys, everything
    /// else tears the drivers down (the sentinel).
    pub fn rebuild_badges(&mut self) {
        self.cart_badge = None;
        self.notification_badge = None;
        if !self.session.is_authenticated() {
            self.cart_count = 0;
            self.notification_count = 0;
            return;
        }

        let cart_policy = RevalidationPolicy::badge(
            Duration::from_millis(self.config.cart_badge.poll_ms),
            Duration::from_millis(self.config.cart_badge.dedupe_ms),
        );
        let transport = self.transport.clone();
        self.cart_badge = Some(self.queries.subscribe(
            Some(keys::CART_COUNT.to_string()),
            move || {
                let transport = transport.clone();
                async move { api::cart::get_cart_count(&transport).await.map(to_cache_value) }
            },
            cart_policy,
        ));

        let notification_policy = RevalidationPolicy::badge(
            Duration::from_millis(self.config.notification_badge.poll_ms),
            Duration::from_millis(self.config.notification_badge.dedupe_ms),
        );
        let transport = self.transport.clone();
        self.notification_badge = Some(self.queries.subscribe(
            Some(keys::NOTIFICATION_COUNT.to_string()),
            move || {
                let transport = transport.clone();
                async move {
                    api::notifications::get_notification_count(&transport)
                        .await
                        .map(to_cache_value)
                }
            },
            notification_policy,
        ));
    }

    /// Pull the latest badge snapshots into the header counters and detect
    /// connectivity recovery: a badge poll succeeding after a network
    /// failure is our reconnect signal.
    pub fn sync_badges(&mut self) {
        let mut network_down = false;
        let mut any_success = false;

        if let Some(badge) = &mut self.cart_badge {
            badge.poll_changed();
            let snap = badge.snapshot();
            if let Some(count) = snap.data_as::<CountResponse>() {
                self.cart_count = count.count;
            }
            match &snap.error {
                Some(shopfront_core::ApiError::Network) => network_down = true,
                None if snap.data.is_some() => any_success = true,
                _ => {}
            }
        }
        if let Some(badge) = &mut self.notification_badge {
            badge.poll_changed();
            let snap = badge.snapshot();
            if let Some(count) = snap.data_as::<CountResponse>() {
                self.notification_count = count.count;
            }
            match &snap.error {
                Some(shopfront_core::ApiError::Network) => network_down = true,
                None if snap.data.is_some() => any_success = true,
                _ => {}
            }
        }

        if self.badge_network_down && !network_down && any_success {
            self.queries.notify_reconnect();
        }
        self.badge_network_down = network_down;
    }

    pub fn apply_session_event(&mut self, event: SessionEvent) {
        self.rebuild_badges();
        match event {
            SessionEvent::LoggedIn => {
                if let Some(target) = self.login_view.return_to.take() {
                    self.active_view = target;
                }
            }
            SessionEvent::LoggedOut => {
                self.cart_view = CartViewState::new();
                self.checkout_view = CheckoutViewState::new();
                self.orders_view = OrdersViewState::new();
                self.notifications_view = NotificationsViewState::new();
                self.profile_view = ProfileViewState::new();
                if self.active_view.requires_auth() {
                    self.active_view = View::Login;
                }
            }
        }
    }

    pub fn select_next(&mut self) {
        match self.active_view {
            View::Products => select_next_index(
                self.products_view.items.len(),
                &mut self.products_view.selected,
            ),
            View::Cart => {
                let len = self
                    .cart_view
                    .cart
                    .as_ref()
                    .map(|c| c.items.len())
                    .unwrap_or(0);
                select_next_index(len, &mut self.cart_view.selected);
            }
            View::Orders => select_next_index(
                self.orders_view.orders.len(),
                &mut self.orders_view.selected,
            ),
            View::Notifications => select_next_index(
                self.notifications_view.items.len(),
                &mut self.notifications_view.selected,
            ),
            _ => {}
        }
    }

    pub fn select_previous(&mut self) {
        match self.active_view {
            View::Products => select_prev_index(
                self.products_view.items.len(),
                &mut self.products_view.selected,
            ),
            View::Cart => {
                let len = self
                    .cart_view
                    .cart
                    .as_ref()
                    .map(|c| c.items.len())
                    .unwrap_or(0);
                select_prev_index(len, &mut self.cart_view.selected);
            }
            View::Orders => select_prev_index(
                self.orders_view.orders.len(),
                &mut self.orders_view.selected,
            ),
            View::Notifications => select_prev_index(
                self.notifications_view.items.len(),
                &mut self.notifications_view.selected,
            ),
            _ => {}
        }
    }
}

fn select_next_index(len: usize, selected: &mut Option<usize>) {
    if len == 0 {
        *selected = None;
        return;
    }
    *selected = Some(match selected {
        Some(index) => (*index + 1) % len,
        None => 0,
    });
}

fn select_prev_index(len: usize, selected: &mut Option<usize>) {
    if len == 0 {
        *selected = None;
        return;
    }
    *selected = Some(match selected {
        Some(0) | None => len - 1,
        Some(index) => *index - 1,
    });
}

#[derive(Debug, Clone)]
pub struct Modal {
    pub title: String,
    pub message: String,
}

// ============================================================================
// VIEW STATE DEFINITIONS
// ============================================================================

#[derive(Debug, Clone)]
pub struct ProductsViewState {
    pub items: Vec<Product>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub selected: Option<usize>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ProductsViewState {
    pub fn new(limit: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            limit,
            selected: None,
            loading: false,
            error: None,
        }
    }

    pub fn total_pages(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            ((self.total + u64::from(self.limit) - 1) / u64::from(self.limit)) as u32
        }
    }

    pub fn selected_product(&self) -> Option<&Product> {
        self.selected.and_then(|index| self.items.get(index))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewField {
    Title,
    Comment,
}

pub struct ReviewFormState {
    pub active: bool,
    pub rating: u8,
    pub title: TextArea<'static>,
    pub comment: TextArea<'static>,
    pub focus: ReviewField,
}

impl ReviewFormState {
    pub fn new() -> Self {
        Self {
            active: false,
            rating: 5,
            title: TextArea::default(),
            comment: TextArea::default(),
            focus: ReviewField::Title,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn title_text(&self) -> String {
        self.title.lines().join(" ").trim().to_string()
    }

    pub fn comment_text(&self) -> String {
        self.comment.lines().join("\n").trim().to_string()
    }
}

impl Default for ReviewFormState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ProductDetailViewState {
    pub product_id: Option<String>,
    pub details: Option<ProductDetails>,
    pub quantity: u32,
    pub loading: bool,
    pub error: Option<String>,
    pub adding: bool,
    pub review: ReviewFormState,
    pub submitting_review: bool,
}

impl ProductDetailViewState {
    pub fn new() -> Self {
        Self {
            product_id: None,
            details: None,
            quantity: 1,
            loading: false,
            error: None,
            adding: false,
            review: ReviewFormState::new(),
            submitting_review: false,
        }
    }

    pub fn open(&mut self, product_id: String) {
        if self.product_id.as_deref() != Some(product_id.as_str()) {
            self.details = None;
            self.error = None;
        }
        self.product_id = Some(product_id);
        self.quantity = 1;
        self.review.reset();
    }
}

#[derive(Debug, Clone)]
pub struct CartViewState {
    pub cart: Option<Cart>,
    pub selected: Option<usize>,
    pub loading: bool,
    pub error: Option<String>,
    /// Cart item id with an action in flight, for per-row spinners.
    pub busy_item: Option<String>,
}

impl CartViewState {
    pub fn new() -> Self {
        Self {
            cart: None,
            selected: None,
            loading: false,
            error: None,
            busy_item: None,
        }
    }

    pub fn selected_item(&self) -> Option<&shopfront_core::CartItem> {
        let cart = self.cart.as_ref()?;
        self.selected.and_then(|index| cart.items.get(index))
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutViewState {
    pub cart: Option<Cart>,
    pub loading: bool,
    pub error: Option<String>,
    pub submitting: bool,
    pub placed: Option<Order>,
}

impl CheckoutViewState {
    pub fn new() -> Self {
        Self {
            cart: None,
            loading: false,
            error: None,
            submitting: false,
            placed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrdersViewState {
    pub orders: Vec<Order>,
    pub selected: Option<usize>,
    pub loading: bool,
    pub error: Option<String>,
    pub details: Option<OrderDetails>,
    pub details_loading: bool,
}

impl OrdersViewState {
    pub fn new() -> Self {
        Self {
            orders: Vec::new(),
            selected: None,
            loading: false,
            error: None,
            details: None,
            details_loading: false,
        }
    }

    pub fn selected_order(&self) -> Option<&Order> {
        self.selected.and_then(|index| self.orders.get(index))
    }
}

#[derive(Debug, Clone)]
pub struct NotificationsViewState {
    pub items: Vec<Notification>,
    pub selected: Option<usize>,
    pub loading: bool,
    pub error: Option<String>,
    /// Notification id currently being marked as read.
    pub marking: Option<String>,
}

impl NotificationsViewState {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            loading: false,
            error: None,
            marking: None,
        }
    }

    pub fn unread(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter().filter(|n| !n.read)
    }

    pub fn read(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter().filter(|n| n.read)
    }

    pub fn unread_count(&self) -> usize {
        self.unread().count()
    }

    pub fn selected_notification(&self) -> Option<&Notification> {
        self.selected.and_then(|index| self.items.get(index))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Phone,
}

pub struct ProfileViewState {
    pub profile: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
    pub editing: bool,
    pub name: TextArea<'static>,
    pub phone: TextArea<'static>,
    pub focus: ProfileField,
    pub saving: bool,
}

impl ProfileViewState {
    pub fn new() -> Self {
        Self {
            profile: None,
            loading: false,
            error: None,
            editing: false,
            name: TextArea::default(),
            phone: TextArea::default(),
            focus: ProfileField::Name,
            saving: false,
        }
    }

    /// Enter edit mode with the form seeded from the loaded profile.
    pub fn begin_edit(&mut self) {
        let (name, phone) = match &self.profile {
            Some(profile) => (
                profile.name.clone().unwrap_or_default(),
                profile.phone.clone().unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };
        self.name = TextArea::new(vec![name]);
        self.phone = TextArea::new(vec![phone]);
        self.focus = ProfileField::Name;
        self.editing = true;
    }

    pub fn cancel_edit(&mut self) {
        self.editing = false;
    }

    pub fn name_text(&self) -> String {
        self.name.lines().join(" ").trim().to_string()
    }

    pub fn phone_text(&self) -> String {
        self.phone.lines().join(" ").trim().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Email,
    Password,
}

pub struct LoginViewState {
    pub mode: AuthMode,
    pub username: TextArea<'static>,
    pub email: TextArea<'static>,
    pub password: TextArea<'static>,
    pub focus: LoginField,
    pub submitting: bool,
    /// Where to land after a successful login.
    pub return_to: Option<View>,
}

impl LoginViewState {
    pub fn new() -> Self {
        // Seeded demo credentials, matching the backend seed data.
        let username = TextArea::new(vec!["alice".to_string()]);
        let email = TextArea::new(vec!["alice@example.com".to_string()]);
        let mut password = TextArea::new(vec!["password123".to_string()]);
        password.set_mask_char('*');
        Self {
            mode: AuthMode::Login,
            username,
            email,
            password,
            focus: LoginField::Username,
            submitting: false,
            return_to: None,
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.focus = LoginField::Username;
    }

    /// Cycle focus across the fields visible in the current mode.
    pub fn focus_next(&mut self) {
        self.focus = match (self.mode, self.focus) {
            (AuthMode::Login, LoginField::Username) => LoginField::Password,
            (AuthMode::Login, _) => LoginField::Username,
            (AuthMode::Register, LoginField::Username) => LoginField::Email,
            (AuthMode::Register, LoginField::Email) => LoginField::Password,
            (AuthMode::Register, LoginField::Password) => LoginField::Username,
        };
    }

    pub fn username_text(&self) -> String {
        self.username.lines().join("").trim().to_string()
    }

    pub fn email_text(&self) -> String {
        self.email.lines().join("").trim().to_string()
    }

    pub fn password_text(&self) -> String {
        self.password.lines().join("").to_string()
    }
}

impl Default for ProductDetailViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for CartViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for CheckoutViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for OrdersViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for NotificationsViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ProfileViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for LoginViewState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_test_utils::{sample_cart, sample_cart_item, sample_notification, sample_product};

    #[test]
    fn test_products_view_state_new_is_empty() {
        let state = ProductsViewState::new(30);
        assert!(state.items.is_empty());
        assert_eq!(state.page, 1);
        assert_eq!(state.limit, 30);
        assert!(state.selected.is_none());
        assert!(!state.loading);
    }

    #[test]
    fn test_products_total_pages_rounds_up() {
        let mut state = ProductsViewState::new(30);
        assert_eq!(state.total_pages(), 0);
        state.total = 30;
        assert_eq!(state.total_pages(), 1);
        state.total = 31;
        assert_eq!(state.total_pages(), 2);
        state.total = 5013;
        assert_eq!(state.total_pages(), 168);
    }

    #[test]
    fn test_selected_product_out_of_range_is_none() {
        let mut state = ProductsViewState::new(30);
        state.items = vec![sample_product(1)];
        state.selected = Some(5);
        assert!(state.selected_product().is_none());
        state.selected = Some(0);
        assert!(state.selected_product().is_some());
    }

    #[test]
    fn test_select_next_empty_list() {
        let mut selected = Some(3);
        select_next_index(0, &mut selected);
        assert!(selected.is_none());
    }

    #[test]
    fn test_select_next_wraps_around() {
        let mut selected = Some(2);
        select_next_index(3, &mut selected);
        assert_eq!(selected, Some(0));
    }

    #[test]
    fn test_select_next_starts_at_first() {
        let mut selected = None;
        select_next_index(3, &mut selected);
        assert_eq!(selected, Some(0));
    }

    #[test]
    fn test_select_prev_wraps_around() {
        let mut selected = Some(0);
        select_prev_index(3, &mut selected);
        assert_eq!(selected, Some(2));
    }

    #[test]
    fn test_select_prev_from_none_picks_last() {
        let mut selected = None;
        select_prev_index(3, &mut selected);
        assert_eq!(selected, Some(2));
    }

    #[test]
    fn test_cart_selected_item() {
        let mut state = CartViewState::new();
        state.cart = Some(sample_cart(vec![
            sample_cart_item(1, 1),
            sample_cart_item(2, 3),
        ]));
        state.selected = Some(1);
        assert_eq!(state.selected_item().map(|i| i.quantity), Some(3));
    }

    #[test]
    fn test_notifications_partition() {
        let mut state = NotificationsViewState::new();
        state.items = vec![
            sample_notification("n-1", false),
            sample_notification("n-2", true),
            sample_notification("n-3", false),
        ];
        assert_eq!(state.unread_count(), 2);
        assert_eq!(state.read().count(), 1);
    }

    #[test]
    fn test_product_detail_open_resets_stale_details() {
        let mut state = ProductDetailViewState::new();
        state.product_id = Some("prod-00001".to_string());
        state.quantity = 4;
        state.open("prod-00002".to_string());
        assert_eq!(state.product_id.as_deref(), Some("prod-00002"));
        assert_eq!(state.quantity, 1);
        assert!(state.details.is_none());
    }

    #[test]
    fn test_product_detail_reopen_same_product_keeps_details() {
        let mut state = ProductDetailViewState::new();
        state.open("prod-00001".to_string());
        state.error = Some("old".to_string());
        state.open("prod-00001".to_string());
        // Same key: last-known data stays visible while revalidating.
        assert_eq!(state.error.as_deref(), Some("old"));
    }

    #[test]
    fn test_login_focus_cycles_per_mode() {
        let mut state = LoginViewState::new();
        assert_eq!(state.focus, LoginField::Username);
        state.focus_next();
        assert_eq!(state.focus, LoginField::Password);
        state.focus_next();
        assert_eq!(state.focus, LoginField::Username);

        state.toggle_mode();
        state.focus_next();
        assert_eq!(state.focus, LoginField::Email);
        state.focus_next();
        assert_eq!(state.focus, LoginField::Password);
        state.focus_next();
        assert_eq!(state.focus, LoginField::Username);
    }

    #[test]
    fn test_login_seeded_defaults() {
        let state = LoginViewState::new();
        assert_eq!(state.username_text(), "alice");
        assert_eq!(state.email_text(), "alice@example.com");
        assert_eq!(state.password_text(), "password123");
    }

    #[test]
    fn test_profile_begin_edit_seeds_form() {
        let mut state = ProfileViewState::new();
        state.profile = Some(UserProfile {
            id: "u-1".to_string(),
            username: "alice".to_string(),
            email: None,
            name: Some("Alice A.".to_string()),
            phone: None,
        });
        state.begin_edit();
        assert!(state.editing);
        assert_eq!(state.name_text(), "Alice A.");
        assert_eq!(state.phone_text(), "");
    }

    #[test]
    fn test_review_form_reset() {
        let mut form = ReviewFormState::new();
        form.active = true;
        form.rating = 2;
        form.reset();
        assert!(!form.active);
        assert_eq!(form.rating, 5);
        assert_eq!(form.title_text(), "");
    }

    #[test]
    fn test_all_view_states_have_default() {
        let _ = ProductDetailViewState::default();
        let _ = CartViewState::default();
        let _ = CheckoutViewState::default();
        let _ = OrdersViewState::default();
        let _ = NotificationsViewState::default();
        let _ = ProfileViewState::default();
        let _ = LoginViewState::default();
        let _ = ReviewFormState::default();
    }
}
