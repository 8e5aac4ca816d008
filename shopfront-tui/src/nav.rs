//! Navigation and view switching utilities.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Products,
    ProductDetail,
    Cart,
    Checkout,
    Orders,
    Notifications,
    Profile,
    Login,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Products => "Products",
            View::ProductDetail => "Product",
            View::Cart => "Cart",
            View::Checkout => "Checkout",
            View::Orders => "Orders",
            View::Notifications => "Notifications",
            View::Profile => "Profile",
            View::Login => "Login",
        }
    }

    /// Views that only make sense with a valid session.
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            View::Cart | View::Checkout | View::Orders | View::Notifications | View::Profile
        )
    }

    pub fn all() -> &'static [View] {
        &[
            View::Products,
            View::ProductDetail,
            View::Cart,
            View::Checkout,
            View::Orders,
            View::Notifications,
            View::Profile,
            View::Login,
        ]
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|v| v == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<View> {
        Self::all().get(index).copied()
    }

    pub fn next(&self) -> View {
        let idx = self.index();
        let all = Self::all();
        all[(idx + 1) % all.len()]
    }

    pub fn previous(&self) -> View {
        let idx = self.index();
        let all = Self::all();
        let prev = if idx == 0 { all.len() - 1 } else { idx - 1 };
        all[prev]
    }
}
