//! Canonical cache keys.
//!
//! Every view addressing the same resource must go through the same key,
//! so cross-component consistency (badge + page) falls out of the cache
//! rather than being wired by hand.

pub const CART: &str = "cart";
pub const CART_COUNT: &str = "cart-count";
pub const NOTIFICATIONS: &str = "notifications";
pub const NOTIFICATION_COUNT: &str = "notification-count";
pub const ORDERS: &str = "orders";
pub const USER_PROFILE: &str = "user-profile";

pub fn products(page: u32, limit: u32) -> String {
    format!("products?page={page}&limit={limit}")
}

pub fn product_details(product_id: &str) -> String {
    format!("product-details/{product_id}")
}

pub fn order_details(order_id: &str) -> String {
    format!("order-details/{order_id}")
}

pub fn reviews(product_id: &str) -> String {
    format!("reviews/{product_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_pages_have_distinct_keys() {
        assert_ne!(products(1, 30), products(2, 30));
        assert_ne!(products(1, 30), products(1, 10));
        assert_eq!(products(3, 30), products(3, 30));
    }

    #[test]
    fn test_detail_keys_embed_the_id() {
        assert!(product_details("prod-00042").contains("prod-00042"));
        assert!(order_details("o-7").contains("o-7"));
        assert!(reviews("prod-00042").contains("prod-00042"));
    }
}
