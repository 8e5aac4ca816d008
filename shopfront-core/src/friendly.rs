//! Maps backend error messages to user-friendly text.
//!
//! Raw backend errors are never shown to users; unknown messages fall back
//! to a generic string unconditionally.

const GENERIC_FALLBACK: &str = "Something went wrong. Please try again.";

const USER_FRIENDLY_MAP: &[(&str, &str)] = &[
    (
        "Internal server error",
        "Something went wrong. Please try again later.",
    ),
    ("Authentication required", "Please log in to continue."),
    (
        "Invalid or expired token",
        "Your session has expired. Please log in again.",
    ),
    ("Invalid order", "Please check your order and try again."),
    ("User not found", "Profile not found."),
    ("User already exists", "This account already exists."),
    ("Invalid email address", "Please enter a valid email address."),
    (
        "Unauthorized access",
        "You do not have permission to perform this action.",
    ),
    ("Order not found", "Order not found."),
    (
        "Network error. Please check your connection.",
        "Connection error. Please check your network and try again.",
    ),
];

/// Returns a user-friendly message for display in the UI.
///
/// Falls back to a generic message for `None`, empty, and unrecognized
/// input - the fallback is mandatory, nothing unmapped may leak through.
pub fn to_user_friendly(raw: Option<&str>) -> &'static str {
    let Some(raw) = raw else {
        return GENERIC_FALLBACK;
    };
    let trimmed = raw.trim();
    USER_FRIENDLY_MAP
        .iter()
        .find(|(backend, _)| *backend == trimmed)
        .map(|(_, friendly)| *friendly)
        .unwrap_or(GENERIC_FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_message_is_mapped() {
        assert_eq!(
            to_user_friendly(Some("Internal server error")),
            "Something went wrong. Please try again later."
        );
    }

    #[test]
    fn test_known_message_is_trimmed_before_lookup() {
        assert_eq!(
            to_user_friendly(Some("  User not found  ")),
            "Profile not found."
        );
    }

    #[test]
    fn test_unmapped_message_falls_back() {
        assert_eq!(to_user_friendly(Some("anything unmapped")), GENERIC_FALLBACK);
    }

    #[test]
    fn test_none_falls_back() {
        assert_eq!(to_user_friendly(None), GENERIC_FALLBACK);
    }

    #[test]
    fn test_empty_falls_back() {
        assert_eq!(to_user_friendly(Some("")), GENERIC_FALLBACK);
    }

    #[test]
    fn test_network_message_is_rewritten() {
        let friendly = to_user_friendly(Some("Network error. Please check your connection."));
        assert!(friendly.starts_with("Connection error"));
    }
}
