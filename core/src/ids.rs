//! Random identifiers.
//!
//! Order IDs and request IDs are 128 bits drawn from the thread-local CSPRNG
//! and rendered as 32 lowercase hex characters.

/// Generate a 128-bit random identifier encoded as lowercase hex.
#[must_use]
pub fn random_hex_id() -> String {
    let value: u128 = rand::random();
    format!("{value:032x}")
}

/// Generate a new order ID.
#[must_use]
pub fn new_order_id() -> String {
    random_hex_id()
}

/// Generate a new request ID.
#[must_use]
pub fn new_request_id() -> String {
    random_hex_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_32_lowercase_hex_chars() {
        let id = random_hex_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1000).map(|_| new_order_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
