//! Human-facing order numbers.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Prefix of every order number.
pub const ORDER_NUMBER_PREFIX: &str = "TL";

/// Format an order number: `TL-YYYYMMDD-XXXXXXXX`.
///
/// The suffix is the first 8 hex digits of `nonce`, uppercased.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use threadline_core::types::order_number::format_order_number;
/// use uuid::Uuid;
///
/// let at = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
/// let nonce = Uuid::parse_str("9f3b1c2a-0000-4000-8000-000000000000").unwrap();
/// assert_eq!(format_order_number(at, nonce), "TL-20260309-9F3B1C2A");
/// ```
#[must_use]
pub fn format_order_number(at: DateTime<Utc>, nonce: Uuid) -> String {
    let hex = nonce.simple().to_string();
    let suffix = hex.get(..8).unwrap_or(&hex).to_ascii_uppercase();
    format!("{ORDER_NUMBER_PREFIX}-{}-{suffix}", at.format("%Y%m%d"))
}

/// A fresh order number for an order placed now.
#[must_use]
pub fn new_order_number() -> String {
    format_order_number(Utc::now(), Uuid::new_v4())
}

/// Whether `s` has the order number shape.
#[must_use]
pub fn is_order_number(s: &str) -> bool {
    let mut parts = s.split('-');
    matches!(
        (parts.next(), parts.next(), parts.next(), parts.next()),
        (Some(ORDER_NUMBER_PREFIX), Some(date), Some(suffix), None)
            if date.len() == 8
                && date.bytes().all(|b| b.is_ascii_digit())
                && suffix.len() == 8
                && suffix.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_numbers_have_the_expected_shape() {
        let number = new_order_number();
        assert_eq!(number.len(), "TL-20260101-ABCDEF01".len());
        assert!(is_order_number(&number), "{number}");
    }

    #[test]
    fn test_shape_check() {
        assert!(is_order_number("TL-20260309-9F3B1C2A"));
        assert!(!is_order_number("TL-20260309-9f3b1c2a"));
        assert!(!is_order_number("XX-20260309-9F3B1C2A"));
        assert!(!is_order_number("TL-2026039-9F3B1C2A"));
        assert!(!is_order_number("TL-20260309-9F3B1C2A-1"));
    }
}
