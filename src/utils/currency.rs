//! Currency utility functions for gift card amounts
//!
//! Balances are stored in cents (1 unit = 100 cents) to avoid
//! floating-point drift across repeated partial redemptions.

/// Convert a major-unit amount to cents, rounding to the nearest cent
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Convert cents back to major units
pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Format cents with 2 decimal places
pub fn format_cents(cents: i64) -> String {
    format!("{:.2}", from_cents(cents))
}
