//! Field extraction from free-text user messages
//!
//! The ToolSelector needs a handful of structured fields out of the raw
//! message before it can call tools: a price cap, a zip code, an order id,
//! an email address, and catalog tags. All extraction is regex-based and
//! case-insensitive where the storefront data is.

use once_cell::sync::Lazy;
use regex::Regex;

static PRICE_CAP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)under\s*\$?\s*(\d+)").expect("price cap regex"));

static ZIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{5,6})\b").expect("zip regex"));

static ORDER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[Oo]rder\s*)?([A-Za-z]\d{4,})").expect("order id regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})").expect("email regex")
});

/// Catalog tags recognized in free text
const KNOWN_TAGS: &[&str] = &["wedding", "midi"];

/// Extract a "under $N" price cap
pub fn price_cap(message: &str) -> Option<f64> {
    PRICE_CAP_RE
        .captures(message)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extract a 5-6 digit zip code
pub fn zip_code(message: &str) -> Option<String> {
    ZIP_RE
        .captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract an order id of the form letter + 4 or more digits
pub fn order_id(message: &str) -> Option<String> {
    ORDER_ID_RE
        .captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract an email address
pub fn email(message: &str) -> Option<String> {
    EMAIL_RE
        .captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract known catalog tags mentioned in the message
pub fn tags(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    KNOWN_TAGS
        .iter()
        .filter(|t| lower.contains(**t))
        .map(|t| t.to_string())
        .collect()
}
