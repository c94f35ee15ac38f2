//! Mock storefront data
//!
//! Products and orders are loaded once from static JSON files and shared
//! read-only across the tool system. Cancellation is simulated; nothing
//! here ever mutates after load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// A catalog product
///
/// `eta_by_zip` maps zip-code prefixes to delivery-window strings; the
/// `"*"` entry is the default when no prefix matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub sizes: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub eta_by_zip: HashMap<String, String>,
}

impl Product {
    /// Resolve the delivery window for a zip code
    ///
    /// Longest matching prefix wins; falls back to the `"*"` entry, then to
    /// a catalog-wide default window.
    pub fn eta_window(&self, zip: &str) -> String {
        let mut best: Option<(&str, &str)> = None;
        for (prefix, window) in &self.eta_by_zip {
            if prefix != "*" && zip.starts_with(prefix.as_str()) {
                match best {
                    Some((current, _)) if current.len() >= prefix.len() => {}
                    _ => best = Some((prefix.as_str(), window.as_str())),
                }
            }
        }

        if let Some((_, window)) = best {
            return window.to_string();
        }
        self.eta_by_zip
            .get("*")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ETA_WINDOW.to_string())
    }
}

/// Delivery window used when a product carries no ETA table at all
pub const DEFAULT_ETA_WINDOW: &str = "2–5 business days";

/// A customer order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub order_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

/// Read-only product catalog and order book
#[derive(Debug, Clone, Default)]
pub struct Storefront {
    products: Vec<Product>,
    orders: Vec<Order>,
}

/// Storefront data loading errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read data file {path}: {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse data file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

impl Storefront {
    /// Load products and orders from JSON files
    pub fn load(products_path: &Path, orders_path: &Path) -> Result<Self, StoreError> {
        let products = load_json(products_path)?;
        let orders = load_json(orders_path)?;
        Ok(Self { products, orders })
    }

    /// Build a storefront from in-memory records (tests, demos)
    pub fn from_records(products: Vec<Product>, orders: Vec<Order>) -> Self {
        Self { products, orders }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Look up an order by id alone (case-insensitive)
    pub fn order_by_id(&self, order_id: &str) -> Option<&Order> {
        self.orders
            .iter()
            .find(|o| o.order_id.eq_ignore_ascii_case(order_id))
    }

    /// Look up an order by id AND email, both case-insensitive
    ///
    /// Any mismatch on either field yields no result.
    pub fn find_order(&self, order_id: &str, email: &str) -> Option<&Order> {
        self.orders.iter().find(|o| {
            o.order_id.eq_ignore_ascii_case(order_id) && o.email.eq_ignore_ascii_case(email)
        })
    }

    /// Look up a product by id
    pub fn product_by_id(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::FileRead {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.display().to_string(),
        source,
    })
}
