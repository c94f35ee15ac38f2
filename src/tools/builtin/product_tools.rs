//! Product-side tools: catalog search, size recommendation, delivery estimate

use crate::store::{Product, Storefront, DEFAULT_ETA_WINDOW};
use crate::tools::{Tool, ToolDescription, ToolError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

static QUERY_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9]+").expect("token regex"));

/// Query words that describe the request, not the product
const STOPWORDS: &[&str] = &[
    "under", "less", "budget", "m", "l", "xl", "s", "eta", "to", "guest", "between", "im", "i",
    "zip",
];

/// Catalog search tool
///
/// Filters by optional price cap and tags; without tags, falls back to a
/// token match over name, tags, and color. Results are sorted by price,
/// then id, so callers can truncate deterministically.
pub struct ProductSearchTool {
    store: Arc<Storefront>,
}

impl ProductSearchTool {
    pub fn new(store: Arc<Storefront>) -> Self {
        Self { store }
    }

    /// Whether a product matches the query (pure function)
    fn matches(product: &Product, tokens: &[String], price_max: Option<f64>, tags: &[String]) -> bool {
        if let Some(cap) = price_max {
            if product.price > cap {
                return false;
            }
        }

        if !tags.is_empty() {
            let product_tags: HashSet<String> =
                product.tags.iter().map(|t| t.to_lowercase()).collect();
            // Tag match is sufficient on its own
            return tags.iter().all(|t| product_tags.contains(&t.to_lowercase()));
        }

        if !tokens.is_empty() {
            let hay = format!(
                "{} {} {}",
                product.name,
                product.tags.join(" "),
                product.color
            )
            .to_lowercase();
            let meaningful: Vec<&String> = tokens
                .iter()
                .filter(|t| !STOPWORDS.contains(&t.as_str()))
                .collect();
            if meaningful.is_empty() {
                return true;
            }
            return meaningful.iter().any(|t| hay.contains(t.as_str()));
        }

        true
    }

    /// Tokenize a free-text query (pure function)
    fn tokenize(query: &str) -> Vec<String> {
        QUERY_TOKEN_RE
            .find_iter(&query.to_lowercase())
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Run the search over the catalog (pure function)
    fn search(
        products: &[Product],
        query: &str,
        price_max: Option<f64>,
        tags: &[String],
    ) -> Vec<Product> {
        let tokens = Self::tokenize(query);
        let mut matched: Vec<Product> = products
            .iter()
            .filter(|p| Self::matches(p, &tokens, price_max, tags))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            a.price
                .partial_cmp(&b.price)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        matched
    }
}

#[async_trait]
impl Tool for ProductSearchTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: "product_search".to_string(),
            description: "Search the catalog by query text, price cap, and tags".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "price_max": {"type": "number"},
                    "tags": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        }
    }

    async fn initialize(&mut self, _config: Option<&Value>) -> Result<(), ToolError> {
        Ok(())
    }

    async fn execute(&self, parameters: &Value) -> Result<Value, ToolError> {
        let query = parameters["query"].as_str().unwrap_or_default();
        let price_max = parameters.get("price_max").and_then(|v| v.as_f64());
        let tags: Vec<String> = parameters
            .get("tags")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|t| t.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let matched = Self::search(self.store.products(), query, price_max, &tags);
        serde_json::to_value(matched).map_err(|e| ToolError::ExecutionError(e.to_string()))
    }
}

/// Size recommendation tool
///
/// Text-rule recommendation: a stated preference for a loose fit bumps the
/// pick to L, everything else lands on M with a fit-tradeoff rationale.
pub struct SizeRecommenderTool;

impl SizeRecommenderTool {
    pub fn new() -> Self {
        Self
    }

    /// Recommend a size from message text (pure function)
    fn recommend(message: &str) -> (&'static str, &'static str) {
        let text = message.to_lowercase();
        if text.contains("loose") || text.contains("oversized") {
            (
                "L",
                "You prefer a looser fit; L should feel roomier. Choose M for a snugger fit.",
            )
        } else {
            (
                "M",
                "You mentioned you're between M and L; we suggest M for a closer fit or L if you prefer a roomier feel.",
            )
        }
    }
}

impl Default for SizeRecommenderTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SizeRecommenderTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: "size_recommender".to_string(),
            description: "Recommend a size from the user's fit preferences".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "message": {"type": "string"}
                },
                "required": ["message"],
                "additionalProperties": false
            }),
        }
    }

    async fn initialize(&mut self, _config: Option<&Value>) -> Result<(), ToolError> {
        Ok(())
    }

    async fn execute(&self, parameters: &Value) -> Result<Value, ToolError> {
        let message = parameters["message"].as_str().unwrap_or_default();
        let (recommended, rationale) = Self::recommend(message);
        Ok(json!({
            "recommended": recommended,
            "rationale": rationale
        }))
    }
}

/// Delivery estimate tool
///
/// Resolves each picked product's zip-prefix window; when picks disagree
/// the widest window wins, so the reply never promises the fastest table.
pub struct DeliveryEstimateTool {
    store: Arc<Storefront>,
}

impl DeliveryEstimateTool {
    pub fn new(store: Arc<Storefront>) -> Self {
        Self { store }
    }

    /// Upper bound in business days of a window string (pure function)
    fn window_upper_bound(window: &str) -> u32 {
        QUERY_TOKEN_RE
            .find_iter(window)
            .filter_map(|m| m.as_str().parse::<u32>().ok())
            .max()
            .unwrap_or(0)
    }

    /// Pick the widest of the candidate windows (pure function)
    fn widest_window(windows: Vec<String>) -> Option<String> {
        windows
            .into_iter()
            .max_by_key(|w| Self::window_upper_bound(w))
    }
}

#[async_trait]
impl Tool for DeliveryEstimateTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: "delivery_estimate".to_string(),
            description: "Estimate the delivery window for a zip code and product picks"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "zip": {"type": "string"},
                    "product_ids": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["zip"],
                "additionalProperties": false
            }),
        }
    }

    async fn initialize(&mut self, _config: Option<&Value>) -> Result<(), ToolError> {
        Ok(())
    }

    async fn execute(&self, parameters: &Value) -> Result<Value, ToolError> {
        let zip = parameters["zip"].as_str().unwrap_or_default();
        let product_ids: Vec<&str> = parameters
            .get("product_ids")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        let windows: Vec<String> = product_ids
            .iter()
            .filter_map(|id| self.store.product_by_id(id))
            .map(|p| p.eta_window(zip))
            .collect();

        let eta_window =
            Self::widest_window(windows).unwrap_or_else(|| DEFAULT_ETA_WINDOW.to_string());

        Ok(json!({
            "zip": zip,
            "eta_window": eta_window
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::test_storefront;

    const PRODUCT_PROMPT: &str =
        "Wedding guest, midi, under $120 — I'm between M/L. ETA to 560001?";

    fn store() -> Arc<Storefront> {
        Arc::new(test_storefront())
    }

    #[tokio::test]
    async fn test_search_respects_price_cap_and_tags() {
        let tool = ProductSearchTool::new(store());
        let result = tool
            .execute(&json!({
                "query": PRODUCT_PROMPT,
                "price_max": 120.0,
                "tags": ["wedding", "midi"]
            }))
            .await
            .unwrap();

        let products = result.as_array().unwrap();
        assert_eq!(products.len(), 2);
        // Sorted by price: the satin wrap before the chiffon gown
        assert_eq!(products[0]["id"], "P1001");
        assert_eq!(products[1]["id"], "P1002");
        for p in products {
            assert!(p["price"].as_f64().unwrap() <= 120.0);
        }
    }

    #[tokio::test]
    async fn test_search_without_tags_uses_token_match() {
        let tool = ProductSearchTool::new(store());
        let result = tool
            .execute(&json!({"query": "navy gown"}))
            .await
            .unwrap();

        let products = result.as_array().unwrap();
        assert!(products
            .iter()
            .any(|p| p["name"] == "Chiffon Midi Gown"));
    }

    #[tokio::test]
    async fn test_search_fails_softly_to_empty() {
        let tool = ProductSearchTool::new(store());
        let result = tool
            .execute(&json!({
                "query": "wedding midi",
                "price_max": 10.0,
                "tags": ["wedding", "midi"]
            }))
            .await
            .unwrap();

        assert_eq!(result.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_stopword_only_query_matches_all() {
        let tool = ProductSearchTool::new(store());
        let result = tool
            .execute(&json!({"query": "under budget eta to zip"}))
            .await
            .unwrap();

        assert_eq!(result.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_size_recommender_default_is_m() {
        let tool = SizeRecommenderTool::new();
        let result = tool
            .execute(&json!({"message": PRODUCT_PROMPT}))
            .await
            .unwrap();

        assert_eq!(result["recommended"], "M");
        assert!(result["rationale"].as_str().unwrap().contains("between M and L"));
    }

    #[tokio::test]
    async fn test_size_recommender_loose_fit_is_l() {
        let tool = SizeRecommenderTool::new();
        let result = tool
            .execute(&json!({"message": "I like an oversized look"}))
            .await
            .unwrap();

        assert_eq!(result["recommended"], "L");
    }

    #[tokio::test]
    async fn test_delivery_estimate_uses_product_tables() {
        let tool = DeliveryEstimateTool::new(store());
        let result = tool
            .execute(&json!({"zip": "560001", "product_ids": ["P1001", "P1002"]}))
            .await
            .unwrap();

        assert_eq!(result["zip"], "560001");
        assert_eq!(result["eta_window"], "3–5 business days");
    }

    #[tokio::test]
    async fn test_delivery_estimate_without_picks_is_default() {
        let tool = DeliveryEstimateTool::new(store());
        let result = tool.execute(&json!({"zip": "00000"})).await.unwrap();

        assert_eq!(result["eta_window"], DEFAULT_ETA_WINDOW);
    }

    #[test]
    fn test_widest_window_picks_slowest() {
        let widest = DeliveryEstimateTool::widest_window(vec![
            "2–3 business days".to_string(),
            "3–5 business days".to_string(),
        ]);
        assert_eq!(widest.as_deref(), Some("3–5 business days"));
    }
}
