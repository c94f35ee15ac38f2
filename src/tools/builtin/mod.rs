//! Builtin storefront tool implementations

mod order_tools;
mod product_tools;

pub use order_tools::{OrderCancelTool, OrderLookupTool, CANCEL_WINDOW_MIN};
pub use product_tools::{DeliveryEstimateTool, ProductSearchTool, SizeRecommenderTool};
