//! Name-based dispatch of tool calls.
//!
//! Maps a tool name and its raw JSON input to the typed operation on
//! [`RetailTools`]. Input that does not deserialize into the operation's
//! parameters becomes a `ValidationError` envelope without touching the
//! backend.

use retail_agents_core::ResultEnvelope;
use serde_json::Value;
use tracing::instrument;

use crate::error::ToolError;
use crate::search::SearchBackend;

use super::{RetailTools, finish, parse_input};

impl<B: SearchBackend> RetailTools<B> {
    /// Execute a tool by name.
    ///
    /// Always returns an envelope. Unknown tool names yield a
    /// `ValidationError` envelope with parameter `tool`.
    #[instrument(skip(self, input), fields(tool = %name))]
    pub async fn execute(&self, name: &str, input: &Value) -> ResultEnvelope {
        match self.dispatch(name, input).await {
            Ok(envelope) => envelope,
            Err(err) => finish(name, Err(err)),
        }
    }

    async fn dispatch(&self, name: &str, input: &Value) -> Result<ResultEnvelope, ToolError> {
        let envelope = match name {
            // Inventory
            "check_product_inventory" => self.check_product_inventory(parse_input(input)?).await,
            "search_inventory_by_category" => {
                self.search_inventory_by_category(parse_input(input)?).await
            }
            "get_low_stock_alerts" => self.get_low_stock_alerts(parse_input(input)?).await,
            "get_inventory_by_region" => self.get_inventory_by_region(parse_input(input)?).await,
            "check_demand_forecast" => self.check_demand_forecast(parse_input(input)?).await,
            "get_seasonal_inventory_analysis" => {
                self.get_seasonal_inventory_analysis(parse_input(input)?).await
            }
            "get_inventory_statistics" => self.get_inventory_statistics(parse_input(input)?).await,

            // Shopping
            "search_shopping_data_by_category" => {
                self.search_shopping_data_by_category(parse_input(input)?).await
            }
            "get_customer_purchase_history" => {
                self.get_customer_purchase_history(parse_input(input)?).await
            }
            "analyze_shopping_trends_by_gender" => {
                self.analyze_shopping_trends_by_gender(parse_input(input)?).await
            }
            "get_high_value_transactions" => {
                self.get_high_value_transactions(parse_input(input)?).await
            }
            "analyze_shopping_mall_performance" => {
                self.analyze_shopping_mall_performance(parse_input(input)?).await
            }
            "get_payment_method_analytics" => {
                self.get_payment_method_analytics(parse_input(input)?).await
            }
            "search_transactions_by_date_range" => {
                self.search_transactions_by_date_range(parse_input(input)?).await
            }

            // Products
            "search_products" => self.search_products(parse_input(input)?).await,
            "search_products_by_category" => {
                self.search_products_by_category(parse_input(input)?).await
            }
            "get_product_by_id" => self.get_product_by_id(parse_input(input)?).await,
            "compare_products" => self.compare_products(parse_input(input)?).await,
            "search_similar_products" => self.search_similar_products(parse_input(input)?).await,

            // Reviews
            "fetch_reviews_by_semantic_search" => {
                self.fetch_reviews_by_semantic_search(parse_input(input)?).await
            }
            "fetch_reviews_by_rating" => self.fetch_reviews_by_rating(parse_input(input)?).await,
            "aggregate_rating_statistics" => {
                self.aggregate_rating_statistics(parse_input(input)?).await
            }
            "fetch_reviews_by_department" => {
                self.fetch_reviews_by_department(parse_input(input)?).await
            }
            "fetch_reviews_by_class" => self.fetch_reviews_by_class(parse_input(input)?).await,

            // Support
            "search_faqs" => self.search_faqs(parse_input(input)?).await,
            "search_faqs_by_topic" => self.search_faqs_by_topic(parse_input(input)?).await,
            "get_faq_by_id" => self.get_faq_by_id(parse_input(input)?).await,
            "search_faqs_recent" => self.search_faqs_recent(parse_input(input)?).await,
            "get_faq_statistics" => self.get_faq_statistics(parse_input(input)?).await,

            _ => return Err(ToolError::UnknownTool(name.to_string())),
        };
        Ok(envelope)
    }
}
