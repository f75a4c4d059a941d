//! Per-domain field names.
//!
//! Each index was loaded from a different dataset, so naming differs between
//! domains (`"Inventory Level"` with an embedded space, `snake_case` in the
//! shopping data). Names are used verbatim: no trimming, no case folding. A
//! deployment whose index schema differs overrides individual names from a
//! YAML file; unspecified names keep their defaults.

use serde::{Deserialize, Serialize};

/// Field tables for all five domains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldTables {
    /// Store inventory index.
    pub inventory: InventoryFields,
    /// Customer shopping transactions index.
    pub shopping: ShoppingFields,
    /// Product catalog index.
    pub products: ProductFields,
    /// Clothing reviews index.
    pub reviews: ReviewFields,
    /// Support FAQ index.
    pub faqs: FaqFields,
}

impl FieldTables {
    /// Parse a (possibly partial) YAML override.
    ///
    /// # Errors
    ///
    /// Returns the YAML error when the document is not a valid table.
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(source)
    }
}

/// Store inventory fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryFields {
    /// Product identifier.
    pub product_id: String,
    /// Store identifier.
    pub store_id: String,
    /// Sales region of the store.
    pub region: String,
    /// Product category.
    pub category: String,
    /// Units on hand.
    pub inventory_level: String,
    /// Units sold on the record date.
    pub units_sold: String,
    /// Units on order.
    pub units_ordered: String,
    /// Unit price.
    pub price: String,
    /// Discount percentage.
    pub discount: String,
    /// Forecast demand in units.
    pub demand_forecast: String,
    /// Record date.
    pub date: String,
    /// Season label (Spring, Summer, Autumn, Winter).
    pub seasonality: String,
}

impl Default for InventoryFields {
    fn default() -> Self {
        Self {
            product_id: "Product ID".to_string(),
            store_id: "Store ID".to_string(),
            region: "Region".to_string(),
            category: "Category".to_string(),
            inventory_level: "Inventory Level".to_string(),
            units_sold: "Units Sold".to_string(),
            units_ordered: "Units Ordered".to_string(),
            price: "Price".to_string(),
            discount: "Discount".to_string(),
            demand_forecast: "Demand Forecast".to_string(),
            date: "Date".to_string(),
            seasonality: "Seasonality".to_string(),
        }
    }
}

/// Shopping transaction fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoppingFields {
    /// Invoice number.
    pub invoice_no: String,
    /// Customer identifier.
    pub customer_id: String,
    /// Customer gender.
    pub gender: String,
    /// Customer age.
    pub age: String,
    /// Product category.
    pub category: String,
    /// Units bought.
    pub quantity: String,
    /// Unit price.
    pub price: String,
    /// Payment method.
    pub payment_method: String,
    /// Transaction date.
    pub invoice_date: String,
    /// Mall where the purchase was made.
    pub shopping_mall: String,
    /// Date format of `invoice_date` in the index mapping.
    pub invoice_date_format: String,
}

impl Default for ShoppingFields {
    fn default() -> Self {
        Self {
            invoice_no: "invoice_no".to_string(),
            customer_id: "customer_id".to_string(),
            gender: "gender".to_string(),
            age: "age".to_string(),
            category: "category".to_string(),
            quantity: "quantity".to_string(),
            price: "price".to_string(),
            payment_method: "payment_method".to_string(),
            invoice_date: "invoice_date".to_string(),
            shopping_mall: "shopping_mall".to_string(),
            invoice_date_format: "dd/MM/yyyy".to_string(),
        }
    }
}

/// Product catalog fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFields {
    /// Product name.
    pub name: String,
    /// Long description.
    pub description: String,
    /// Product category.
    pub category: String,
    /// Brand name.
    pub brand: String,
    /// Free-form tags.
    pub tags: String,
    /// Unit price.
    pub price: String,
    /// Popularity score used for ranking.
    pub popularity: String,
}

impl ProductFields {
    /// Boosted fields for free-text product search.
    #[must_use]
    pub fn search_fields(&self) -> Vec<String> {
        vec![
            format!("{}^3", self.name),
            format!("{}^2", self.description),
            self.category.clone(),
            self.brand.clone(),
            self.tags.clone(),
        ]
    }

    /// Text fields compared when looking for similar products.
    #[must_use]
    pub fn similarity_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.description.clone(),
            self.category.clone(),
            self.tags.clone(),
        ]
    }
}

impl Default for ProductFields {
    fn default() -> Self {
        Self {
            name: "name".to_string(),
            description: "description".to_string(),
            category: "category".to_string(),
            brand: "brand".to_string(),
            tags: "tags".to_string(),
            price: "price".to_string(),
            popularity: "popularity".to_string(),
        }
    }
}

/// Review fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewFields {
    /// Star rating, 1 to 5.
    pub rating: String,
    /// Review title.
    pub title: String,
    /// Review body.
    pub review_text: String,
    /// Clothing department.
    pub department_name: String,
    /// Clothing class.
    pub class_name: String,
    /// Positive feedback votes from other customers.
    pub alike_feedback_count: String,
    /// Reviewer age.
    pub age: String,
    /// Dense vector field holding the review text embedding.
    pub embedding: String,
}

impl Default for ReviewFields {
    fn default() -> Self {
        Self {
            rating: "rating".to_string(),
            title: "title".to_string(),
            review_text: "review_text".to_string(),
            department_name: "department_name".to_string(),
            class_name: "class_name".to_string(),
            alike_feedback_count: "alike_feedback_count".to_string(),
            age: "age".to_string(),
            embedding: "review_text_embedding".to_string(),
        }
    }
}

/// FAQ fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqFields {
    /// FAQ text.
    pub content: String,
    /// Content type.
    pub content_type: String,
    /// Length of the content in characters.
    pub content_length: String,
    /// Content language.
    pub language: String,
    /// Source document format.
    pub format: String,
    /// Publication date.
    pub date: String,
    /// Last modification time.
    pub modified: String,
}

impl Default for FaqFields {
    fn default() -> Self {
        Self {
            content: "content".to_string(),
            content_type: "content_type".to_string(),
            content_length: "content_length".to_string(),
            language: "language".to_string(),
            format: "format".to_string(),
            date: "date".to_string(),
            modified: "modified".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_embedded_spaces() {
        let tables = FieldTables::default();
        assert_eq!(tables.inventory.inventory_level, "Inventory Level");
        assert_eq!(tables.inventory.product_id, "Product ID");
        assert_eq!(tables.shopping.invoice_date_format, "dd/MM/yyyy");
    }

    #[test]
    fn test_partial_yaml_override() {
        let yaml = r#"
inventory:
  category: "Category "
reviews:
  embedding: text_vector
"#;
        let tables = FieldTables::from_yaml(yaml).unwrap();
        // Overridden names are kept byte for byte, trailing space included.
        assert_eq!(tables.inventory.category, "Category ");
        assert_eq!(tables.inventory.region, "Region");
        assert_eq!(tables.reviews.embedding, "text_vector");
        assert_eq!(tables.products, ProductFields::default());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(FieldTables::from_yaml("  \n").unwrap(), FieldTables::default());
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        assert!(FieldTables::from_yaml("inventory: [1, 2").is_err());
    }

    #[test]
    fn test_product_search_fields_are_boosted() {
        let fields = ProductFields::default().search_fields();
        assert_eq!(
            fields,
            ["name^3", "description^2", "category", "brand", "tags"]
        );
    }
}
