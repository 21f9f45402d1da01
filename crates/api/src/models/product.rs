//! Product, variant and feature types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use priceworth_core::{CategoryId, FeatureId, ProductId, VariantId};

use super::category::Category;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub model: String,
    pub product_category_id: CategoryId,
    pub short_description: String,
    pub long_description: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchasable variant (size, colour, ...) of a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub color: String,
    pub dimension_height: f64,
    pub dimension_length: f64,
    pub dimension_width: f64,
    pub weight: f64,
    pub price: Decimal,
    pub total_inventory: i32,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A key/value product attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: FeatureId,
    pub product_id: ProductId,
    pub key: String,
    pub value: String,
}

/// A product with its variants, features and category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
    pub product_variants: Vec<ProductVariant>,
    pub features: Vec<Feature>,
}

// =============================================================================
// Inputs
// =============================================================================

/// Request body for creating a product together with its variants and features.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub model: String,
    pub product_category_id: CategoryId,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default = "default_true")]
    pub published: bool,
    #[serde(default)]
    pub features: Vec<FeatureFields>,
    #[serde(default)]
    pub product_variants: Vec<VariantFields>,
}

/// Partial product update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub model: Option<String>,
    pub product_category_id: Option<CategoryId>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub published: Option<bool>,
}

/// Variant fields shared by nested and standalone variant creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantFields {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_dimension")]
    pub dimension_height: f64,
    #[serde(default = "default_dimension")]
    pub dimension_length: f64,
    #[serde(default = "default_dimension")]
    pub dimension_width: f64,
    #[serde(default)]
    pub weight: f64,
    pub price: Decimal,
    #[serde(default)]
    pub total_inventory: i32,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Request body for adding a variant to an existing product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVariant {
    pub product_id: ProductId,
    #[serde(flatten)]
    pub fields: VariantFields,
}

/// Partial variant update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantUpdate {
    pub product_id: Option<ProductId>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub color: Option<String>,
    pub dimension_height: Option<f64>,
    pub dimension_length: Option<f64>,
    pub dimension_width: Option<f64>,
    pub weight: Option<f64>,
    pub price: Option<Decimal>,
    pub total_inventory: Option<i32>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFields {
    pub key: String,
    pub value: String,
}

/// Request body for adding a feature to an existing product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeature {
    pub product_id: ProductId,
    #[serde(flatten)]
    pub fields: FeatureFields,
}

/// Partial feature update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureUpdate {
    pub product_id: Option<ProductId>,
    pub key: Option<String>,
    pub value: Option<String>,
}

const fn default_true() -> bool {
    true
}

const fn default_dimension() -> f64 {
    100.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_defaults() {
        let body = r#"{
            "name": "Desk",
            "model": "D-100",
            "productCategoryId": 3,
            "productVariants": [{ "name": "Oak", "sku": "D-100-OAK", "price": 249.5 }]
        }"#;
        let product: NewProduct = serde_json::from_str(body).unwrap();
        assert!(product.published);
        assert!(product.features.is_empty());

        let variant = product.product_variants.first().unwrap();
        assert!((variant.dimension_height - 100.0).abs() < f64::EPSILON);
        assert_eq!(variant.price, Decimal::new(2495, 1));
        assert!(variant.images.is_empty());
    }

    #[test]
    fn test_new_variant_accepts_string_price() {
        let body = r#"{ "productId": 1, "name": "Walnut", "sku": "D-100-WAL", "price": "19.99" }"#;
        let variant: NewVariant = serde_json::from_str(body).unwrap();
        assert_eq!(variant.product_id, ProductId::new(1));
        assert_eq!(variant.fields.price.to_string(), "19.99");
    }
}
