//! Catalog service: products, their variants and features.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use priceworth_core::{CategoryId, FeatureId, ProductId, VariantId, normalize_price};

use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::product::{
    Feature, FeatureUpdate, NewFeature, NewProduct, NewVariant, Product, ProductDetail,
    ProductUpdate, ProductVariant, VariantUpdate,
};

/// Catalog service.
pub struct ProductService<'a> {
    products: ProductRepository<'a>,
    categories: CategoryRepository<'a>,
}

impl<'a> ProductService<'a> {
    /// Create a new product service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
            categories: CategoryRepository::new(pool),
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Create a product together with its variants and features.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the category does not exist.
    /// Returns `AppError::BadRequest` for an invalid price or a duplicate SKU.
    pub async fn create_product(&self, mut input: NewProduct) -> Result<ProductDetail> {
        for variant in &mut input.product_variants {
            variant.price = checked_price(variant.price)?;
        }
        self.require_category(input.product_category_id).await?;

        let id = self
            .products
            .create(&input)
            .await
            .map_err(|e| sku_conflict(e, "a variant SKU already exists"))?;

        info!(product_id = %id, name = %input.name, "Product created");
        self.get_product(id).await
    }

    /// Every product with variants, features and category.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails.
    pub async fn list_products(&self) -> Result<Vec<ProductDetail>> {
        let products = self.products.list().await?;
        self.details(products).await
    }

    /// Products of one category, with variants and features.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails.
    pub async fn list_in_category(&self, category_id: CategoryId) -> Result<Vec<ProductDetail>> {
        let products = self.products.list_in_category(category_id).await?;
        self.details(products).await
    }

    /// A product with variants, features and category.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist.
    pub async fn get_product(&self, id: ProductId) -> Result<ProductDetail> {
        let product = self
            .products
            .get(id)
            .await?
            .ok_or_else(|| product_not_found(id))?;

        self.details(vec![product])
            .await?
            .pop()
            .ok_or_else(|| product_not_found(id))
    }

    /// Apply a partial product update.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product or the new category does not exist.
    pub async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<ProductDetail> {
        if self.products.get(id).await?.is_none() {
            return Err(product_not_found(id));
        }
        if let Some(category_id) = update.product_category_id {
            self.require_category(category_id).await?;
        }

        self.products
            .update(id, &update)
            .await?
            .ok_or_else(|| product_not_found(id))?;

        info!(product_id = %id, "Product updated");
        self.get_product(id).await
    }

    /// Delete a product with its variants and features.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist.
    /// Returns `AppError::BadRequest` if one of its variants has been ordered.
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        let deleted = self.products.delete(id).await.map_err(|e| match e {
            RepositoryError::ForeignKey(_) => AppError::BadRequest(format!(
                "Product with ID {id} has been ordered and cannot be deleted"
            )),
            other => other.into(),
        })?;

        if !deleted {
            return Err(product_not_found(id));
        }
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    // =========================================================================
    // Variants
    // =========================================================================

    /// Add a variant to an existing product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist.
    /// Returns `AppError::BadRequest` for an invalid price or a duplicate SKU.
    pub async fn create_variant(&self, mut input: NewVariant) -> Result<ProductVariant> {
        input.fields.price = checked_price(input.fields.price)?;
        self.require_product(input.product_id).await?;

        let sku = input.fields.sku.clone();
        let variant = self
            .products
            .create_variant(input.product_id, &input.fields)
            .await
            .map_err(|e| sku_conflict(e, &format!("SKU {sku} already exists")))?;

        info!(
            variant_id = %variant.id,
            product_id = %variant.product_id,
            sku = %variant.sku,
            "Variant created"
        );
        Ok(variant)
    }

    /// Apply a partial variant update.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the variant or the new product does not exist.
    /// Returns `AppError::BadRequest` for an invalid price or a duplicate SKU.
    pub async fn update_variant(
        &self,
        id: VariantId,
        mut update: VariantUpdate,
    ) -> Result<ProductVariant> {
        if let Some(price) = update.price {
            update.price = Some(checked_price(price)?);
        }
        if self.products.get_variant(id).await?.is_none() {
            return Err(variant_not_found(id));
        }
        if let Some(product_id) = update.product_id {
            self.require_product(product_id).await?;
        }

        let variant = self
            .products
            .update_variant(id, &update)
            .await
            .map_err(|e| sku_conflict(e, "SKU already exists"))?
            .ok_or_else(|| variant_not_found(id))?;

        info!(variant_id = %id, "Variant updated");
        Ok(variant)
    }

    /// Delete a variant, removing it from every cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the variant does not exist.
    /// Returns `AppError::BadRequest` if the variant has been ordered.
    pub async fn delete_variant(&self, id: VariantId) -> Result<()> {
        let deleted = self.products.delete_variant(id).await.map_err(|e| match e {
            RepositoryError::ForeignKey(_) => AppError::BadRequest(format!(
                "Product Variant with ID {id} has been ordered and cannot be deleted"
            )),
            other => other.into(),
        })?;

        if !deleted {
            return Err(variant_not_found(id));
        }
        info!(variant_id = %id, "Variant deleted");
        Ok(())
    }

    // =========================================================================
    // Features
    // =========================================================================

    /// Add a feature to an existing product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist.
    pub async fn create_feature(&self, input: NewFeature) -> Result<Feature> {
        self.require_product(input.product_id).await?;
        let feature = self
            .products
            .create_feature(input.product_id, &input.fields)
            .await?;

        info!(feature_id = %feature.id, product_id = %feature.product_id, "Feature created");
        Ok(feature)
    }

    /// Apply a partial feature update.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the feature or the new product does not exist.
    pub async fn update_feature(&self, id: FeatureId, update: FeatureUpdate) -> Result<Feature> {
        if let Some(product_id) = update.product_id {
            self.require_product(product_id).await?;
        }

        let feature = self
            .products
            .update_feature(id, &update)
            .await?
            .ok_or_else(|| feature_not_found(id))?;

        info!(feature_id = %id, "Feature updated");
        Ok(feature)
    }

    /// Delete a feature.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the feature does not exist.
    pub async fn delete_feature(&self, id: FeatureId) -> Result<()> {
        if !self.products.delete_feature(id).await? {
            return Err(feature_not_found(id));
        }
        info!(feature_id = %id, "Feature deleted");
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn require_category(&self, id: CategoryId) -> Result<()> {
        if self.categories.get(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Category with ID {id} not found")));
        }
        Ok(())
    }

    async fn require_product(&self, id: ProductId) -> Result<()> {
        if self.products.get(id).await?.is_none() {
            return Err(product_not_found(id));
        }
        Ok(())
    }

    /// Attach variants, features and category to each product, keeping order.
    async fn details(&self, products: Vec<Product>) -> Result<Vec<ProductDetail>> {
        if products.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
        let mut variants: HashMap<ProductId, Vec<ProductVariant>> = HashMap::new();
        for variant in self.products.variants_for(&ids).await? {
            variants.entry(variant.product_id).or_default().push(variant);
        }
        let mut features: HashMap<ProductId, Vec<Feature>> = HashMap::new();
        for feature in self.products.features_for(&ids).await? {
            features.entry(feature.product_id).or_default().push(feature);
        }
        let categories: HashMap<CategoryId, _> = self
            .categories
            .list()
            .await?
            .into_iter()
            .map(|category| (category.id, category))
            .collect();

        Ok(products
            .into_iter()
            .map(|product| ProductDetail {
                category: categories.get(&product.product_category_id).cloned(),
                product_variants: variants.remove(&product.id).unwrap_or_default(),
                features: features.remove(&product.id).unwrap_or_default(),
                product,
            })
            .collect())
    }
}

fn checked_price(price: Decimal) -> Result<Decimal> {
    normalize_price(price).map_err(|e| AppError::BadRequest(format!("Invalid price: {e}")))
}

fn sku_conflict(e: RepositoryError, message: &str) -> AppError {
    match e {
        RepositoryError::Conflict(_) => AppError::BadRequest(message.to_string()),
        other => other.into(),
    }
}

fn product_not_found(id: ProductId) -> AppError {
    AppError::NotFound(format!("Product with ID {id} not found"))
}

fn variant_not_found(id: VariantId) -> AppError {
    AppError::NotFound(format!("Product Variant with ID {id} not found"))
}

fn feature_not_found(id: FeatureId) -> AppError {
    AppError::NotFound(format!("Feature with ID #{id} not found"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn test_checked_price_rounds_half_away_from_zero() {
        assert_eq!(
            checked_price(Decimal::new(19_995, 3)).unwrap().to_string(),
            "20.00"
        );
        assert_eq!(checked_price(Decimal::new(5, 0)).unwrap().to_string(), "5.00");
    }

    #[test]
    fn test_checked_price_rejects_negative() {
        let err = checked_price(Decimal::new(-1, 2)).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_sku_conflict_mapping() {
        let err = sku_conflict(
            RepositoryError::Conflict("sku already exists".to_string()),
            "SKU ABC already exists",
        );
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "SKU ABC already exists"));

        let err = sku_conflict(RepositoryError::NotFound, "unused");
        assert!(matches!(err, AppError::Database(RepositoryError::NotFound)));
    }
}
