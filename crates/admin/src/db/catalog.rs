//! Catalog writes: categories, colors, sizes, occasions, products, variants
//! and product occasions.
//!
//! Reads that the storefront already offers go through
//! [`petal_storefront::db::CatalogRepository`]; this repository adds the
//! admin-only views (inactive rows included) and every mutation. Rows are
//! mapped with the storefront's row types so both services agree on shape.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use validator::{Validate, ValidationError};

use petal_core::{CategoryId, ColorId, OccasionId, ProductAttributeId, ProductId, SizeId};
use petal_storefront::db::catalog::{
    CategoryRow, ColorRow, OccasionRow, PRODUCT_COLUMNS, ProductRow, SizeRow,
};

use super::{Page, Paginated, RepositoryError, like_pattern};
use crate::models::{Category, Color, Occasion, Product, Size};

const CATEGORY_COLUMNS: &str = "id, slug, name_en, name_ar, description_en, description_ar, \
     image_url, is_active, sort_order, created_at, updated_at";

// =============================================================================
// Inputs
// =============================================================================

fn default_true() -> bool {
    true
}

/// Reject negative money amounts.
pub fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("range").with_message("Must not be negative.".into()));
    }
    Ok(())
}

fn hex_color(value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value.chars().skip(1).all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("hex_code").with_message("Must be a #RRGGBB color.".into()))
    }
}

fn slug(value: &str) -> Result<(), ValidationError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("slug")
            .with_message("Use lowercase letters, digits and dashes only.".into()))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(max = 120), custom(function = "slug"))]
    pub slug: String,
    #[validate(length(min = 1, max = 255))]
    pub name_en: String,
    #[validate(length(max = 255))]
    pub name_ar: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ColorInput {
    #[validate(length(min = 1, max = 100))]
    pub name_en: String,
    #[validate(length(max = 100))]
    pub name_ar: Option<String>,
    #[validate(custom(function = "hex_color"))]
    pub hex_code: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SizeInput {
    #[validate(length(min = 1, max = 100))]
    pub name_en: String,
    #[validate(length(max = 100))]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OccasionInput {
    #[validate(length(max = 120), custom(function = "slug"))]
    pub slug: String,
    #[validate(length(min = 1, max = 100))]
    pub name_en: String,
    #[validate(length(max = 100))]
    pub name_ar: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductInput {
    pub category_id: CategoryId,
    #[validate(length(max = 160), custom(function = "slug"))]
    pub slug: String,
    #[validate(length(max = 64))]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name_en: String,
    #[validate(length(max = 255))]
    pub name_ar: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub care_instructions: Option<String>,
    #[validate(custom(function = "non_negative"))]
    pub price: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub discount_price: Option<Decimal>,
    pub discount_from: Option<DateTime<Utc>>,
    pub discount_to: Option<DateTime<Utc>>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
}

impl ProductInput {
    /// Cross-field rules: the sale price undercuts the regular price and the
    /// sale window is ordered. Returns the offending field and message.
    #[must_use]
    pub fn check(&self) -> Option<(&'static str, &'static str)> {
        if let Some(discount) = self.discount_price
            && discount >= self.price
        {
            return Some((
                "discount_price",
                "The discount price must be lower than the price.",
            ));
        }
        if let (Some(from), Some(to)) = (self.discount_from, self.discount_to)
            && from > to
        {
            return Some((
                "discount_to",
                "The discount end must be after the discount start.",
            ));
        }
        None
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AttributeInput {
    pub color_id: Option<ColorId>,
    pub size_id: Option<SizeId>,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default)]
    pub price_adjustment: Decimal,
}

/// Filters for the admin product listing.
#[derive(Debug, Clone, Default)]
pub struct AdminProductFilter {
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for admin catalog reads and writes.
pub struct CatalogAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogAdminRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    /// List every category, inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY sort_order, name_en");
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        let sql = format!(
            "INSERT INTO categories (slug, name_en, name_ar, description_en, description_ar, \
                 image_url, is_active, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {CATEGORY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(&input.slug)
            .bind(&input.name_en)
            .bind(input.name_ar.as_deref())
            .bind(input.description_en.as_deref())
            .bind(input.description_ar.as_deref())
            .bind(input.image_url.as_deref())
            .bind(input.is_active)
            .bind(input.sort_order)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "category"))?;

        Ok(row.into())
    }

    /// Replace a category's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids and
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let sql = format!(
            "UPDATE categories SET slug = $2, name_en = $3, name_ar = $4, description_en = $5, \
                 description_ar = $6, image_url = $7, is_active = $8, sort_order = $9 \
             WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .bind(&input.slug)
            .bind(&input.name_en)
            .bind(input.name_ar.as_deref())
            .bind(input.description_en.as_deref())
            .bind(input.description_ar.as_deref())
            .bind(input.image_url.as_deref())
            .bind(input.is_active)
            .bind(input.sort_order)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "category"))?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a category and, by cascade, its products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        self.delete_by_id("categories", id.as_i32(), "category").await
    }

    // -------------------------------------------------------------------------
    // Colors, sizes, occasions
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_color(&self, input: &ColorInput) -> Result<Color, RepositoryError> {
        let row = sqlx::query_as::<_, ColorRow>(
            "INSERT INTO colors (name_en, name_ar, hex_code) VALUES ($1, $2, $3) \
             RETURNING id, name_en, name_ar, hex_code",
        )
        .bind(&input.name_en)
        .bind(input.name_ar.as_deref())
        .bind(input.hex_code.to_uppercase())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "color"))?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids.
    pub async fn update_color(&self, id: ColorId, input: &ColorInput) -> Result<Color, RepositoryError> {
        let row = sqlx::query_as::<_, ColorRow>(
            "UPDATE colors SET name_en = $2, name_ar = $3, hex_code = $4 WHERE id = $1 \
             RETURNING id, name_en, name_ar, hex_code",
        )
        .bind(id)
        .bind(&input.name_en)
        .bind(input.name_ar.as_deref())
        .bind(input.hex_code.to_uppercase())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "color"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a color and the variants that use it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids.
    pub async fn delete_color(&self, id: ColorId) -> Result<(), RepositoryError> {
        self.delete_by_id("colors", id.as_i32(), "color").await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_size(&self, input: &SizeInput) -> Result<Size, RepositoryError> {
        let row = sqlx::query_as::<_, SizeRow>(
            "INSERT INTO sizes (name_en, name_ar, sort_order) VALUES ($1, $2, $3) \
             RETURNING id, name_en, name_ar, sort_order",
        )
        .bind(&input.name_en)
        .bind(input.name_ar.as_deref())
        .bind(input.sort_order)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "size"))?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids.
    pub async fn update_size(
        &self,
        id: SizeId,
        input: &SizeInput,
    ) -> Result<Size, RepositoryError> {
        let row = sqlx::query_as::<_, SizeRow>(
            "UPDATE sizes SET name_en = $2, name_ar = $3, sort_order = $4 WHERE id = $1 \
             RETURNING id, name_en, name_ar, sort_order",
        )
        .bind(id)
        .bind(&input.name_en)
        .bind(input.name_ar.as_deref())
        .bind(input.sort_order)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "size"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a size and the variants that use it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids.
    pub async fn delete_size(&self, id: SizeId) -> Result<(), RepositoryError> {
        self.delete_by_id("sizes", id.as_i32(), "size").await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create_occasion(&self, input: &OccasionInput) -> Result<Occasion, RepositoryError> {
        let row = sqlx::query_as::<_, OccasionRow>(
            "INSERT INTO occasions (slug, name_en, name_ar) VALUES ($1, $2, $3) \
             RETURNING id, slug, name_en, name_ar",
        )
        .bind(&input.slug)
        .bind(&input.name_en)
        .bind(input.name_ar.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "occasion"))?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids and
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update_occasion(
        &self,
        id: OccasionId,
        input: &OccasionInput,
    ) -> Result<Occasion, RepositoryError> {
        let row = sqlx::query_as::<_, OccasionRow>(
            "UPDATE occasions SET slug = $2, name_en = $3, name_ar = $4 WHERE id = $1 \
             RETURNING id, slug, name_en, name_ar",
        )
        .bind(id)
        .bind(&input.slug)
        .bind(&input.name_en)
        .bind(input.name_ar.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "occasion"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids.
    pub async fn delete_occasion(&self, id: OccasionId) -> Result<(), RepositoryError> {
        self.delete_by_id("occasions", id.as_i32(), "occasion").await
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// List products of any status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &AdminProductFilter,
        page: Page,
    ) -> Result<Paginated<Product>, RepositoryError> {
        let where_sql = "($1::text IS NULL OR p.name_en ILIKE $1 OR p.name_ar ILIKE $1 \
                             OR p.sku ILIKE $1 OR p.slug ILIKE $1) \
                         AND ($2::int IS NULL OR p.category_id = $2) \
                         AND ($3::bool IS NULL OR p.is_active = $3)";
        let search = filter
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(like_pattern);

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products p WHERE {where_sql}"))
                .bind(search.as_deref())
                .bind(filter.category_id)
                .bind(filter.is_active)
                .fetch_one(self.pool)
                .await?;

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE {where_sql} \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(search.as_deref())
            .bind(filter.category_id)
            .bind(filter.is_active)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(Paginated::new(
            rows.into_iter().map(Into::into).collect(),
            page,
            total,
        ))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug or SKU is taken or the
    /// category does not exist.
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let sql = format!(
            "INSERT INTO products AS p (category_id, slug, sku, name_en, name_ar, description_en, \
                 description_ar, care_instructions, price, discount_price, discount_from, \
                 discount_to, image_url, is_active, is_featured) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = bind_product(sqlx::query_as::<_, ProductRow>(&sql), input)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "product"))?;

        Ok(row.into())
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids and
    /// `RepositoryError::Conflict` on slug, SKU or category problems.
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            "UPDATE products AS p SET category_id = $1, slug = $2, sku = $3, name_en = $4, \
                 name_ar = $5, description_en = $6, description_ar = $7, care_instructions = $8, \
                 price = $9, discount_price = $10, discount_from = $11, discount_to = $12, \
                 image_url = $13, is_active = $14, is_featured = $15 \
             WHERE p.id = $16 RETURNING {PRODUCT_COLUMNS}"
        );
        let row = bind_product(sqlx::query_as::<_, ProductRow>(&sql), input)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "product"))?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product with its variants and occasion tags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        self.delete_by_id("products", id.as_i32(), "product").await
    }

    /// Replace the occasions a product is tagged with.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an occasion does not exist.
    pub async fn set_product_occasions(
        &self,
        product_id: ProductId,
        occasion_ids: &[OccasionId],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM product_occasions WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO product_occasions (product_id, occasion_id) \
             SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
        )
        .bind(product_id)
        .bind(occasion_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "product occasion"))?;

        tx.commit().await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Variants
    // -------------------------------------------------------------------------

    /// Add a variant to a product and return its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the color and size combination
    /// exists already or a referenced row is missing.
    pub async fn create_attribute(
        &self,
        product_id: ProductId,
        input: &AttributeInput,
    ) -> Result<ProductAttributeId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO product_attributes (product_id, color_id, size_id, stock, price_adjustment) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(product_id)
        .bind(input.color_id)
        .bind(input.size_id)
        .bind(input.stock)
        .bind(input.price_adjustment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "variant"))?;

        Ok(ProductAttributeId::new(id))
    }

    /// Replace a variant's fields. The variant must belong to `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown variants.
    pub async fn update_attribute(
        &self,
        product_id: ProductId,
        id: ProductAttributeId,
        input: &AttributeInput,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE product_attributes SET color_id = $3, size_id = $4, stock = $5, \
                 price_adjustment = $6 \
             WHERE id = $1 AND product_id = $2",
        )
        .bind(id)
        .bind(product_id)
        .bind(input.color_id)
        .bind(input.size_id)
        .bind(input.stock)
        .bind(input.price_adjustment)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "variant"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a variant of `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown variants.
    pub async fn delete_attribute(
        &self,
        product_id: ProductId,
        id: ProductAttributeId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM product_attributes WHERE id = $1 AND product_id = $2")
                .bind(id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_id(&self, table: &str, id: i32, what: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, what))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Bind the product columns as `$1..$15`, in insert order.
fn bind_product<'q>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, ProductRow, sqlx::postgres::PgArguments>,
    input: &'q ProductInput,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, ProductRow, sqlx::postgres::PgArguments> {
    query
        .bind(input.category_id)
        .bind(&input.slug)
        .bind(input.sku.as_deref().filter(|s| !s.trim().is_empty()))
        .bind(&input.name_en)
        .bind(input.name_ar.as_deref())
        .bind(input.description_en.as_deref())
        .bind(input.description_ar.as_deref())
        .bind(input.care_instructions.as_deref())
        .bind(input.price)
        .bind(input.discount_price)
        .bind(input.discount_from)
        .bind(input.discount_to)
        .bind(input.image_url.as_deref())
        .bind(input.is_active)
        .bind(input.is_featured)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_input() -> ProductInput {
        serde_json::from_value(serde_json::json!({
            "category_id": 1,
            "slug": "white-orchid",
            "name_en": "White Orchid",
            "price": "150.00",
        }))
        .unwrap()
    }

    #[test]
    fn test_product_defaults() {
        let input = product_input();
        assert!(input.is_active);
        assert!(!input.is_featured);
        assert!(input.validate().is_ok());
        assert!(input.check().is_none());
    }

    #[test]
    fn test_discount_must_undercut_price() {
        let mut input = product_input();
        input.discount_price = Some("150.00".parse().unwrap());
        assert_eq!(input.check().map(|(field, _)| field), Some("discount_price"));

        input.discount_price = Some("120.00".parse().unwrap());
        assert!(input.check().is_none());
    }

    #[test]
    fn test_discount_window_order() {
        let mut input = product_input();
        let now = Utc::now();
        input.discount_from = Some(now);
        input.discount_to = Some(now - chrono::Duration::days(1));
        assert_eq!(input.check().map(|(field, _)| field), Some("discount_to"));
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut input = product_input();
        input.price = "-1".parse().unwrap();
        assert!(input.validate().unwrap_err().field_errors().contains_key("price"));
    }

    #[test]
    fn test_slug_and_hex_rules() {
        assert!(slug("spring-2026").is_ok());
        assert!(slug("Spring 2026").is_err());
        assert!(hex_color("#A1b2C3").is_ok());
        assert!(hex_color("A1B2C3").is_err());
        assert!(hex_color("#A1B2C").is_err());
    }
}
