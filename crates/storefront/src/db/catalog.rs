//! Catalog repository: categories, colors, sizes, occasions and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use petal_core::{
    CategoryId, ColorId, OccasionId, ProductAttributeId, ProductId, SizeId,
};

use super::{Page, Paginated, RepositoryError, like_pattern};
use crate::models::{
    Category, Color, Occasion, Product, ProductAttribute, ProductDetail, Size,
};

/// SQL expression for a product's current price (alias `p`).
pub const CURRENT_PRICE_SQL: &str = "CASE WHEN p.discount_price IS NOT NULL \
     AND (p.discount_from IS NULL OR p.discount_from <= NOW()) \
     AND (p.discount_to IS NULL OR p.discount_to >= NOW()) \
     THEN p.discount_price ELSE p.price END";

pub const PRODUCT_COLUMNS: &str = "p.id, p.category_id, p.slug, p.sku, p.name_en, p.name_ar, \
     p.description_en, p.description_ar, p.care_instructions, p.price, p.discount_price, \
     p.discount_from, p.discount_to, p.image_url, p.is_active, p.is_featured, \
     p.created_at, p.updated_at";

pub const ATTRIBUTE_SELECT: &str = "SELECT a.id, a.product_id, a.color_id, a.size_id, \
     a.stock, a.price_adjustment, c.name_en AS color_name, c.hex_code AS color_hex, \
     s.name_en AS size_name \
     FROM product_attributes a \
     LEFT JOIN colors c ON c.id = a.color_id \
     LEFT JOIN sizes s ON s.id = a.size_id";

// =============================================================================
// Row Types
// =============================================================================
//
// Shared with the admin service's write queries.

#[derive(Debug, sqlx::FromRow)]
pub struct CategoryRow {
    id: i32,
    slug: String,
    name_en: String,
    name_ar: Option<String>,
    description_en: Option<String>,
    description_ar: Option<String>,
    image_url: Option<String>,
    is_active: bool,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            slug: row.slug,
            name_en: row.name_en,
            name_ar: row.name_ar,
            description_en: row.description_en,
            description_ar: row.description_ar,
            image_url: row.image_url,
            is_active: row.is_active,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ColorRow {
    id: i32,
    name_en: String,
    name_ar: Option<String>,
    hex_code: String,
}

impl From<ColorRow> for Color {
    fn from(row: ColorRow) -> Self {
        Self {
            id: ColorId::new(row.id),
            name_en: row.name_en,
            name_ar: row.name_ar,
            hex_code: row.hex_code,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct SizeRow {
    id: i32,
    name_en: String,
    name_ar: Option<String>,
    sort_order: i32,
}

impl From<SizeRow> for Size {
    fn from(row: SizeRow) -> Self {
        Self {
            id: SizeId::new(row.id),
            name_en: row.name_en,
            name_ar: row.name_ar,
            sort_order: row.sort_order,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct OccasionRow {
    id: i32,
    slug: String,
    name_en: String,
    name_ar: Option<String>,
}

impl From<OccasionRow> for Occasion {
    fn from(row: OccasionRow) -> Self {
        Self {
            id: OccasionId::new(row.id),
            slug: row.slug,
            name_en: row.name_en,
            name_ar: row.name_ar,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
    id: i32,
    category_id: i32,
    slug: String,
    sku: Option<String>,
    name_en: String,
    name_ar: Option<String>,
    description_en: Option<String>,
    description_ar: Option<String>,
    care_instructions: Option<String>,
    price: Decimal,
    discount_price: Option<Decimal>,
    discount_from: Option<DateTime<Utc>>,
    discount_to: Option<DateTime<Utc>>,
    image_url: Option<String>,
    is_active: bool,
    is_featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            category_id: CategoryId::new(row.category_id),
            slug: row.slug,
            sku: row.sku,
            name_en: row.name_en,
            name_ar: row.name_ar,
            description_en: row.description_en,
            description_ar: row.description_ar,
            care_instructions: row.care_instructions,
            price: row.price,
            discount_price: row.discount_price,
            discount_from: row.discount_from,
            discount_to: row.discount_to,
            image_url: row.image_url,
            is_active: row.is_active,
            is_featured: row.is_featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct AttributeRow {
    id: i32,
    product_id: i32,
    color_id: Option<i32>,
    size_id: Option<i32>,
    stock: i32,
    price_adjustment: Decimal,
    color_name: Option<String>,
    color_hex: Option<String>,
    size_name: Option<String>,
}

impl From<AttributeRow> for ProductAttribute {
    fn from(row: AttributeRow) -> Self {
        Self {
            id: ProductAttributeId::new(row.id),
            product_id: ProductId::new(row.product_id),
            color_id: row.color_id.map(ColorId::new),
            size_id: row.size_id.map(SizeId::new),
            stock: row.stock,
            price_adjustment: row.price_adjustment,
            color_name: row.color_name,
            color_hex: row.color_hex,
            size_name: row.size_name,
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    Featured,
}

impl ProductSort {
    fn order_by(self) -> String {
        match self {
            Self::Newest => "p.created_at DESC, p.id DESC".to_string(),
            Self::Oldest => "p.created_at ASC, p.id ASC".to_string(),
            Self::PriceAsc => format!("{CURRENT_PRICE_SQL} ASC, p.id ASC"),
            Self::PriceDesc => format!("{CURRENT_PRICE_SQL} DESC, p.id DESC"),
            Self::NameAsc => "p.name_en ASC, p.id ASC".to_string(),
            Self::Featured => "p.is_featured DESC, p.created_at DESC, p.id DESC".to_string(),
        }
    }
}

/// Filters for the public product listing. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Category slug or numeric id.
    pub category: Option<String>,
    pub color: Option<ColorId>,
    pub size: Option<SizeId>,
    /// Occasion slug or numeric id.
    pub occasion: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Matched against names, descriptions and SKU.
    pub search: Option<String>,
    pub featured: Option<bool>,
    /// Restrict to products with at least one occasion.
    pub gifts_only: bool,
    pub sort: ProductSort,
}

/// WHERE clause shared by the listing and its count; binds $1..$10.
fn product_filter_sql() -> String {
    format!(
        "p.is_active \
         AND ($1::text IS NULL OR EXISTS (SELECT 1 FROM categories c \
              WHERE c.id = p.category_id AND c.is_active AND (c.slug = $1 OR c.id::text = $1))) \
         AND ($2::int IS NULL OR EXISTS (SELECT 1 FROM product_attributes a \
              WHERE a.product_id = p.id AND a.color_id = $2)) \
         AND ($3::int IS NULL OR EXISTS (SELECT 1 FROM product_attributes a \
              WHERE a.product_id = p.id AND a.size_id = $3)) \
         AND ($4::text IS NULL OR EXISTS (SELECT 1 FROM product_occasions po \
              JOIN occasions o ON o.id = po.occasion_id \
              WHERE po.product_id = p.id AND (o.slug = $4 OR o.id::text = $4))) \
         AND ($5::numeric IS NULL OR {CURRENT_PRICE_SQL} >= $5) \
         AND ($6::numeric IS NULL OR {CURRENT_PRICE_SQL} <= $6) \
         AND ($7::text IS NULL OR p.name_en ILIKE $7 OR p.name_ar ILIKE $7 \
              OR p.description_en ILIKE $7 OR p.description_ar ILIKE $7 OR p.sku ILIKE $7) \
         AND ($8::bool IS NULL OR p.is_featured = $8) \
         AND (NOT $9 OR EXISTS (SELECT 1 FROM product_occasions po WHERE po.product_id = p.id))"
    )
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, slug, name_en, name_ar, description_en, description_ar,
                   image_url, is_active, sort_order, created_at, updated_at
            FROM categories
            WHERE is_active
            ORDER BY sort_order, name_en
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get an active category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, slug, name_en, name_ar, description_en, description_ar,
                   image_url, is_active, sort_order, created_at, updated_at
            FROM categories
            WHERE slug = $1 AND is_active
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a category by id regardless of its active flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, slug, name_en, name_ar, description_en, description_ar,
                   image_url, is_active, sort_order, created_at, updated_at
            FROM categories
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List all colors.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_colors(&self) -> Result<Vec<Color>, RepositoryError> {
        let rows = sqlx::query_as::<_, ColorRow>(
            "SELECT id, name_en, name_ar, hex_code FROM colors ORDER BY name_en",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List all sizes in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_sizes(&self) -> Result<Vec<Size>, RepositoryError> {
        let rows = sqlx::query_as::<_, SizeRow>(
            "SELECT id, name_en, name_ar, sort_order FROM sizes ORDER BY sort_order, id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List all occasions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_occasions(&self) -> Result<Vec<Occasion>, RepositoryError> {
        let rows = sqlx::query_as::<_, OccasionRow>(
            "SELECT id, slug, name_en, name_ar FROM occasions ORDER BY name_en",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List active products matching `filter`, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<Paginated<Product>, RepositoryError> {
        let where_sql = product_filter_sql();
        let search = filter
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(like_pattern);

        let count_sql = format!("SELECT COUNT(*) FROM products p WHERE {where_sql}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.category.as_deref())
            .bind(filter.color.map(|c| c.as_i32()))
            .bind(filter.size.map(|s| s.as_i32()))
            .bind(filter.occasion.as_deref())
            .bind(filter.min_price)
            .bind(filter.max_price)
            .bind(search.as_deref())
            .bind(filter.featured)
            .bind(filter.gifts_only)
            .fetch_one(self.pool)
            .await?;

        let list_sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE {where_sql} \
             ORDER BY {} LIMIT $10 OFFSET $11",
            filter.sort.order_by()
        );
        let rows = sqlx::query_as::<_, ProductRow>(&list_sql)
            .bind(filter.category.as_deref())
            .bind(filter.color.map(|c| c.as_i32()))
            .bind(filter.size.map(|s| s.as_i32()))
            .bind(filter.occasion.as_deref())
            .bind(filter.min_price)
            .bind(filter.max_price)
            .bind(search.as_deref())
            .bind(filter.featured)
            .bind(filter.gifts_only)
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

    /// Get a product by id regardless of its active flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get an active product with its category, variants and occasions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn get_product_detail(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let Some(product) = self.get_product(id).await? else {
            return Ok(None);
        };
        if !product.is_active {
            return Ok(None);
        }

        let category = self.get_category(product.category_id).await?;
        let attributes = self.list_attributes(id).await?;
        let occasions = self.list_product_occasions(id).await?;

        Ok(Some(ProductDetail {
            product,
            category,
            attributes,
            occasions,
        }))
    }

    /// List the variants of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_attributes(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductAttribute>, RepositoryError> {
        let sql = format!("{ATTRIBUTE_SELECT} WHERE a.product_id = $1 ORDER BY s.sort_order, a.id");
        let rows = sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(product_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a single variant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_attribute(
        &self,
        id: ProductAttributeId,
    ) -> Result<Option<ProductAttribute>, RepositoryError> {
        let sql = format!("{ATTRIBUTE_SELECT} WHERE a.id = $1");
        let row = sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// List the occasions a product is tagged with.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_product_occasions(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Occasion>, RepositoryError> {
        let rows = sqlx::query_as::<_, OccasionRow>(
            r"
            SELECT o.id, o.slug, o.name_en, o.name_ar
            FROM occasions o
            JOIN product_occasions po ON po.occasion_id = o.id
            WHERE po.product_id = $1
            ORDER BY o.name_en
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Stock (transactional)
// =============================================================================

/// Lock a variant row and return its current stock.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the variant no longer exists.
pub async fn lock_attribute_stock(
    conn: &mut PgConnection,
    id: ProductAttributeId,
) -> Result<i32, RepositoryError> {
    let stock: i32 =
        sqlx::query_scalar("SELECT stock FROM product_attributes WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or(RepositoryError::NotFound)?;

    Ok(stock)
}

/// Add `delta` (negative to take stock) to a variant's stock.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if stock would go negative.
pub async fn adjust_stock(
    conn: &mut PgConnection,
    id: ProductAttributeId,
    delta: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE product_attributes SET stock = stock + $2 WHERE id = $1 AND stock + $2 >= 0",
    )
    .bind(id)
    .bind(delta)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(format!(
            "insufficient stock for variant {id}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_sql_binds_every_placeholder() {
        let sql = product_filter_sql();
        for n in 1..=9 {
            assert!(sql.contains(&format!("${n}")), "missing ${n}");
        }
        assert!(!sql.contains("$10"));
    }

    #[test]
    fn test_price_sorts_use_current_price() {
        assert!(ProductSort::PriceAsc.order_by().starts_with("CASE WHEN"));
        assert!(ProductSort::PriceDesc.order_by().contains("DESC"));
        assert_eq!(
            ProductSort::default().order_by(),
            "p.created_at DESC, p.id DESC"
        );
    }

    #[test]
    fn test_sort_deserializes_snake_case() {
        let sort: ProductSort = serde_json::from_str("\"price_asc\"").unwrap_or_default();
        assert_eq!(sort, ProductSort::PriceAsc);
    }
}
