//! Cart repository.
//!
//! Cart mutations always run inside a transaction owned by the cart service,
//! so most operations take a `PgConnection`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use petal_core::pricing::PriceSchedule;
use petal_core::{
    CartId, CartItemId, CustomerId, DiscountId, ProductAttributeId, ProductId, Totals,
};

use super::RepositoryError;
use crate::models::{Cart, CartItem};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i32,
    customer_id: Option<i32>,
    session_token: Option<Uuid>,
    discount_id: Option<i32>,
    subtotal: Decimal,
    tax: Decimal,
    shipping: Decimal,
    discount_amount: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: CartId::new(row.id),
            customer_id: row.customer_id.map(CustomerId::new),
            session_token: row.session_token,
            discount_id: row.discount_id.map(DiscountId::new),
            subtotal: row.subtotal,
            tax: row.tax,
            shipping: row.shipping,
            discount_amount: row.discount_amount,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    product_id: i32,
    product_attribute_id: Option<i32>,
    quantity: i32,
    unit_price: Decimal,
    total: Decimal,
    product_name: String,
    product_name_ar: Option<String>,
    product_slug: String,
    image_url: Option<String>,
    color_name: Option<String>,
    size_name: Option<String>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            product_id: ProductId::new(row.product_id),
            product_attribute_id: row.product_attribute_id.map(ProductAttributeId::new),
            quantity: row.quantity,
            unit_price: row.unit_price,
            total: row.total,
            product_name: row.product_name,
            product_name_ar: row.product_name_ar,
            product_slug: row.product_slug,
            image_url: row.image_url,
            color_name: row.color_name,
            size_name: row.size_name,
        }
    }
}

/// The pricing inputs of a cart line, as of now.
#[derive(Debug, sqlx::FromRow)]
struct PricingLineRow {
    item_id: i32,
    product_id: i32,
    product_attribute_id: Option<i32>,
    quantity: i32,
    unit_price: Decimal,
    price: Decimal,
    discount_price: Option<Decimal>,
    discount_from: Option<DateTime<Utc>>,
    discount_to: Option<DateTime<Utc>>,
    price_adjustment: Option<Decimal>,
    is_active: bool,
    stock: Option<i32>,
}

/// A cart line with the current price inputs of its product and variant.
#[derive(Debug, Clone)]
pub struct PricingLine {
    pub item_id: CartItemId,
    pub product_id: ProductId,
    pub product_attribute_id: Option<ProductAttributeId>,
    pub quantity: i32,
    /// Unit price stored on the line.
    pub unit_price: Decimal,
    pub schedule: PriceSchedule,
    pub price_adjustment: Decimal,
    pub product_active: bool,
    /// Variant stock; `None` for products without variants.
    pub stock: Option<i32>,
}

impl PricingLine {
    /// Unit price right now: the product's current price plus the variant
    /// adjustment, never negative.
    #[must_use]
    pub fn current_unit_price(&self, now: DateTime<Utc>) -> Decimal {
        (self.schedule.current_price(now) + self.price_adjustment).max(Decimal::ZERO)
    }
}

impl From<PricingLineRow> for PricingLine {
    fn from(row: PricingLineRow) -> Self {
        Self {
            item_id: CartItemId::new(row.item_id),
            product_id: ProductId::new(row.product_id),
            product_attribute_id: row.product_attribute_id.map(ProductAttributeId::new),
            quantity: row.quantity,
            unit_price: row.unit_price,
            schedule: PriceSchedule {
                price: row.price,
                discount_price: row.discount_price,
                discount_from: row.discount_from,
                discount_to: row.discount_to,
            },
            price_adjustment: row.price_adjustment.unwrap_or_default(),
            product_active: row.is_active,
            stock: row.stock,
        }
    }
}

const CART_COLUMNS: &str = "id, customer_id, session_token, discount_id, subtotal, tax, \
     shipping, discount_amount, total, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart reads outside a transaction.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the cart of a logged-in customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Cart>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        find_by_customer(&mut conn, customer_id).await
    }

    /// Get a guest cart by its session token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_token(&self, token: Uuid) -> Result<Option<Cart>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        find_by_token(&mut conn, token).await
    }

    /// List the lines of a cart with product display fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        list_items(&mut conn, cart_id).await
    }
}

/// Get the cart of a logged-in customer.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_customer(
    conn: &mut PgConnection,
    customer_id: CustomerId,
) -> Result<Option<Cart>, RepositoryError> {
    let sql = format!("SELECT {CART_COLUMNS} FROM carts WHERE customer_id = $1");
    let row = sqlx::query_as::<_, CartRow>(&sql)
        .bind(customer_id)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Into::into))
}

/// Get a guest cart by its session token.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_token(
    conn: &mut PgConnection,
    token: Uuid,
) -> Result<Option<Cart>, RepositoryError> {
    let sql = format!("SELECT {CART_COLUMNS} FROM carts WHERE session_token = $1");
    let row = sqlx::query_as::<_, CartRow>(&sql)
        .bind(token)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Into::into))
}

/// Lock a cart row for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the cart no longer exists.
pub async fn lock(conn: &mut PgConnection, id: CartId) -> Result<Cart, RepositoryError> {
    let sql = format!("SELECT {CART_COLUMNS} FROM carts WHERE id = $1 FOR UPDATE");
    let row = sqlx::query_as::<_, CartRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    Ok(row.into())
}

/// Create an empty cart owned by a customer or a guest token.
///
/// Concurrent creation for the same owner is resolved by returning the
/// existing row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn create(
    conn: &mut PgConnection,
    customer_id: Option<CustomerId>,
    session_token: Option<Uuid>,
) -> Result<Cart, RepositoryError> {
    let sql = format!(
        "INSERT INTO carts (customer_id, session_token) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING RETURNING {CART_COLUMNS}"
    );
    let row = sqlx::query_as::<_, CartRow>(&sql)
        .bind(customer_id)
        .bind(session_token)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(row) = row {
        return Ok(row.into());
    }

    let existing = match (customer_id, session_token) {
        (Some(customer_id), _) => find_by_customer(conn, customer_id).await?,
        (None, Some(token)) => find_by_token(conn, token).await?,
        (None, None) => None,
    };
    existing.ok_or_else(|| RepositoryError::Conflict("cart owner is required".to_string()))
}

/// Hand a guest cart over to a customer.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the customer already owns a cart.
pub async fn assign_to_customer(
    conn: &mut PgConnection,
    cart_id: CartId,
    customer_id: CustomerId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE carts SET customer_id = $2, session_token = NULL WHERE id = $1")
        .bind(cart_id)
        .bind(customer_id)
        .execute(conn)
        .await
        .map_err(|e| RepositoryError::from_write(e, "customer cart"))?;
    Ok(())
}

/// List the lines of a cart with product display fields.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_items(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<CartItem>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartItemRow>(
        r"
        SELECT ci.id, ci.cart_id, ci.product_id, ci.product_attribute_id, ci.quantity,
               ci.unit_price, ci.total,
               p.name_en AS product_name, p.name_ar AS product_name_ar,
               p.slug AS product_slug, p.image_url,
               c.name_en AS color_name, s.name_en AS size_name
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        LEFT JOIN product_attributes a ON a.id = ci.product_attribute_id
        LEFT JOIN colors c ON c.id = a.color_id
        LEFT JOIN sizes s ON s.id = a.size_id
        WHERE ci.cart_id = $1
        ORDER BY ci.created_at, ci.id
        ",
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// List the lines of a cart with their current pricing inputs.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_pricing_lines(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<PricingLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, PricingLineRow>(
        r"
        SELECT ci.id AS item_id, ci.product_id, ci.product_attribute_id, ci.quantity,
               ci.unit_price, p.price, p.discount_price, p.discount_from, p.discount_to,
               a.price_adjustment, p.is_active, a.stock
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        LEFT JOIN product_attributes a ON a.id = ci.product_attribute_id
        WHERE ci.cart_id = $1
        ORDER BY ci.id
        ",
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Find the line for a product/variant pair.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_line(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
    attribute_id: Option<ProductAttributeId>,
) -> Result<Option<(CartItemId, i32)>, RepositoryError> {
    let row: Option<(i32, i32)> = sqlx::query_as(
        r"
        SELECT id, quantity FROM cart_items
        WHERE cart_id = $1 AND product_id = $2
          AND product_attribute_id IS NOT DISTINCT FROM $3
        ",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(attribute_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(|(id, qty)| (CartItemId::new(id), qty)))
}

/// Get the product, variant and quantity of a line in this cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_line(
    conn: &mut PgConnection,
    cart_id: CartId,
    item_id: CartItemId,
) -> Result<Option<(ProductId, Option<ProductAttributeId>, i32)>, RepositoryError> {
    let row: Option<(i32, Option<i32>, i32)> = sqlx::query_as(
        r"
        SELECT product_id, product_attribute_id, quantity FROM cart_items
        WHERE id = $1 AND cart_id = $2
        ",
    )
    .bind(item_id)
    .bind(cart_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(|(product, attr, qty)| {
        (
            ProductId::new(product),
            attr.map(ProductAttributeId::new),
            qty,
        )
    }))
}

/// Insert a new line.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_item(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
    attribute_id: Option<ProductAttributeId>,
    quantity: i32,
    unit_price: Decimal,
) -> Result<CartItemId, RepositoryError> {
    let id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO cart_items (cart_id, product_id, product_attribute_id, quantity, unit_price, total)
        VALUES ($1, $2, $3, $4, $5, ROUND($5 * $4, 2))
        RETURNING id
        ",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(attribute_id)
    .bind(quantity)
    .bind(unit_price)
    .fetch_one(conn)
    .await
    .map_err(|e| RepositoryError::from_write(e, "cart line"))?;

    Ok(CartItemId::new(id))
}

/// Set a line's quantity and price.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the line is not in this cart.
pub async fn update_item(
    conn: &mut PgConnection,
    cart_id: CartId,
    item_id: CartItemId,
    quantity: i32,
    unit_price: Decimal,
    total: Decimal,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE cart_items SET quantity = $3, unit_price = $4, total = $5
        WHERE id = $1 AND cart_id = $2
        ",
    )
    .bind(item_id)
    .bind(cart_id)
    .bind(quantity)
    .bind(unit_price)
    .bind(total)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the line is not in this cart.
pub async fn delete_item(
    conn: &mut PgConnection,
    cart_id: CartId,
    item_id: CartItemId,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
        .bind(item_id)
        .bind(cart_id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Remove every line.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn clear_items(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Attach or detach a discount code.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_discount(
    conn: &mut PgConnection,
    cart_id: CartId,
    discount_id: Option<DiscountId>,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE carts SET discount_id = $2 WHERE id = $1")
        .bind(cart_id)
        .bind(discount_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Persist recomputed totals.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn save_totals(
    conn: &mut PgConnection,
    cart_id: CartId,
    totals: &Totals,
) -> Result<Cart, RepositoryError> {
    let sql = format!(
        "UPDATE carts SET subtotal = $2, tax = $3, shipping = $4, discount_amount = $5, total = $6 \
         WHERE id = $1 RETURNING {CART_COLUMNS}"
    );
    let row = sqlx::query_as::<_, CartRow>(&sql)
        .bind(cart_id)
        .bind(totals.subtotal)
        .bind(totals.tax)
        .bind(totals.shipping)
        .bind(totals.discount)
        .bind(totals.total)
        .fetch_optional(conn)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    Ok(row.into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_line_current_unit_price() {
        let now = Utc::now();
        let line = PricingLine {
            item_id: CartItemId::new(1),
            product_id: ProductId::new(1),
            product_attribute_id: None,
            quantity: 2,
            unit_price: "10".parse().unwrap(),
            schedule: PriceSchedule {
                price: "50.00".parse().unwrap(),
                discount_price: Some("40.00".parse().unwrap()),
                discount_from: None,
                discount_to: None,
            },
            price_adjustment: "5.50".parse().unwrap(),
            product_active: true,
            stock: None,
        };
        assert_eq!(
            line.current_unit_price(now),
            "45.50".parse::<Decimal>().unwrap()
        );
    }
}
