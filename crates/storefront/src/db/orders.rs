//! Order repository.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use petal_core::{
    CustomerId, DiscountId, OrderId, OrderItemId, OrderPaymentStatus, OrderStatus, PaymentMethod,
    ProductAttributeId, ProductId, Totals,
};

use super::payments::list_for_order;
use super::{Page, Paginated, RepositoryError};
use crate::models::{Order, OrderDetail, OrderItem};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    customer_id: i32,
    status: OrderStatus,
    payment_status: OrderPaymentStatus,
    payment_method: PaymentMethod,
    discount_id: Option<i32>,
    subtotal: Decimal,
    tax: Decimal,
    shipping: Decimal,
    discount_amount: Decimal,
    total: Decimal,
    shipping_name: String,
    shipping_phone: String,
    shipping_address: String,
    shipping_city: String,
    notes: Option<String>,
    delivery_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            customer_id: CustomerId::new(row.customer_id),
            status: row.status,
            payment_status: row.payment_status,
            payment_method: row.payment_method,
            discount_id: row.discount_id.map(DiscountId::new),
            subtotal: row.subtotal,
            tax: row.tax,
            shipping: row.shipping,
            discount_amount: row.discount_amount,
            total: row.total,
            shipping_name: row.shipping_name,
            shipping_phone: row.shipping_phone,
            shipping_address: row.shipping_address,
            shipping_city: row.shipping_city,
            notes: row.notes,
            delivery_date: row.delivery_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: Option<i32>,
    product_attribute_id: Option<i32>,
    product_name: String,
    color_name: Option<String>,
    size_name: Option<String>,
    quantity: i32,
    unit_price: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: row.product_id.map(ProductId::new),
            product_attribute_id: row.product_attribute_id.map(ProductAttributeId::new),
            product_name: row.product_name,
            color_name: row.color_name,
            size_name: row.size_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total: row.total,
            created_at: row.created_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_number, customer_id, status, payment_status, \
     payment_method, discount_id, subtotal, tax, shipping, discount_amount, total, \
     shipping_name, shipping_phone, shipping_address, shipping_city, notes, delivery_date, \
     created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, product_attribute_id, product_name, \
     color_name, size_name, quantity, unit_price, total, created_at";

/// Everything needed to insert an order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub customer_id: CustomerId,
    pub payment_method: PaymentMethod,
    pub discount_id: Option<DiscountId>,
    pub totals: Totals,
    pub shipping_name: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub notes: Option<String>,
    pub delivery_date: Option<NaiveDate>,
}

/// A snapshot of one purchased line.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_attribute_id: Option<ProductAttributeId>,
    pub product_name: String,
    pub color_name: Option<String>,
    pub size_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
        page: Page,
    ) -> Result<Paginated<Order>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(self.pool)
            .await?;

        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(customer_id)
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

    /// List all orders, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        page: Page,
    ) -> Result<Paginated<Order>, RepositoryError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE ($1::order_status IS NULL OR status = $1)")
                .bind(status)
                .fetch_one(self.pool)
                .await?;

        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE ($1::order_status IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(status)
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

    /// Get an order with its items and payments.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn get_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = get(&mut conn, id).await? else {
            return Ok(None);
        };
        let items = list_items(&mut conn, id).await?;
        let payments = list_for_order(&mut conn, id).await?;

        Ok(Some(OrderDetail {
            order,
            items,
            payments,
        }))
    }

    /// Get an order with its items and payments, only if it belongs to the
    /// customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn get_detail_for_customer(
        &self,
        id: OrderId,
        customer_id: CustomerId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        Ok(self
            .get_detail(id)
            .await?
            .filter(|detail| detail.order.customer_id == customer_id))
    }

    /// Delete an order and its items, payments and discount usages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Get an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>, RepositoryError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Into::into))
}

/// Lock an order row for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order does not exist.
pub async fn lock(conn: &mut PgConnection, id: OrderId) -> Result<Order, RepositoryError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    Ok(row.into())
}

/// List the items of an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_items(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<OrderItem>, RepositoryError> {
    let sql = format!("SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
    let rows = sqlx::query_as::<_, OrderItemRow>(&sql)
        .bind(order_id)
        .fetch_all(conn)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Insert an order row.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` on an order number collision.
pub async fn insert(conn: &mut PgConnection, order: &NewOrder) -> Result<Order, RepositoryError> {
    let sql = format!(
        "INSERT INTO orders (order_number, customer_id, payment_method, discount_id, \
             subtotal, tax, shipping, discount_amount, total, shipping_name, shipping_phone, \
             shipping_address, shipping_city, notes, delivery_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
         RETURNING {ORDER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(&order.order_number)
        .bind(order.customer_id)
        .bind(order.payment_method)
        .bind(order.discount_id)
        .bind(order.totals.subtotal)
        .bind(order.totals.tax)
        .bind(order.totals.shipping)
        .bind(order.totals.discount)
        .bind(order.totals.total)
        .bind(&order.shipping_name)
        .bind(&order.shipping_phone)
        .bind(&order.shipping_address)
        .bind(&order.shipping_city)
        .bind(order.notes.as_deref())
        .bind(order.delivery_date)
        .fetch_one(conn)
        .await
        .map_err(|e| RepositoryError::from_write(e, "order number"))?;

    Ok(row.into())
}

/// Insert an order line snapshot.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_item(
    conn: &mut PgConnection,
    order_id: OrderId,
    item: &NewOrderItem,
) -> Result<OrderItem, RepositoryError> {
    let sql = format!(
        "INSERT INTO order_items (order_id, product_id, product_attribute_id, product_name, \
             color_name, size_name, quantity, unit_price, total) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {ORDER_ITEM_COLUMNS}"
    );
    let row = sqlx::query_as::<_, OrderItemRow>(&sql)
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.product_attribute_id)
        .bind(&item.product_name)
        .bind(item.color_name.as_deref())
        .bind(item.size_name.as_deref())
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total)
        .fetch_one(conn)
        .await?;

    Ok(row.into())
}

/// Set an order's fulfilment status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
) -> Result<Order, RepositoryError> {
    let sql = format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .bind(status)
        .fetch_optional(conn)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    Ok(row.into())
}

/// Set an order's derived payment status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_payment_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderPaymentStatus,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE orders SET payment_status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(conn)
        .await?;
    Ok(())
}
