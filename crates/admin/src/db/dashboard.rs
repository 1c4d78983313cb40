//! Dashboard aggregates.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use petal_storefront::db::OrderRepository;

use super::{Page, RepositoryError};
use crate::models::Order;

/// Variants at or below this stock count as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

/// Number of orders shown in the recent orders list.
pub const RECENT_ORDERS: i64 = 5;

/// Store-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, sqlx::FromRow)]
pub struct DashboardCounts {
    pub products: i64,
    pub active_products: i64,
    pub customers: i64,
    pub orders: i64,
    pub pending_orders: i64,
    pub low_stock_attributes: i64,
    pub pending_bookings: i64,
    pub upcoming_events: i64,
    /// Payments taken (completed, or refunded since) minus completed refunds.
    pub revenue: Decimal,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub counts: DashboardCounts,
    pub recent_orders: Vec<Order>,
}

/// Load the dashboard.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn load(pool: &PgPool) -> Result<Dashboard, RepositoryError> {
    let counts = sqlx::query_as::<_, DashboardCounts>(
        r"
        SELECT
            (SELECT COUNT(*) FROM products) AS products,
            (SELECT COUNT(*) FROM products WHERE is_active) AS active_products,
            (SELECT COUNT(*) FROM customers) AS customers,
            (SELECT COUNT(*) FROM orders) AS orders,
            (SELECT COUNT(*) FROM orders WHERE status = 'pending') AS pending_orders,
            (SELECT COUNT(*) FROM product_attributes WHERE stock <= $1) AS low_stock_attributes,
            (SELECT COUNT(*) FROM landscape_bookings WHERE status = 'pending') AS pending_bookings,
            (SELECT COUNT(*) FROM events
                WHERE is_active AND COALESCE(ends_at, starts_at) >= NOW()) AS upcoming_events,
            (SELECT COALESCE(SUM(amount), 0) FROM payments
                WHERE status IN ('completed', 'refunded')) AS revenue
        ",
    )
    .bind(LOW_STOCK_THRESHOLD)
    .fetch_one(pool)
    .await?;

    let recent_orders = OrderRepository::new(pool)
        .list(None, Page::new(Some(1), Some(RECENT_ORDERS)))
        .await?
        .data;

    Ok(Dashboard {
        counts,
        recent_orders,
    })
}
