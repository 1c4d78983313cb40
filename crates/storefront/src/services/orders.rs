//! Order fulfilment transitions.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use petal_core::{OrderId, OrderStatus, TransitionError};

use crate::db::{OrderRepository, RepositoryError, catalog, orders};
use crate::models::Order;

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

/// Order service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Move an order along its lifecycle. Cancelling puts the ordered
    /// quantities back into stock.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for unknown orders and
    /// `OrderError::Transition` for moves the lifecycle forbids.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, next: OrderStatus) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;
        let current = orders::lock(&mut *tx, id).await.map_err(|e| match e {
            RepositoryError::NotFound => OrderError::NotFound,
            other => OrderError::Repository(other),
        })?;

        current.status.transition_to(next)?;

        if next == OrderStatus::Cancelled {
            let mut items = orders::list_items(&mut *tx, id).await?;
            items.sort_by_key(|item| item.product_attribute_id);

            for item in &items {
                let Some(attribute_id) = item.product_attribute_id else {
                    continue;
                };
                match catalog::adjust_stock(&mut *tx, attribute_id, item.quantity).await {
                    Ok(()) => {}
                    // The variant was deleted after the order was placed.
                    Err(RepositoryError::Conflict(_)) => {
                        warn!(attribute_id = %attribute_id, "Cannot restore stock of missing variant");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        let order = orders::set_status(&mut *tx, id, next).await?;
        tx.commit().await?;

        info!(order_id = %id, from = %current.status, to = %next, "Order status changed");
        Ok(order)
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for unknown orders.
    pub async fn delete(&self, id: OrderId) -> Result<(), OrderError> {
        OrderRepository::new(self.pool).delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => OrderError::NotFound,
            other => OrderError::Repository(other),
        })?;
        info!(order_id = %id, "Order deleted");
        Ok(())
    }
}
