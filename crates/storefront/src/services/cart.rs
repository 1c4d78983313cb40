//! Cart use cases.
//!
//! Every mutation runs in one transaction that locks the cart row, applies
//! the change and then calls [`recalculate`], so persisted totals always
//! match the lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use petal_core::discount::normalize_code;
use petal_core::pricing::line_total;
use petal_core::{
    CartId, CartItemId, CustomerId, DiscountError, PricingConfig, ProductAttributeId, ProductId,
    Totals,
};

use crate::db::carts::{self, PricingLine};
use crate::db::{CatalogRepository, DiscountRepository, RepositoryError, discounts};
use crate::models::{Cart, CartView};

/// Largest quantity of one line.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("this product is not available")]
    ProductUnavailable,

    #[error("please choose a color or size for this product")]
    VariantRequired,

    #[error("the selected option does not belong to this product")]
    VariantMismatch,

    #[error("only {available} left in stock")]
    InsufficientStock { available: i32 },

    #[error("quantity must be between 1 and {MAX_LINE_QUANTITY}")]
    InvalidQuantity,

    #[error("cart item not found")]
    ItemNotFound,

    #[error("invalid discount code")]
    UnknownDiscountCode,

    #[error(transparent)]
    Discount(#[from] DiscountError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CartError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(err.into())
    }
}

/// Who a cart belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOwner {
    Customer(CustomerId),
    /// A guest, identified by the token kept in their session.
    Guest(Uuid),
}

impl CartOwner {
    #[must_use]
    pub const fn customer_id(self) -> Option<CustomerId> {
        match self {
            Self::Customer(id) => Some(id),
            Self::Guest(_) => None,
        }
    }
}

/// Cart service.
pub struct CartService<'a> {
    pool: &'a PgPool,
    pricing: PricingConfig,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, pricing: PricingConfig) -> Self {
        Self { pool, pricing }
    }

    /// The owner's cart, creating an empty one if needed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database fails.
    pub async fn view(&self, owner: CartOwner) -> Result<CartView, CartError> {
        let mut conn = self.pool.acquire().await?;
        let cart = get_or_create(&mut conn, owner).await?;
        Ok(load_view(&mut conn, cart).await?)
    }

    /// Add a product (or more of it) to the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductUnavailable` for missing or inactive
    /// products, `CartError::VariantRequired`/`VariantMismatch` for a bad
    /// variant choice and `CartError::InsufficientStock` when stock is short.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        owner: CartOwner,
        product_id: ProductId,
        attribute_id: Option<ProductAttributeId>,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        check_quantity(quantity)?;

        let catalog = CatalogRepository::new(self.pool);
        let product = catalog
            .get_product(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(CartError::ProductUnavailable)?;

        let now = Utc::now();
        let (unit_price, stock) = match attribute_id {
            Some(attribute_id) => {
                let attribute = catalog
                    .get_attribute(attribute_id)
                    .await?
                    .ok_or(CartError::VariantMismatch)?;
                if attribute.product_id != product_id {
                    return Err(CartError::VariantMismatch);
                }
                (
                    attribute.unit_price(product.current_price(now)),
                    Some(attribute.stock),
                )
            }
            None => {
                if !catalog.list_attributes(product_id).await?.is_empty() {
                    return Err(CartError::VariantRequired);
                }
                (product.current_price(now), None)
            }
        };

        let mut tx = self.pool.begin().await?;
        let cart = get_or_create(&mut *tx, owner).await?;
        carts::lock(&mut *tx, cart.id).await?;

        match carts::find_line(&mut *tx, cart.id, product_id, attribute_id).await? {
            Some((item_id, existing)) => {
                let quantity = existing + quantity;
                check_quantity(quantity)?;
                check_stock(stock, quantity)?;
                carts::update_item(
                    &mut *tx,
                    cart.id,
                    item_id,
                    quantity,
                    unit_price,
                    line_total(unit_price, quantity),
                )
                .await?;
            }
            None => {
                check_stock(stock, quantity)?;
                carts::insert_item(&mut *tx, cart.id, product_id, attribute_id, quantity, unit_price)
                    .await?;
            }
        }

        let cart = recalculate(&mut *tx, cart.id, owner.customer_id(), &self.pricing).await?;
        let view = load_view(&mut *tx, cart).await?;
        tx.commit().await?;

        info!(cart_id = %view.cart.id, product_id = %product_id, quantity, "Added to cart");
        Ok(view)
    }

    /// Set the quantity of a line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the line is not in the owner's
    /// cart and `CartError::InsufficientStock` when stock is short.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        owner: CartOwner,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        check_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;
        let cart = get_or_create(&mut *tx, owner).await?;
        carts::lock(&mut *tx, cart.id).await?;

        let (product_id, attribute_id, _) = carts::get_line(&mut *tx, cart.id, item_id)
            .await?
            .ok_or(CartError::ItemNotFound)?;

        let catalog = CatalogRepository::new(self.pool);
        let product = catalog
            .get_product(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(CartError::ProductUnavailable)?;

        let now = Utc::now();
        let (unit_price, stock) = match attribute_id {
            Some(attribute_id) => {
                let attribute = catalog
                    .get_attribute(attribute_id)
                    .await?
                    .ok_or(CartError::ProductUnavailable)?;
                (
                    attribute.unit_price(product.current_price(now)),
                    Some(attribute.stock),
                )
            }
            None => (product.current_price(now), None),
        };
        check_stock(stock, quantity)?;

        carts::update_item(
            &mut *tx,
            cart.id,
            item_id,
            quantity,
            unit_price,
            line_total(unit_price, quantity),
        )
        .await
        .map_err(not_found_as_item)?;

        let cart = recalculate(&mut *tx, cart.id, owner.customer_id(), &self.pricing).await?;
        let view = load_view(&mut *tx, cart).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the line is not in the owner's
    /// cart.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        owner: CartOwner,
        item_id: CartItemId,
    ) -> Result<CartView, CartError> {
        let mut tx = self.pool.begin().await?;
        let cart = get_or_create(&mut *tx, owner).await?;
        carts::lock(&mut *tx, cart.id).await?;

        carts::delete_item(&mut *tx, cart.id, item_id)
            .await
            .map_err(not_found_as_item)?;

        let cart = recalculate(&mut *tx, cart.id, owner.customer_id(), &self.pricing).await?;
        let view = load_view(&mut *tx, cart).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Remove every line and any applied discount.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database fails.
    #[instrument(skip(self))]
    pub async fn clear(&self, owner: CartOwner) -> Result<CartView, CartError> {
        let mut tx = self.pool.begin().await?;
        let cart = get_or_create(&mut *tx, owner).await?;
        carts::lock(&mut *tx, cart.id).await?;

        carts::clear_items(&mut *tx, cart.id).await?;
        carts::set_discount(&mut *tx, cart.id, None).await?;

        let cart = recalculate(&mut *tx, cart.id, owner.customer_id(), &self.pricing).await?;
        let view = load_view(&mut *tx, cart).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Attach a discount code after validating it against the current
    /// subtotal. Usage is only recorded at checkout.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownDiscountCode` for unknown codes and
    /// `CartError::Discount` when the code cannot be applied.
    #[instrument(skip(self))]
    pub async fn apply_discount(&self, owner: CartOwner, code: &str) -> Result<CartView, CartError> {
        let code = normalize_code(code);
        let discount = DiscountRepository::new(self.pool)
            .get_by_code(&code)
            .await?
            .ok_or(CartError::UnknownDiscountCode)?;

        let mut tx = self.pool.begin().await?;
        let cart = get_or_create(&mut *tx, owner).await?;
        carts::lock(&mut *tx, cart.id).await?;

        let cart = recalculate(&mut *tx, cart.id, owner.customer_id(), &self.pricing).await?;
        let uses = match owner.customer_id() {
            Some(customer_id) => {
                Some(discounts::customer_usage_count(&mut *tx, discount.id, customer_id).await?)
            }
            None => None,
        };
        discount.rule().validate(cart.subtotal, uses, Utc::now())?;

        carts::set_discount(&mut *tx, cart.id, Some(discount.id)).await?;
        let cart = recalculate(&mut *tx, cart.id, owner.customer_id(), &self.pricing).await?;
        let view = load_view(&mut *tx, cart).await?;
        tx.commit().await?;

        info!(cart_id = %view.cart.id, code = %code, "Discount applied");
        Ok(view)
    }

    /// Detach the discount code.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database fails.
    pub async fn remove_discount(&self, owner: CartOwner) -> Result<CartView, CartError> {
        let mut tx = self.pool.begin().await?;
        let cart = get_or_create(&mut *tx, owner).await?;
        carts::lock(&mut *tx, cart.id).await?;

        carts::set_discount(&mut *tx, cart.id, None).await?;
        let cart = recalculate(&mut *tx, cart.id, owner.customer_id(), &self.pricing).await?;
        let view = load_view(&mut *tx, cart).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Give a guest cart to a customer who just logged in, unless they
    /// already have one.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database fails.
    pub async fn adopt_guest_cart(
        &self,
        customer_id: CustomerId,
        token: Uuid,
    ) -> Result<(), CartError> {
        let mut tx = self.pool.begin().await?;

        if carts::find_by_customer(&mut *tx, customer_id).await?.is_some() {
            return Ok(());
        }
        let Some(guest) = carts::find_by_token(&mut *tx, token).await? else {
            return Ok(());
        };

        carts::lock(&mut *tx, guest.id).await?;
        carts::assign_to_customer(&mut *tx, guest.id, customer_id).await?;
        recalculate(&mut *tx, guest.id, Some(customer_id), &self.pricing).await?;
        tx.commit().await?;

        info!(cart_id = %guest.id, customer_id = %customer_id, "Guest cart adopted");
        Ok(())
    }
}

/// The owner's cart, created empty if missing.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_or_create(conn: &mut PgConnection, owner: CartOwner) -> Result<Cart, RepositoryError> {
    let existing = match owner {
        CartOwner::Customer(id) => carts::find_by_customer(conn, id).await?,
        CartOwner::Guest(token) => carts::find_by_token(conn, token).await?,
    };
    if let Some(cart) = existing {
        return Ok(cart);
    }

    match owner {
        CartOwner::Customer(id) => carts::create(conn, Some(id), None).await,
        CartOwner::Guest(token) => carts::create(conn, None, Some(token)).await,
    }
}

async fn load_view(conn: &mut PgConnection, cart: Cart) -> Result<CartView, RepositoryError> {
    let items = carts::list_items(conn, cart.id).await?;
    let code = match cart.discount_id {
        Some(id) => discounts::get_by_id(conn, id).await?.map(|d| d.code),
        None => None,
    };
    Ok(CartView::new(cart, code, items))
}

/// What re-pricing a line requires.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineAction {
    Keep { total: Decimal },
    Reprice { unit_price: Decimal, total: Decimal },
    Remove,
}

fn plan_line(line: &PricingLine, now: DateTime<Utc>) -> LineAction {
    if !line.product_active {
        return LineAction::Remove;
    }

    let unit_price = line.current_unit_price(now);
    let total = line_total(unit_price, line.quantity);
    if unit_price == line.unit_price {
        LineAction::Keep { total }
    } else {
        LineAction::Reprice { unit_price, total }
    }
}

/// Re-price every line, drop lines of inactive products, re-validate the
/// discount (dropping it when no longer valid) and persist the totals.
///
/// Call with the cart row locked.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any statement fails.
pub async fn recalculate(
    conn: &mut PgConnection,
    cart_id: CartId,
    customer_id: Option<CustomerId>,
    pricing: &PricingConfig,
) -> Result<Cart, RepositoryError> {
    let now = Utc::now();
    let lines = carts::list_pricing_lines(conn, cart_id).await?;

    let mut line_totals = Vec::with_capacity(lines.len());
    for line in &lines {
        match plan_line(line, now) {
            LineAction::Keep { total } => line_totals.push(total),
            LineAction::Reprice { unit_price, total } => {
                carts::update_item(conn, cart_id, line.item_id, line.quantity, unit_price, total)
                    .await?;
                line_totals.push(total);
            }
            LineAction::Remove => {
                debug!(item_id = %line.item_id, "Dropping line of inactive product");
                carts::delete_item(conn, cart_id, line.item_id).await?;
            }
        }
    }

    let subtotal = Totals::compute(line_totals, Decimal::ZERO, pricing).subtotal;
    let cart = carts::lock(conn, cart_id).await?;

    let mut discount = Decimal::ZERO;
    if let Some(discount_id) = cart.discount_id {
        let applied = match discounts::get_by_id(conn, discount_id).await? {
            Some(found) => {
                let uses = match customer_id {
                    Some(customer_id) => {
                        Some(discounts::customer_usage_count(conn, discount_id, customer_id).await?)
                    }
                    None => None,
                };
                found.rule().redeem(subtotal, uses, now).ok()
            }
            None => None,
        };

        match applied {
            Some(amount) => discount = amount,
            None => {
                debug!(cart_id = %cart_id, "Dropping discount that no longer applies");
                carts::set_discount(conn, cart_id, None).await?;
            }
        }
    }

    let totals = Totals::from_subtotal(subtotal, discount, pricing);
    carts::save_totals(conn, cart_id, &totals).await
}

fn check_quantity(quantity: i32) -> Result<(), CartError> {
    if quantity < 1 || quantity > MAX_LINE_QUANTITY {
        return Err(CartError::InvalidQuantity);
    }
    Ok(())
}

/// `stock` is `None` for products without variants, which never run out.
fn check_stock(stock: Option<i32>, quantity: i32) -> Result<(), CartError> {
    match stock {
        Some(available) if available < quantity => {
            Err(CartError::InsufficientStock { available: available.max(0) })
        }
        _ => Ok(()),
    }
}

fn not_found_as_item(err: RepositoryError) -> CartError {
    match err {
        RepositoryError::NotFound => CartError::ItemNotFound,
        other => CartError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petal_core::pricing::PriceSchedule;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(unit_price: &str, quantity: i32) -> PricingLine {
        PricingLine {
            item_id: CartItemId::new(1),
            product_id: ProductId::new(1),
            product_attribute_id: None,
            quantity,
            unit_price: dec(unit_price),
            schedule: PriceSchedule {
                price: dec("40.00"),
                discount_price: None,
                discount_from: None,
                discount_to: None,
            },
            price_adjustment: Decimal::ZERO,
            product_active: true,
            stock: None,
        }
    }

    #[test]
    fn test_plan_line_keeps_current_price() {
        let action = plan_line(&line("40.00", 3), Utc::now());
        assert_eq!(action, LineAction::Keep { total: dec("120.00") });
    }

    #[test]
    fn test_plan_line_reprices_changed_price() {
        let mut stale = line("35.00", 2);
        stale.price_adjustment = dec("5.50");
        let action = plan_line(&stale, Utc::now());
        assert_eq!(
            action,
            LineAction::Reprice {
                unit_price: dec("45.50"),
                total: dec("91.00")
            }
        );
    }

    #[test]
    fn test_plan_line_removes_inactive_product() {
        let mut inactive = line("40.00", 1);
        inactive.product_active = false;
        assert_eq!(plan_line(&inactive, Utc::now()), LineAction::Remove);
    }

    #[test]
    fn test_check_stock() {
        assert!(check_stock(None, 500).is_ok());
        assert!(check_stock(Some(3), 3).is_ok());
        assert!(matches!(
            check_stock(Some(2), 3),
            Err(CartError::InsufficientStock { available: 2 })
        ));
    }

    #[test]
    fn test_check_quantity() {
        assert!(check_quantity(1).is_ok());
        assert!(check_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(check_quantity(0).is_err());
        assert!(check_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_owner_customer_id() {
        let customer = CartOwner::Customer(CustomerId::new(4));
        assert_eq!(customer.customer_id(), Some(CustomerId::new(4)));
        assert_eq!(CartOwner::Guest(Uuid::nil()).customer_id(), None);
    }
}
