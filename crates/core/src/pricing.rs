//! Price and totals rules.
//!
//! All money is `rust_decimal::Decimal` in the store currency, rounded to two
//! places with midpoints away from zero.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round a money amount to two decimal places.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether `now` falls inside an optional `[from, to]` window.
///
/// A missing bound leaves that side of the window open.
#[must_use]
pub fn within_window(
    now: DateTime<Utc>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    from.is_none_or(|from| now >= from) && to.is_none_or(|to| now <= to)
}

/// The price inputs of a product, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSchedule {
    /// List price.
    pub price: Decimal,
    /// Sale price, when one is configured.
    pub discount_price: Option<Decimal>,
    /// Start of the sale window.
    pub discount_from: Option<DateTime<Utc>>,
    /// End of the sale window.
    pub discount_to: Option<DateTime<Utc>>,
}

impl PriceSchedule {
    /// Whether the sale price applies at `now`.
    #[must_use]
    pub fn is_discounted_at(&self, now: DateTime<Utc>) -> bool {
        self.discount_price.is_some() && within_window(now, self.discount_from, self.discount_to)
    }

    /// The effective price at `now`: the sale price inside its window,
    /// otherwise the list price.
    #[must_use]
    pub fn current_price(&self, now: DateTime<Utc>) -> Decimal {
        match self.discount_price {
            Some(sale) if self.is_discounted_at(now) => sale,
            _ => self.price,
        }
    }
}

/// Total for a line of `quantity` units.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

/// Store-wide tax and shipping settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingConfig {
    /// Tax rate as a fraction (0.15 for 15%).
    pub tax_rate: Decimal,
    /// Flat shipping fee charged below the free-shipping threshold.
    pub shipping_fee: Decimal,
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(15, 2),
            shipping_fee: Decimal::new(2500, 2),
            free_shipping_threshold: Decimal::new(30000, 2),
        }
    }
}

impl PricingConfig {
    /// Tax owed on a subtotal.
    #[must_use]
    pub fn tax_for(&self, subtotal: Decimal) -> Decimal {
        round_money(subtotal * self.tax_rate)
    }

    /// Shipping owed on a subtotal.
    ///
    /// Nothing ships for an empty subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO || subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_fee
        }
    }
}

/// The money breakdown of a cart or an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// Compute totals from line totals and a discount amount.
    ///
    /// `total = max(0, subtotal + tax + shipping - discount)`.
    #[must_use]
    pub fn compute<I>(line_totals: I, discount: Decimal, config: &PricingConfig) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        let subtotal = round_money(line_totals.into_iter().sum());
        Self::from_subtotal(subtotal, discount, config)
    }

    /// Compute totals from an already summed subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Decimal, discount: Decimal, config: &PricingConfig) -> Self {
        let tax = config.tax_for(subtotal);
        let shipping = config.shipping_for(subtotal);
        let discount = round_money(discount.max(Decimal::ZERO));
        let total = (subtotal + tax + shipping - discount).max(Decimal::ZERO);

        Self {
            subtotal,
            tax,
            shipping,
            discount,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap_or_default()
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0)
            .single()
            .unwrap_or_default()
    }

    #[test]
    fn test_current_price_inside_window() {
        let now = noon();
        let schedule = PriceSchedule {
            price: dec("120.00"),
            discount_price: Some(dec("99.00")),
            discount_from: Some(now - Duration::days(1)),
            discount_to: Some(now + Duration::days(1)),
        };
        assert!(schedule.is_discounted_at(now));
        assert_eq!(schedule.current_price(now), dec("99.00"));
    }

    #[test]
    fn test_current_price_window_bounds_are_inclusive() {
        let now = noon();
        let schedule = PriceSchedule {
            price: dec("120.00"),
            discount_price: Some(dec("99.00")),
            discount_from: Some(now),
            discount_to: Some(now),
        };
        assert_eq!(schedule.current_price(now), dec("99.00"));
        assert_eq!(
            schedule.current_price(now + Duration::seconds(1)),
            dec("120.00")
        );
        assert_eq!(
            schedule.current_price(now - Duration::seconds(1)),
            dec("120.00")
        );
    }

    #[test]
    fn test_current_price_open_ended_windows() {
        let now = noon();
        let no_end = PriceSchedule {
            price: dec("50"),
            discount_price: Some(dec("40")),
            discount_from: Some(now - Duration::days(3)),
            discount_to: None,
        };
        assert_eq!(no_end.current_price(now), dec("40"));

        let no_bounds = PriceSchedule {
            discount_from: None,
            ..no_end
        };
        assert_eq!(no_bounds.current_price(now), dec("40"));
    }

    #[test]
    fn test_current_price_without_sale_price() {
        let now = noon();
        let schedule = PriceSchedule {
            price: dec("75.50"),
            discount_price: None,
            discount_from: Some(now - Duration::days(1)),
            discount_to: Some(now + Duration::days(1)),
        };
        assert!(!schedule.is_discounted_at(now));
        assert_eq!(schedule.current_price(now), dec("75.50"));
    }

    #[test]
    fn test_totals_below_free_shipping() {
        let config = PricingConfig::default();
        let totals = Totals::compute([dec("100.00"), dec("50.00")], Decimal::ZERO, &config);
        assert_eq!(totals.subtotal, dec("150.00"));
        assert_eq!(totals.tax, dec("22.50"));
        assert_eq!(totals.shipping, dec("25.00"));
        assert_eq!(totals.total, dec("197.50"));
    }

    #[test]
    fn test_totals_free_shipping_at_threshold() {
        let config = PricingConfig::default();
        let totals = Totals::from_subtotal(dec("300.00"), dec("30.00"), &config);
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, dec("315.00"));
    }

    #[test]
    fn test_totals_clamped_to_zero() {
        let config = PricingConfig {
            tax_rate: Decimal::ZERO,
            shipping_fee: Decimal::ZERO,
            free_shipping_threshold: Decimal::ZERO,
        };
        let totals = Totals::from_subtotal(dec("20.00"), dec("50.00"), &config);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_empty_cart_totals() {
        let totals = Totals::compute(Vec::new(), Decimal::ZERO, &PricingConfig::default());
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_totals_identity_holds_across_subtotals() {
        let config = PricingConfig::default();
        for cents in [0_i64, 1, 999, 12_345, 29_999, 30_000, 250_075] {
            let subtotal = Decimal::new(cents, 2);
            for discount in [Decimal::ZERO, dec("10"), dec("5000")] {
                let t = Totals::from_subtotal(subtotal, discount, &config);
                let expected = (t.subtotal + t.tax + t.shipping - t.discount).max(Decimal::ZERO);
                assert_eq!(t.total, expected);
            }
        }
    }

    #[test]
    fn test_rounding_midpoint_away_from_zero() {
        assert_eq!(round_money(dec("1.005")), dec("1.01"));
        assert_eq!(round_money(dec("2.344")), dec("2.34"));
        assert_eq!(line_total(dec("33.335"), 3), dec("100.01"));
    }
}
