//! Discount code rules.
//!
//! A [`DiscountRule`] is the validation-relevant slice of a stored discount.
//! Services load it (under a row lock when redeeming), ask it for an amount,
//! and persist the usage themselves.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::round_money;
use crate::types::DiscountKind;

/// Why a discount code cannot be applied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountError {
    #[error("this discount code is not active")]
    Inactive,
    #[error("this discount code is not valid yet")]
    NotStarted,
    #[error("this discount code has expired")]
    Expired,
    #[error("order subtotal must be at least {min} to use this code")]
    BelowMinimum { min: Decimal },
    #[error("this discount code has reached its usage limit")]
    UsageLimitReached,
    #[error("you have already used this discount code the maximum number of times")]
    CustomerLimitReached,
}

/// Normalize a user-entered discount code (codes are stored upper-case).
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// The rules of one discount code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRule {
    pub kind: DiscountKind,
    /// Percentage (0-100) or fixed amount depending on `kind`.
    pub value: Decimal,
    /// Cap on the computed amount for percentage codes.
    pub max_discount_amount: Option<Decimal>,
    pub min_order_amount: Option<Decimal>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Total redemptions allowed across all customers.
    pub usage_limit: Option<i32>,
    /// Redemptions allowed per customer.
    pub usage_limit_per_customer: Option<i32>,
    pub used_count: i32,
    pub is_active: bool,
}

impl DiscountRule {
    /// Check every precondition for applying the code.
    ///
    /// `customer_uses` is how many times the redeeming customer has already
    /// used this code; pass `None` for guests (per-customer caps are then
    /// enforced at checkout, where a customer always exists).
    ///
    /// # Errors
    ///
    /// Returns the first [`DiscountError`] that applies, checked in the order
    /// active, window, minimum, global cap, customer cap.
    pub fn validate(
        &self,
        subtotal: Decimal,
        customer_uses: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<(), DiscountError> {
        if !self.is_active {
            return Err(DiscountError::Inactive);
        }
        if self.starts_at.is_some_and(|starts| now < starts) {
            return Err(DiscountError::NotStarted);
        }
        if self.expires_at.is_some_and(|expires| now > expires) {
            return Err(DiscountError::Expired);
        }
        if let Some(min) = self.min_order_amount
            && subtotal < min
        {
            return Err(DiscountError::BelowMinimum { min });
        }
        if self
            .usage_limit
            .is_some_and(|limit| self.used_count >= limit)
        {
            return Err(DiscountError::UsageLimitReached);
        }
        if let (Some(limit), Some(uses)) = (self.usage_limit_per_customer, customer_uses)
            && uses >= i64::from(limit)
        {
            return Err(DiscountError::CustomerLimitReached);
        }
        Ok(())
    }

    /// The amount this code takes off `subtotal`, ignoring validity.
    ///
    /// Percentage codes are capped by `max_discount_amount`; every amount is
    /// capped by the subtotal and never negative.
    #[must_use]
    pub fn amount_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let raw = match self.kind {
            DiscountKind::Percentage => {
                let amount = round_money(subtotal * self.value / Decimal::ONE_HUNDRED);
                self.max_discount_amount
                    .map_or(amount, |cap| amount.min(cap))
            }
            DiscountKind::Fixed => self.value,
        };

        round_money(raw.clamp(Decimal::ZERO, subtotal))
    }

    /// Validate and compute the amount in one step.
    ///
    /// # Errors
    ///
    /// See [`DiscountRule::validate`].
    pub fn redeem(
        &self,
        subtotal: Decimal,
        customer_uses: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Decimal, DiscountError> {
        self.validate(subtotal, customer_uses, now)?;
        Ok(self.amount_for(subtotal))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap_or_default()
    }

    fn percentage(value: &str) -> DiscountRule {
        DiscountRule {
            kind: DiscountKind::Percentage,
            value: dec(value),
            max_discount_amount: None,
            min_order_amount: None,
            starts_at: None,
            expires_at: None,
            usage_limit: None,
            usage_limit_per_customer: None,
            used_count: 0,
            is_active: true,
        }
    }

    #[test]
    fn test_percentage_amount() {
        let rule = percentage("10");
        assert_eq!(rule.amount_for(dec("250.00")), dec("25.00"));
        assert_eq!(rule.amount_for(dec("33.33")), dec("3.33"));
    }

    #[test]
    fn test_percentage_capped_by_max() {
        let rule = DiscountRule {
            max_discount_amount: Some(dec("40")),
            ..percentage("25")
        };
        assert_eq!(rule.amount_for(dec("1000")), dec("40"));
        assert_eq!(rule.amount_for(dec("100")), dec("25"));
    }

    #[test]
    fn test_fixed_capped_by_subtotal() {
        let rule = DiscountRule {
            kind: DiscountKind::Fixed,
            ..percentage("50")
        };
        assert_eq!(rule.amount_for(dec("200")), dec("50"));
        assert_eq!(rule.amount_for(dec("30")), dec("30"));
        assert_eq!(rule.amount_for(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_rejects_inactive() {
        let rule = DiscountRule {
            is_active: false,
            ..percentage("10")
        };
        assert_eq!(
            rule.redeem(dec("100"), None, Utc::now()),
            Err(DiscountError::Inactive)
        );
    }

    #[test]
    fn test_rejects_outside_window() {
        let now = Utc::now();
        let future = DiscountRule {
            starts_at: Some(now + Duration::hours(1)),
            ..percentage("10")
        };
        assert_eq!(
            future.validate(dec("100"), None, now),
            Err(DiscountError::NotStarted)
        );

        let past = DiscountRule {
            expires_at: Some(now - Duration::hours(1)),
            ..percentage("10")
        };
        assert_eq!(
            past.validate(dec("100"), None, now),
            Err(DiscountError::Expired)
        );

        let current = DiscountRule {
            starts_at: Some(now - Duration::hours(1)),
            expires_at: Some(now + Duration::hours(1)),
            ..percentage("10")
        };
        assert!(current.validate(dec("100"), None, now).is_ok());
    }

    #[test]
    fn test_rejects_below_minimum() {
        let rule = DiscountRule {
            min_order_amount: Some(dec("200")),
            ..percentage("10")
        };
        assert_eq!(
            rule.validate(dec("199.99"), None, Utc::now()),
            Err(DiscountError::BelowMinimum { min: dec("200") })
        );
        assert!(rule.validate(dec("200"), None, Utc::now()).is_ok());
    }

    #[test]
    fn test_rejects_usage_caps() {
        let global = DiscountRule {
            usage_limit: Some(3),
            used_count: 3,
            ..percentage("10")
        };
        assert_eq!(
            global.validate(dec("100"), Some(0), Utc::now()),
            Err(DiscountError::UsageLimitReached)
        );

        let per_customer = DiscountRule {
            usage_limit_per_customer: Some(1),
            ..percentage("10")
        };
        assert_eq!(
            per_customer.validate(dec("100"), Some(1), Utc::now()),
            Err(DiscountError::CustomerLimitReached)
        );
        assert!(per_customer.validate(dec("100"), Some(0), Utc::now()).is_ok());
        assert!(per_customer.validate(dec("100"), None, Utc::now()).is_ok());
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  spring25 "), "SPRING25");
    }
}
