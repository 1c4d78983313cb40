//! Status and kind enums for Petal entities.
//!
//! With the `postgres` feature each enum maps to a Postgres enum type of the
//! same snake_case name (created in the initial migration).

use serde::{Deserialize, Serialize};

/// A status change that the lifecycle does not allow.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot change {entity} status from {from} to {to}")]
pub struct TransitionError {
    /// Entity kind, e.g. "order".
    pub entity: &'static str,
    /// Current status.
    pub from: &'static str,
    /// Requested status.
    pub to: &'static str,
}

/// An unknown enum value in a string (query parameter, CLI argument).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Enum kind, e.g. "order status".
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` from a single variant table.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants, in lifecycle order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The snake_case wire and database representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

// =============================================================================
// Orders
// =============================================================================

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Orders move forward one step at a time and can be cancelled until
    /// they leave the warehouse.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered)
        )
    }

    /// Validate a transition.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the move is not allowed.
    pub const fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "order",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

/// Payment standing of an order, derived from its payment records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderPaymentStatus {
    #[default]
    Unpaid,
    Paid,
    PartiallyRefunded,
    Refunded,
}

string_enum!(OrderPaymentStatus, "order payment status", {
    Unpaid => "unpaid",
    Paid => "paid",
    PartiallyRefunded => "partially_refunded",
    Refunded => "refunded",
});

impl OrderPaymentStatus {
    /// Derive the order's payment standing.
    ///
    /// `captured` is the sum of completed positive payments and `refunded`
    /// the absolute sum of completed refund records. The order is paid
    /// whenever the net of the two covers the total.
    #[must_use]
    pub fn derive(
        order_total: rust_decimal::Decimal,
        captured: rust_decimal::Decimal,
        refunded: rust_decimal::Decimal,
    ) -> Self {
        use rust_decimal::Decimal;

        let net = captured - refunded;
        if net >= order_total && net > Decimal::ZERO {
            Self::Paid
        } else if refunded > Decimal::ZERO && net <= Decimal::ZERO {
            Self::Refunded
        } else if refunded > Decimal::ZERO {
            Self::PartiallyRefunded
        } else {
            Self::Unpaid
        }
    }
}

// =============================================================================
// Payments
// =============================================================================

/// Lifecycle of a single payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

string_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

impl PaymentStatus {
    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// `Refunded` is only reached through a refund, never set directly, but
    /// the transition is listed so the refund path can validate it too.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Pending,
                Self::Processing | Self::Completed | Self::Failed | Self::Cancelled
            ) | (
                Self::Processing,
                Self::Completed | Self::Failed | Self::Cancelled
            ) | (Self::Completed, Self::Refunded)
        )
    }

    /// Validate a transition.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the move is not allowed.
    pub const fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "payment",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }

    /// Terminal states never change again.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Refunded)
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    Card,
    BankTransfer,
}

string_enum!(PaymentMethod, "payment method", {
    CashOnDelivery => "cash_on_delivery",
    Card => "card",
    BankTransfer => "bank_transfer",
});

// =============================================================================
// Discounts
// =============================================================================

/// How a discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "discount_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a percentage of the subtotal.
    Percentage,
    /// `value` is a fixed currency amount.
    Fixed,
}

string_enum!(DiscountKind, "discount kind", {
    Percentage => "percentage",
    Fixed => "fixed",
});

// =============================================================================
// Verification
// =============================================================================

/// Delivery channel for one-time passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "otp_channel", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OtpChannel {
    #[default]
    Sms,
    Whatsapp,
}

string_enum!(OtpChannel, "otp channel", {
    Sms => "sms",
    Whatsapp => "whatsapp",
});

/// Outcome of a phone verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "verification_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Expired,
    Failed,
}

string_enum!(VerificationStatus, "verification status", {
    Pending => "pending",
    Approved => "approved",
    Expired => "expired",
    Failed => "failed",
});

// =============================================================================
// Landscaping
// =============================================================================

/// Landscaping services customers can book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "landscape_service", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum LandscapeService {
    GardenDesign,
    Installation,
    Maintenance,
    Consultation,
}

string_enum!(LandscapeService, "landscape service", {
    GardenDesign => "garden_design",
    Installation => "installation",
    Maintenance => "maintenance",
    Consultation => "consultation",
});

impl LandscapeService {
    /// Display name in the given locale.
    #[must_use]
    pub const fn label(self, locale: super::Locale) -> &'static str {
        use super::Locale;
        match (self, locale) {
            (Self::GardenDesign, Locale::En) => "Garden design",
            (Self::GardenDesign, Locale::Ar) => "تصميم الحدائق",
            (Self::Installation, Locale::En) => "Planting & installation",
            (Self::Installation, Locale::Ar) => "الزراعة والتركيب",
            (Self::Maintenance, Locale::En) => "Garden maintenance",
            (Self::Maintenance, Locale::Ar) => "صيانة الحدائق",
            (Self::Consultation, Locale::En) => "Consultation",
            (Self::Consultation, Locale::Ar) => "استشارة",
        }
    }
}

/// Status of a landscaping booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "booking_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

string_enum!(BookingStatus, "booking status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl BookingStatus {
    /// Whether the lifecycle allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Completed | Self::Cancelled)
        )
    }

    /// Validate a transition.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the move is not allowed.
    pub const fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "booking",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

// =============================================================================
// Administration
// =============================================================================

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access including admin user management.
    SuperAdmin,
    /// Full access to store data.
    Admin,
    /// Read-only access.
    Viewer,
}

string_enum!(AdminRole, "admin role", {
    SuperAdmin => "super_admin",
    Admin => "admin",
    Viewer => "viewer",
});

impl AdminRole {
    /// Whether this role may create, update or delete records.
    #[must_use]
    pub const fn can_write(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_order_lifecycle() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));

        let err = OrderStatus::Cancelled
            .transition_to(OrderStatus::Confirmed)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot change order status from cancelled to confirmed"
        );
    }

    #[test]
    fn test_payment_lifecycle() {
        use PaymentStatus::{Cancelled, Completed, Failed, Pending, Processing, Refunded};

        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Completed.can_transition_to(Refunded));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Refunded.can_transition_to(Completed));
        assert!(Refunded.is_final());
        assert!(!Completed.is_final());
    }

    #[test]
    fn test_order_payment_status_derivation() {
        let total = Decimal::new(10_000, 2);
        assert_eq!(
            OrderPaymentStatus::derive(total, Decimal::ZERO, Decimal::ZERO),
            OrderPaymentStatus::Unpaid
        );
        assert_eq!(
            OrderPaymentStatus::derive(total, total, Decimal::ZERO),
            OrderPaymentStatus::Paid
        );
        assert_eq!(
            OrderPaymentStatus::derive(total, total, Decimal::new(2_500, 2)),
            OrderPaymentStatus::PartiallyRefunded
        );
        assert_eq!(
            OrderPaymentStatus::derive(total, total, total),
            OrderPaymentStatus::Refunded
        );
        // Refunded once, then paid again in full
        assert_eq!(
            OrderPaymentStatus::derive(total, Decimal::new(20_000, 2), total),
            OrderPaymentStatus::Paid
        );
    }

    #[test]
    fn test_string_round_trip_and_errors() {
        assert_eq!(
            "partially_refunded".parse::<OrderPaymentStatus>().unwrap(),
            OrderPaymentStatus::PartiallyRefunded
        );
        assert_eq!(AdminRole::SuperAdmin.to_string(), "super_admin");
        let err = "archived".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: archived");
    }

    #[test]
    fn test_serde_names_match_database_names() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        for method in PaymentMethod::ALL {
            let json = serde_json::to_string(method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
    }

    #[test]
    fn test_viewer_is_read_only() {
        assert!(AdminRole::Admin.can_write());
        assert!(!AdminRole::Viewer.can_write());
    }
}
