//! Catalog models: categories, colors, sizes, occasions and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use petal_core::pricing::PriceSchedule;
use petal_core::{
    CategoryId, ColorId, Locale, OccasionId, ProductAttributeId, ProductId, SizeId,
};

/// A product category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub slug: String,
    pub name_en: String,
    pub name_ar: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    #[must_use]
    pub fn name(&self, locale: Locale) -> &str {
        locale.pick(&self.name_en, self.name_ar.as_deref())
    }

    #[must_use]
    pub fn description(&self, locale: Locale) -> Option<&str> {
        pick_optional(
            locale,
            self.description_en.as_deref(),
            self.description_ar.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Color {
    pub id: ColorId,
    pub name_en: String,
    pub name_ar: Option<String>,
    /// `#RRGGBB`
    pub hex_code: String,
}

impl Color {
    #[must_use]
    pub fn name(&self, locale: Locale) -> &str {
        locale.pick(&self.name_en, self.name_ar.as_deref())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Size {
    pub id: SizeId,
    pub name_en: String,
    pub name_ar: Option<String>,
    pub sort_order: i32,
}

impl Size {
    #[must_use]
    pub fn name(&self, locale: Locale) -> &str {
        locale.pick(&self.name_en, self.name_ar.as_deref())
    }
}

/// A gifting occasion (birthday, wedding, ...).
#[derive(Debug, Clone, Serialize)]
pub struct Occasion {
    pub id: OccasionId,
    pub slug: String,
    pub name_en: String,
    pub name_ar: Option<String>,
}

impl Occasion {
    #[must_use]
    pub fn name(&self, locale: Locale) -> &str {
        locale.pick(&self.name_en, self.name_ar.as_deref())
    }
}

/// A sellable product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub slug: String,
    pub sku: Option<String>,
    pub name_en: String,
    pub name_ar: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub care_instructions: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub discount_from: Option<DateTime<Utc>>,
    pub discount_to: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn schedule(&self) -> PriceSchedule {
        PriceSchedule {
            price: self.price,
            discount_price: self.discount_price,
            discount_from: self.discount_from,
            discount_to: self.discount_to,
        }
    }

    /// Effective price at `now`, honoring the sale window.
    #[must_use]
    pub fn current_price(&self, now: DateTime<Utc>) -> Decimal {
        self.schedule().current_price(now)
    }

    #[must_use]
    pub fn is_on_sale(&self, now: DateTime<Utc>) -> bool {
        self.schedule().is_discounted_at(now)
    }

    #[must_use]
    pub fn name(&self, locale: Locale) -> &str {
        locale.pick(&self.name_en, self.name_ar.as_deref())
    }

    #[must_use]
    pub fn description(&self, locale: Locale) -> Option<&str> {
        pick_optional(
            locale,
            self.description_en.as_deref(),
            self.description_ar.as_deref(),
        )
    }
}

/// A color x size variant of a product with its own stock.
///
/// Color and size names are joined in for display.
#[derive(Debug, Clone, Serialize)]
pub struct ProductAttribute {
    pub id: ProductAttributeId,
    pub product_id: ProductId,
    pub color_id: Option<ColorId>,
    pub size_id: Option<SizeId>,
    pub stock: i32,
    pub price_adjustment: Decimal,
    pub color_name: Option<String>,
    pub color_hex: Option<String>,
    pub size_name: Option<String>,
}

impl ProductAttribute {
    /// Unit price of this variant given the product's current price.
    #[must_use]
    pub fn unit_price(&self, base_price: Decimal) -> Decimal {
        (base_price + self.price_adjustment).max(Decimal::ZERO)
    }

    #[must_use]
    pub const fn has_stock(&self, quantity: i32) -> bool {
        self.stock >= quantity
    }
}

/// A product with its variants and occasions.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
    pub attributes: Vec<ProductAttribute>,
    pub occasions: Vec<Occasion>,
}

fn pick_optional<'a>(locale: Locale, en: Option<&'a str>, ar: Option<&'a str>) -> Option<&'a str> {
    match en {
        Some(en) => Some(locale.pick(en, ar)),
        None if locale == Locale::Ar => ar,
        None => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(1),
            category_id: CategoryId::new(1),
            slug: "red-roses".to_string(),
            sku: Some("RR-12".to_string()),
            name_en: "Red Roses".to_string(),
            name_ar: Some("ورد أحمر".to_string()),
            description_en: Some("A dozen red roses".to_string()),
            description_ar: None,
            care_instructions: None,
            price: "120.00".parse().unwrap(),
            discount_price: Some("99.00".parse().unwrap()),
            discount_from: Some(now - Duration::days(1)),
            discount_to: Some(now + Duration::days(1)),
            image_url: None,
            is_active: true,
            is_featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_current_price_uses_sale_window() {
        let p = product();
        let now = Utc::now();
        assert_eq!(p.current_price(now), "99.00".parse::<Decimal>().unwrap());
        assert_eq!(
            p.current_price(now + Duration::days(2)),
            "120.00".parse::<Decimal>().unwrap()
        );
    }

    #[test]
    fn test_localized_names() {
        let p = product();
        assert_eq!(p.name(Locale::Ar), "ورد أحمر");
        assert_eq!(p.description(Locale::Ar), Some("A dozen red roses"));
        assert_eq!(p.description(Locale::En), Some("A dozen red roses"));
    }

    #[test]
    fn test_attribute_unit_price_never_negative() {
        let attr = ProductAttribute {
            id: ProductAttributeId::new(1),
            product_id: ProductId::new(1),
            color_id: None,
            size_id: None,
            stock: 3,
            price_adjustment: "-500".parse().unwrap(),
            color_name: None,
            color_hex: None,
            size_name: None,
        };
        assert_eq!(attr.unit_price("100".parse().unwrap()), Decimal::ZERO);
        assert!(attr.has_stock(3));
        assert!(!attr.has_stock(4));
    }
}
