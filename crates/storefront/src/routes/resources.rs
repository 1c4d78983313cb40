//! Localized JSON shapes for catalog and event responses.
//!
//! Models carry both languages; responses carry the one the client asked
//! for.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use petal_core::{
    CategoryId, ColorId, EventId, LandscapeService, Locale, OccasionId, ProductAttributeId,
    ProductId, SizeId,
};

use crate::models::{
    Category, Color, Event, Occasion, Product, ProductAttribute, ProductDetail, Size,
};

#[derive(Debug, Clone, Serialize)]
pub struct CategoryResource {
    pub id: CategoryId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl CategoryResource {
    #[must_use]
    pub fn new(category: &Category, locale: Locale) -> Self {
        Self {
            id: category.id,
            slug: category.slug.clone(),
            name: category.name(locale).to_owned(),
            description: category.description(locale).map(str::to_owned),
            image_url: category.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorResource {
    pub id: ColorId,
    pub name: String,
    pub hex_code: String,
}

impl ColorResource {
    #[must_use]
    pub fn new(color: &Color, locale: Locale) -> Self {
        Self {
            id: color.id,
            name: color.name(locale).to_owned(),
            hex_code: color.hex_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeResource {
    pub id: SizeId,
    pub name: String,
}

impl SizeResource {
    #[must_use]
    pub fn new(size: &Size, locale: Locale) -> Self {
        Self {
            id: size.id,
            name: size.name(locale).to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OccasionResource {
    pub id: OccasionId,
    pub slug: String,
    pub name: String,
}

impl OccasionResource {
    #[must_use]
    pub fn new(occasion: &Occasion, locale: Locale) -> Self {
        Self {
            id: occasion.id,
            slug: occasion.slug.clone(),
            name: occasion.name(locale).to_owned(),
        }
    }
}

/// A product as listed in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ProductResource {
    pub id: ProductId,
    pub slug: String,
    pub sku: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category_id: CategoryId,
    pub price: Decimal,
    /// Price after the sale window is applied.
    pub current_price: Decimal,
    pub discount_price: Option<Decimal>,
    pub is_on_sale: bool,
    pub image_url: Option<String>,
    pub is_featured: bool,
    pub care_instructions: Option<String>,
}

impl ProductResource {
    #[must_use]
    pub fn new(product: &Product, locale: Locale, now: DateTime<Utc>) -> Self {
        Self {
            id: product.id,
            slug: product.slug.clone(),
            sku: product.sku.clone(),
            name: product.name(locale).to_owned(),
            description: product.description(locale).map(str::to_owned),
            category_id: product.category_id,
            price: product.price,
            current_price: product.current_price(now),
            discount_price: product.discount_price,
            is_on_sale: product.is_on_sale(now),
            image_url: product.image_url.clone(),
            is_featured: product.is_featured,
            care_instructions: product.care_instructions.clone(),
        }
    }
}

/// A purchasable variant with its price at the product's current price.
#[derive(Debug, Clone, Serialize)]
pub struct VariantResource {
    pub id: ProductAttributeId,
    pub color_id: Option<ColorId>,
    pub color_name: Option<String>,
    pub color_hex: Option<String>,
    pub size_id: Option<SizeId>,
    pub size_name: Option<String>,
    pub price_adjustment: Decimal,
    pub price: Decimal,
    pub stock: i32,
    pub in_stock: bool,
}

impl VariantResource {
    #[must_use]
    pub fn new(attribute: &ProductAttribute, base_price: Decimal) -> Self {
        Self {
            id: attribute.id,
            color_id: attribute.color_id,
            color_name: attribute.color_name.clone(),
            color_hex: attribute.color_hex.clone(),
            size_id: attribute.size_id,
            size_name: attribute.size_name.clone(),
            price_adjustment: attribute.price_adjustment,
            price: attribute.unit_price(base_price),
            stock: attribute.stock,
            in_stock: attribute.has_stock(1),
        }
    }
}

/// Product page payload.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetailResource {
    #[serde(flatten)]
    pub product: ProductResource,
    pub category: Option<CategoryResource>,
    pub attributes: Vec<VariantResource>,
    pub occasions: Vec<OccasionResource>,
}

impl ProductDetailResource {
    #[must_use]
    pub fn new(detail: &ProductDetail, locale: Locale, now: DateTime<Utc>) -> Self {
        let base_price = detail.product.current_price(now);
        Self {
            product: ProductResource::new(&detail.product, locale, now),
            category: detail
                .category
                .as_ref()
                .map(|c| CategoryResource::new(c, locale)),
            attributes: detail
                .attributes
                .iter()
                .map(|a| VariantResource::new(a, base_price))
                .collect(),
            occasions: detail
                .occasions
                .iter()
                .map(|o| OccasionResource::new(o, locale))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventResource {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub capacity: Option<i32>,
    pub is_upcoming: bool,
}

impl EventResource {
    #[must_use]
    pub fn new(event: &Event, locale: Locale, now: DateTime<Utc>) -> Self {
        Self {
            id: event.id,
            title: event.title(locale).to_owned(),
            description: event.description(locale).map(str::to_owned),
            location: event.location.clone(),
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            image_url: event.image_url.clone(),
            capacity: event.capacity,
            is_upcoming: event.is_upcoming(now),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LandscapeServiceResource {
    pub value: LandscapeService,
    pub label: &'static str,
}

impl LandscapeServiceResource {
    #[must_use]
    pub const fn new(service: LandscapeService, locale: Locale) -> Self {
        Self {
            value: service,
            label: service.label(locale),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn variant(adjustment: &str, stock: i32) -> ProductAttribute {
        ProductAttribute {
            id: ProductAttributeId::new(7),
            product_id: ProductId::new(1),
            color_id: Some(ColorId::new(2)),
            size_id: None,
            stock,
            price_adjustment: adjustment.parse().unwrap(),
            color_name: Some("Red".to_string()),
            color_hex: Some("#FF0000".to_string()),
            size_name: None,
        }
    }

    #[test]
    fn test_variant_price_follows_base_price() {
        let resource = VariantResource::new(&variant("15.50", 0), "99.00".parse().unwrap());
        assert_eq!(resource.price, "114.50".parse::<Decimal>().unwrap());
        assert!(!resource.in_stock);
    }

    #[test]
    fn test_landscape_service_labels() {
        let resource = LandscapeServiceResource::new(LandscapeService::Consultation, Locale::Ar);
        assert_eq!(resource.label, "استشارة");
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["value"], "consultation");
    }
}
