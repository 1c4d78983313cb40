//! Catalog route handlers: categories, attribute lookups and products.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use petal_core::{ColorId, ProductId, SizeId};

use super::resources::{
    CategoryResource, ColorResource, OccasionResource, ProductDetailResource, ProductResource,
    SizeResource,
};
use crate::db::catalog::{ProductFilter, ProductSort};
use crate::db::{CatalogRepository, Page};
use crate::error::{AppError, Result};
use crate::extract::Lang;
use crate::state::AppState;

/// Query parameters for product listings.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub color: Option<i32>,
    pub size: Option<i32>,
    pub occasion: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub search: Option<String>,
    /// `1`/`true` or `0`/`false`.
    pub featured: Option<String>,
    pub sort: Option<ProductSort>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ProductQuery {
    /// Convert into a repository filter, rejecting unparseable prices.
    fn into_filter(self) -> Result<(ProductFilter, Page)> {
        let filter = ProductFilter {
            category: non_blank(self.category),
            color: self.color.map(ColorId::new),
            size: self.size.map(SizeId::new),
            occasion: non_blank(self.occasion),
            min_price: parse_price("min_price", self.min_price.as_deref())?,
            max_price: parse_price("max_price", self.max_price.as_deref())?,
            search: non_blank(self.search),
            featured: self.featured.as_deref().and_then(parse_flag),
            gifts_only: false,
            sort: self.sort.unwrap_or_default(),
        };
        Ok((filter, Page::new(self.page, self.per_page)))
    }
}

/// Query parameters for the gift listing.
#[derive(Debug, Default, Deserialize)]
pub struct GiftQuery {
    pub occasion: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn parse_price(field: &str, value: Option<&str>) -> Result<Option<Decimal>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<Decimal>()
            .ok()
            .filter(|d| !d.is_sign_negative())
            .map(Some)
            .ok_or_else(|| {
                let label = field.replace('_', " ");
                AppError::field(field, format!("The {label} must be a positive number."))
            }),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List active categories.
#[instrument(skip(state))]
pub async fn categories(
    State(state): State<AppState>,
    Lang(locale): Lang,
) -> Result<impl IntoResponse> {
    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    let data: Vec<_> = categories
        .iter()
        .map(|c| CategoryResource::new(c, locale))
        .collect();

    Ok(Json(json!({ "data": data })))
}

/// A category with a page of its products.
#[instrument(skip(state, query))]
pub async fn category(
    State(state): State<AppState>,
    Lang(locale): Lang,
    Path(slug): Path<String>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse> {
    let repo = CatalogRepository::new(state.pool());
    let category = repo
        .get_category_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found.".to_string()))?;

    let (mut filter, page) = query.into_filter()?;
    filter.category = Some(category.slug.clone());

    let now = Utc::now();
    let products = repo
        .list_products(&filter, page)
        .await?
        .map(|p| ProductResource::new(&p, locale, now));

    Ok(Json(json!({
        "category": CategoryResource::new(&category, locale),
        "products": products,
    })))
}

#[instrument(skip(state))]
pub async fn colors(State(state): State<AppState>, Lang(locale): Lang) -> Result<impl IntoResponse> {
    let colors = CatalogRepository::new(state.pool()).list_colors().await?;
    let data: Vec<_> = colors.iter().map(|c| ColorResource::new(c, locale)).collect();
    Ok(Json(json!({ "data": data })))
}

#[instrument(skip(state))]
pub async fn sizes(State(state): State<AppState>, Lang(locale): Lang) -> Result<impl IntoResponse> {
    let sizes = CatalogRepository::new(state.pool()).list_sizes().await?;
    let data: Vec<_> = sizes.iter().map(|s| SizeResource::new(s, locale)).collect();
    Ok(Json(json!({ "data": data })))
}

#[instrument(skip(state))]
pub async fn occasions(
    State(state): State<AppState>,
    Lang(locale): Lang,
) -> Result<impl IntoResponse> {
    let occasions = CatalogRepository::new(state.pool()).list_occasions().await?;
    let data: Vec<_> = occasions
        .iter()
        .map(|o| OccasionResource::new(o, locale))
        .collect();
    Ok(Json(json!({ "data": data })))
}

/// Filtered, sorted, paginated product listing.
#[instrument(skip(state, query))]
pub async fn products(
    State(state): State<AppState>,
    Lang(locale): Lang,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse> {
    let (filter, page) = query.into_filter()?;
    let now = Utc::now();
    let products = CatalogRepository::new(state.pool())
        .list_products(&filter, page)
        .await?
        .map(|p| ProductResource::new(&p, locale, now));

    Ok(Json(products))
}

/// Product page: the product with its category, variants and occasions.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Lang(locale): Lang,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let detail = CatalogRepository::new(state.pool())
        .get_product_detail(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found.".to_string()))?;

    Ok(Json(json!({
        "data": ProductDetailResource::new(&detail, locale, Utc::now()),
    })))
}

/// Products tagged with an occasion, optionally one occasion only.
#[instrument(skip(state, query))]
pub async fn gifts(
    State(state): State<AppState>,
    Lang(locale): Lang,
    Query(query): Query<GiftQuery>,
) -> Result<impl IntoResponse> {
    let filter = ProductFilter {
        occasion: non_blank(query.occasion),
        gifts_only: true,
        sort: ProductSort::Featured,
        ..ProductFilter::default()
    };
    let now = Utc::now();
    let products = CatalogRepository::new(state.pool())
        .list_products(&filter, Page::new(query.page, query.per_page))
        .await?
        .map(|p| ProductResource::new(&p, locale, now));

    Ok(Json(products))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_into_filter_trims_and_parses() {
        let query = ProductQuery {
            category: Some("  roses ".to_string()),
            search: Some("   ".to_string()),
            min_price: Some("10.5".to_string()),
            featured: Some("1".to_string()),
            color: Some(3),
            per_page: Some(500),
            ..ProductQuery::default()
        };
        let (filter, page) = query.into_filter().unwrap();
        assert_eq!(filter.category.as_deref(), Some("roses"));
        assert_eq!(filter.search, None);
        assert_eq!(filter.min_price, Some("10.5".parse().unwrap()));
        assert_eq!(filter.featured, Some(true));
        assert_eq!(filter.color, Some(ColorId::new(3)));
        assert_eq!(page.per_page, Page::MAX_PER_PAGE);
    }

    #[test]
    fn test_into_filter_rejects_bad_price() {
        let query = ProductQuery {
            max_price: Some("cheap".to_string()),
            ..ProductQuery::default()
        };
        let Err(AppError::Validation(errors)) = query.into_filter() else {
            panic!("expected a validation error");
        };
        assert_eq!(
            errors["max_price"],
            vec!["The max price must be a positive number.".to_string()]
        );
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
