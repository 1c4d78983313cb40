//! Seed the catalog with demo data.
//!
//! Inserts a small bilingual flower shop: categories, colors, sizes,
//! occasions and products with a variant per color and size. Refuses to run
//! against a database that already has categories.

use rust_decimal::Decimal;
use tracing::{info, warn};

use petal_admin::db::CatalogAdminRepository;
use petal_admin::db::catalog::{
    AttributeInput, CategoryInput, ColorInput, OccasionInput, ProductInput, SizeInput,
};
use petal_core::{CategoryId, ColorId, OccasionId, SizeId};

use super::connect;

const CATEGORIES: &[(&str, &str, &str)] = &[
    ("bouquets", "Bouquets", "باقات"),
    ("roses", "Roses", "ورود"),
    ("indoor-plants", "Indoor Plants", "نباتات داخلية"),
    ("gift-boxes", "Gift Boxes", "صناديق الهدايا"),
];

const COLORS: &[(&str, &str, &str)] = &[
    ("Red", "أحمر", "#c0392b"),
    ("White", "أبيض", "#ffffff"),
    ("Pink", "وردي", "#f4a6c0"),
    ("Yellow", "أصفر", "#f1c40f"),
];

const SIZES: &[(&str, &str)] = &[("Small", "صغير"), ("Medium", "متوسط"), ("Large", "كبير")];

const OCCASIONS: &[(&str, &str, &str)] = &[
    ("birthday", "Birthday", "عيد ميلاد"),
    ("anniversary", "Anniversary", "ذكرى سنوية"),
    ("wedding", "Wedding", "زفاف"),
    ("graduation", "Graduation", "تخرج"),
    ("get-well", "Get Well", "تمنيات بالشفاء"),
];

/// A demo product. Prices are in hundredths; the index fields point into
/// the tables above.
struct DemoProduct {
    category: usize,
    slug: &'static str,
    sku: &'static str,
    name_en: &'static str,
    name_ar: &'static str,
    description_en: &'static str,
    price: i64,
    discount_price: Option<i64>,
    featured: bool,
    colors: &'static [usize],
    occasions: &'static [usize],
}

const PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        category: 0,
        slug: "spring-meadow-bouquet",
        sku: "BQ-001",
        name_en: "Spring Meadow Bouquet",
        name_ar: "باقة مرج الربيع",
        description_en: "Tulips, daisies and seasonal greens, hand-tied.",
        price: 18_900,
        discount_price: Some(15_900),
        featured: true,
        colors: &[2, 3],
        occasions: &[0, 3],
    },
    DemoProduct {
        category: 0,
        slug: "pure-white-bouquet",
        sku: "BQ-002",
        name_en: "Pure White Bouquet",
        name_ar: "باقة البياض",
        description_en: "White lilies and roses for quiet elegance.",
        price: 24_500,
        discount_price: None,
        featured: false,
        colors: &[1],
        occasions: &[2, 4],
    },
    DemoProduct {
        category: 1,
        slug: "classic-red-roses",
        sku: "RS-001",
        name_en: "Classic Red Roses",
        name_ar: "ورود حمراء كلاسيكية",
        description_en: "Long-stem red roses wrapped in kraft paper.",
        price: 29_900,
        discount_price: None,
        featured: true,
        colors: &[0, 2],
        occasions: &[1, 2],
    },
    DemoProduct {
        category: 2,
        slug: "fiddle-leaf-fig",
        sku: "PL-001",
        name_en: "Fiddle Leaf Fig",
        name_ar: "تين الكمان",
        description_en: "A statement indoor plant in a ceramic pot.",
        price: 34_000,
        discount_price: None,
        featured: false,
        colors: &[],
        occasions: &[4],
    },
    DemoProduct {
        category: 3,
        slug: "rose-and-chocolate-box",
        sku: "GB-001",
        name_en: "Rose and Chocolate Box",
        name_ar: "صندوق الورد والشوكولاتة",
        description_en: "Preserved roses with a selection of chocolates.",
        price: 42_000,
        discount_price: Some(37_500),
        featured: true,
        colors: &[0, 1],
        occasions: &[0, 1],
    },
];

/// Seed the demo catalog.
///
/// # Errors
///
/// Returns an error if the connection or any insert fails.
pub async fn catalog() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&pool)
        .await?;
    if existing > 0 {
        warn!(existing, "Catalog already has categories, skipping seed");
        return Ok(());
    }

    let repo = CatalogAdminRepository::new(&pool);

    let mut category_ids: Vec<CategoryId> = Vec::with_capacity(CATEGORIES.len());
    for (position, (slug, name_en, name_ar)) in CATEGORIES.iter().enumerate() {
        let category = repo
            .create_category(&CategoryInput {
                slug: (*slug).to_owned(),
                name_en: (*name_en).to_owned(),
                name_ar: Some((*name_ar).to_owned()),
                description_en: None,
                description_ar: None,
                image_url: None,
                is_active: true,
                sort_order: i32::try_from(position)?,
            })
            .await?;
        category_ids.push(category.id);
    }

    let mut color_ids: Vec<ColorId> = Vec::with_capacity(COLORS.len());
    for (name_en, name_ar, hex_code) in COLORS {
        let color = repo
            .create_color(&ColorInput {
                name_en: (*name_en).to_owned(),
                name_ar: Some((*name_ar).to_owned()),
                hex_code: (*hex_code).to_owned(),
            })
            .await?;
        color_ids.push(color.id);
    }

    let mut size_ids: Vec<SizeId> = Vec::with_capacity(SIZES.len());
    for (position, (name_en, name_ar)) in SIZES.iter().enumerate() {
        let size = repo
            .create_size(&SizeInput {
                name_en: (*name_en).to_owned(),
                name_ar: Some((*name_ar).to_owned()),
                sort_order: i32::try_from(position)?,
            })
            .await?;
        size_ids.push(size.id);
    }

    let mut occasion_ids: Vec<OccasionId> = Vec::with_capacity(OCCASIONS.len());
    for (slug, name_en, name_ar) in OCCASIONS {
        let occasion = repo
            .create_occasion(&OccasionInput {
                slug: (*slug).to_owned(),
                name_en: (*name_en).to_owned(),
                name_ar: Some((*name_ar).to_owned()),
            })
            .await?;
        occasion_ids.push(occasion.id);
    }

    let mut variants = 0;
    for demo in PRODUCTS {
        let product = repo
            .create_product(&ProductInput {
                category_id: category_ids[demo.category],
                slug: demo.slug.to_owned(),
                sku: Some(demo.sku.to_owned()),
                name_en: demo.name_en.to_owned(),
                name_ar: Some(demo.name_ar.to_owned()),
                description_en: Some(demo.description_en.to_owned()),
                description_ar: None,
                care_instructions: None,
                price: Decimal::new(demo.price, 2),
                discount_price: demo.discount_price.map(|p| Decimal::new(p, 2)),
                discount_from: None,
                discount_to: None,
                image_url: None,
                is_active: true,
                is_featured: demo.featured,
            })
            .await?;

        let tags: Vec<OccasionId> = demo.occasions.iter().map(|&i| occasion_ids[i]).collect();
        repo.set_product_occasions(product.id, &tags).await?;

        // Plants come in sizes only; everything else in each listed color
        let colors: Vec<Option<ColorId>> = if demo.colors.is_empty() {
            vec![None]
        } else {
            demo.colors.iter().map(|&i| Some(color_ids[i])).collect()
        };
        for color_id in colors {
            for (step, size_id) in size_ids.iter().enumerate() {
                repo.create_attribute(
                    product.id,
                    &AttributeInput {
                        color_id,
                        size_id: Some(*size_id),
                        stock: 20,
                        price_adjustment: Decimal::new(i64::try_from(step)? * 5_000, 2),
                    },
                )
                .await?;
                variants += 1;
            }
        }
    }

    info!("Catalog seeded!");
    info!("  Categories: {}", category_ids.len());
    info!("  Colors: {}", color_ids.len());
    info!("  Sizes: {}", size_ids.len());
    info!("  Occasions: {}", occasion_ids.len());
    info!("  Products: {}", PRODUCTS.len());
    info!("  Variants: {variants}");

    Ok(())
}
