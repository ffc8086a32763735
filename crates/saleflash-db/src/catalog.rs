//! Catalog read-model queries used by the server's listing endpoint.

use rust_decimal::Decimal;
use sqlx::PgPool;

use saleflash_core::MetaKey;

use crate::products::NUMERIC_PATTERN;
use crate::DbError;

/// Catalog ordering options.
///
/// `SalePercentage` carries the derived meta key the shop's display mode
/// selects; ordering by it excludes products that have never had their
/// percentages computed (the derived row simply does not exist yet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrdering {
    /// Newest products first.
    Date,
    /// Cheapest first, by the `price` meta field.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
    /// Biggest discount first, by the given derived meta key.
    SalePercentage(MetaKey),
}

/// Input filters for the catalog listing.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilters<'a> {
    /// Restrict to products in the category with this slug.
    pub category_slug: Option<&'a str>,
    pub limit: i64,
}

/// Product card row tailored for the catalog listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogCardRow {
    pub product_id: i64,
    pub name: String,
    pub slug: String,
    pub kind: String,
    /// Stored `_sale_percentage`, `0` when absent.
    pub sale_percentage: i32,
    /// Stored `_sale_percentage_highest`, `0` when absent.
    pub sale_percentage_highest: i32,
    pub regular_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}

/// Returns published, non-variation product cards with their stored
/// percentages and own price pair.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_catalog_cards(
    pool: &PgPool,
    ordering: CatalogOrdering,
    filters: CatalogFilters<'_>,
) -> Result<Vec<CatalogCardRow>, DbError> {
    // The ordering fragments are fixed strings selected by enum match; no
    // user input is ever interpolated into the SQL text.
    let (extra_where, order_by) = match ordering {
        CatalogOrdering::Date => ("TRUE", "p.created_at DESC, p.id DESC"),
        CatalogOrdering::PriceAsc => {
            ("TRUE", "price_num ASC NULLS LAST, p.id")
        }
        CatalogOrdering::PriceDesc => {
            ("TRUE", "price_num DESC NULLS LAST, p.id")
        }
        CatalogOrdering::SalePercentage(MetaKey::SalePercentageHighest) => (
            "hi.id IS NOT NULL",
            "hi.meta_value::numeric DESC, p.id",
        ),
        CatalogOrdering::SalePercentage(_) => (
            "lo.id IS NOT NULL",
            "lo.meta_value::numeric DESC, p.id",
        ),
    };

    let sql = format!(
        "SELECT \
             p.id AS product_id, p.name, p.slug, p.kind, \
             COALESCE(NULLIF(lo.meta_value, '')::INT, 0) AS sale_percentage, \
             COALESCE(NULLIF(hi.meta_value, '')::INT, 0) AS sale_percentage_highest, \
             CASE WHEN regular.meta_value ~ $2 \
                  THEN regular.meta_value::numeric END AS regular_price, \
             CASE WHEN sale.meta_value ~ $2 \
                  THEN sale.meta_value::numeric END AS sale_price, \
             CASE WHEN price.meta_value ~ $2 \
                  THEN price.meta_value::numeric END AS price_num \
         FROM products p \
         LEFT JOIN product_meta lo \
                ON lo.product_id = p.id AND lo.meta_key = '_sale_percentage' \
         LEFT JOIN product_meta hi \
                ON hi.product_id = p.id AND hi.meta_key = '_sale_percentage_highest' \
         LEFT JOIN product_meta regular \
                ON regular.product_id = p.id AND regular.meta_key = '_regular_price' \
         LEFT JOIN product_meta sale \
                ON sale.product_id = p.id AND sale.meta_key = '_sale_price' \
         LEFT JOIN product_meta price \
                ON price.product_id = p.id AND price.meta_key = 'price' \
         WHERE p.kind <> 'variation' \
           AND p.status = 'publish' \
           AND ($1::TEXT IS NULL OR EXISTS (\
                 SELECT 1 FROM product_categories pc \
                 JOIN categories c ON c.id = pc.category_id \
                 WHERE pc.product_id = p.id AND c.slug = $1\
           )) \
           AND {extra_where} \
         ORDER BY {order_by} \
         LIMIT $3"
    );

    let rows = sqlx::query_as::<_, CatalogCardRow>(&sql)
        .bind(filters.category_slug)
        .bind(NUMERIC_PATTERN)
        .bind(filters.limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
