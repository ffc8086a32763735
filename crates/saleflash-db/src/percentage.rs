//! The sale-percentage aggregate: the one real query in the system.
//!
//! Percentages are computed in SQL with `FLOOR((regular - sale) / regular *
//! 100)` over either a product's published variations or its own price pair.
//! Entries without a usable pair never reach the division: a sale price must
//! be a non-blank decimal string, and a regular price must be a decimal
//! string strictly greater than zero.

use sqlx::PgPool;

use saleflash_core::MetaKey;

use crate::products::NUMERIC_PATTERN;
use crate::{meta, DbError};

/// The two engine-owned derived fields for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedPercentages {
    /// Smallest discount (`_sale_percentage`).
    pub lowest: i32,
    /// Largest discount (`_sale_percentage_highest`).
    pub highest: i32,
}

impl DerivedPercentages {
    pub const ZERO: Self = Self {
        lowest: 0,
        highest: 0,
    };
}

#[derive(Debug, sqlx::FromRow)]
struct AggregateRow {
    lowest: Option<i32>,
    highest: Option<i32>,
}

/// Probes whether a product has any variation at all, regardless of status.
///
/// Deliberately looser than the aggregate, which only considers published
/// variations: a product whose variations are all drafts still takes the
/// variable branch and lands on the empty-set outcome.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn has_variations(pool: &PgPool, product_id: i64) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (\
             SELECT 1 FROM products WHERE kind = 'variation' AND parent_id = $1\
         )",
    )
    .bind(product_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Computes the min/max discount percentages for a product.
///
/// When `over_variations` is `true` the aggregate runs over the product's
/// published variations; otherwise over the product's own price pair.
/// Returns `None` when no entry has a usable regular/sale pair.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn aggregate_sale_percentages(
    pool: &PgPool,
    product_id: i64,
    over_variations: bool,
) -> Result<Option<DerivedPercentages>, DbError> {
    let scope = if over_variations {
        "p.kind = 'variation' AND p.parent_id = $1 AND p.status = 'publish'"
    } else {
        "p.id = $1"
    };

    let sql = format!(
        "SELECT MIN(discounts.pct)::INT AS lowest, MAX(discounts.pct)::INT AS highest \
         FROM (\
             SELECT FLOOR(\
                 (regular.meta_value::numeric - sale.meta_value::numeric) \
                 / regular.meta_value::numeric * 100\
             ) AS pct \
             FROM products p \
             JOIN product_meta sale \
               ON sale.product_id = p.id AND sale.meta_key = '_sale_price' \
             JOIN product_meta regular \
               ON regular.product_id = p.id AND regular.meta_key = '_regular_price' \
             WHERE {scope} \
               AND sale.meta_value <> '' \
               AND sale.meta_value ~ $2 \
               AND regular.meta_value ~ $2 \
               AND regular.meta_value::numeric > 0\
         ) AS discounts"
    );

    let row = sqlx::query_as::<_, AggregateRow>(&sql)
        .bind(product_id)
        .bind(NUMERIC_PATTERN)
        .fetch_one(pool)
        .await?;

    Ok(match (row.lowest, row.highest) {
        (Some(lowest), Some(highest)) => Some(DerivedPercentages { lowest, highest }),
        _ => None,
    })
}

/// Writes both derived fields on a product.
///
/// These are plain meta upserts; derived keys are not price fields, so no
/// change event ever fires for them.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either write fails.
pub async fn write_derived_percentages(
    pool: &PgPool,
    product_id: i64,
    percentages: DerivedPercentages,
) -> Result<(), DbError> {
    meta::upsert_product_meta(
        pool,
        product_id,
        MetaKey::SalePercentage,
        &percentages.lowest.to_string(),
    )
    .await?;
    meta::upsert_product_meta(
        pool,
        product_id,
        MetaKey::SalePercentageHighest,
        &percentages.highest.to_string(),
    )
    .await?;
    Ok(())
}

/// Reads the stored derived fields for a product.
///
/// Absent or unparseable values read as `0`, the same degraded outcome the
/// display layer would produce for a product that was never on sale.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either read fails.
pub async fn read_derived_percentages(
    pool: &PgPool,
    product_id: i64,
) -> Result<DerivedPercentages, DbError> {
    let lowest = read_percentage_meta(pool, product_id, MetaKey::SalePercentage).await?;
    let highest = read_percentage_meta(pool, product_id, MetaKey::SalePercentageHighest).await?;
    Ok(DerivedPercentages { lowest, highest })
}

async fn read_percentage_meta(
    pool: &PgPool,
    product_id: i64,
    meta_key: MetaKey,
) -> Result<i32, DbError> {
    let value = meta::get_product_meta(pool, product_id, meta_key).await?;
    Ok(value
        .and_then(|v| v.trim().parse::<i32>().ok())
        .unwrap_or(0))
}
