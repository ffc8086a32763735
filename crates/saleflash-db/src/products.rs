//! Database operations for `products`, `categories`, and `product_categories`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// Pattern accepted as a decimal price value in `product_meta`.
///
/// The host catalog stores prices as free-form strings; anything not matching
/// this pattern is treated the same as "no price" wherever a cast would
/// otherwise fail.
pub(crate) const NUMERIC_PATTERN: &str = r"^-?[0-9]+(\.[0-9]+)?$";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// One of `simple`, `variable`, `bundle`, `variation`.
    pub kind: String,
    /// One of `publish`, `draft`, `pending`, `private`.
    pub status: String,
    /// Set for variations, pointing at the owning variable product.
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A published variation with its price pair resolved from metadata.
///
/// Prices are `NULL` when the meta row is absent, blank, or not a decimal
/// string, matching how the percentage aggregation treats such values.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariationPrices {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub regular_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// products operations
// ---------------------------------------------------------------------------

/// Inserts a product row and returns it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (e.g. duplicate slug).
pub async fn insert_product(
    pool: &PgPool,
    name: &str,
    slug: &str,
    kind: &str,
    status: &str,
    parent_id: Option<i64>,
) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products (name, slug, kind, status, parent_id) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, name, slug, kind, status, parent_id, created_at, updated_at",
    )
    .bind(name)
    .bind(slug)
    .bind(kind)
    .bind(status)
    .bind(parent_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a product by id, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, product_id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, slug, kind, status, parent_id, created_at, updated_at \
         FROM products \
         WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Lists the ids of all non-variation products, oldest first.
///
/// Variations are excluded because their percentages live on the parent; this
/// is the id set the bulk refresh walks.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_product_ids(pool: &PgPool) -> Result<Vec<i64>, DbError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM products WHERE kind <> 'variation' ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Lists a product's published variations with their price pairs.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_published_variations(
    pool: &PgPool,
    parent_id: i64,
) -> Result<Vec<VariationPrices>, DbError> {
    let rows = sqlx::query_as::<_, VariationPrices>(
        "SELECT \
             p.id, p.name, p.slug, \
             CASE WHEN regular.meta_value ~ $2 \
                  THEN regular.meta_value::numeric END AS regular_price, \
             CASE WHEN sale.meta_value ~ $2 \
                  THEN sale.meta_value::numeric END AS sale_price \
         FROM products p \
         LEFT JOIN product_meta regular \
                ON regular.product_id = p.id AND regular.meta_key = '_regular_price' \
         LEFT JOIN product_meta sale \
                ON sale.product_id = p.id AND sale.meta_key = '_sale_price' \
         WHERE p.kind = 'variation' \
           AND p.parent_id = $1 \
           AND p.status = 'publish' \
         ORDER BY p.id",
    )
    .bind(parent_id)
    .bind(NUMERIC_PATTERN)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// categories operations
// ---------------------------------------------------------------------------

/// Fetches a category by slug, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, slug, name, created_at FROM categories WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Replaces a product's category assignments with the given set.
///
/// Runs inside a transaction so a partial replacement is never visible.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails (e.g. unknown category id).
pub async fn set_product_categories(
    pool: &PgPool,
    product_id: i64,
    category_ids: &[i64],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM product_categories WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    for category_id in category_ids {
        sqlx::query(
            "INSERT INTO product_categories (product_id, category_id) \
             VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(product_id)
        .bind(category_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// The category ids a product belongs to, ascending.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_category_ids(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<i64>, DbError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT category_id FROM product_categories \
         WHERE product_id = $1 \
         ORDER BY category_id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
