//! Database operations for the `product_meta` key/value table.

use saleflash_core::MetaKey;
use sqlx::PgPool;

use crate::DbError;

/// What an upsert actually did to the stored value.
///
/// Callers dispatch metadata-change events only for `Added` and `Updated`,
/// mirroring the host platform's only-notify-on-actual-change behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaChangeOutcome {
    Added,
    Updated,
    Unchanged,
}

impl MetaChangeOutcome {
    #[must_use]
    pub fn changed(self) -> bool {
        !matches!(self, MetaChangeOutcome::Unchanged)
    }
}

/// Upserts a metadata value, detecting no-op writes in SQL.
///
/// The conditional `DO UPDATE ... WHERE IS DISTINCT FROM` makes an identical
/// value a true no-op in a single round-trip: no row comes back, no
/// `updated_at` churn, and the caller knows not to fire an event.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails (e.g. unknown product id).
pub async fn upsert_product_meta(
    pool: &PgPool,
    product_id: i64,
    meta_key: MetaKey,
    meta_value: &str,
) -> Result<MetaChangeOutcome, DbError> {
    let inserted = sqlx::query_scalar::<_, bool>(
        "INSERT INTO product_meta (product_id, meta_key, meta_value) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (product_id, meta_key) DO UPDATE SET \
             meta_value = EXCLUDED.meta_value, \
             updated_at = NOW() \
         WHERE product_meta.meta_value IS DISTINCT FROM EXCLUDED.meta_value \
         RETURNING (xmax = 0) AS inserted",
    )
    .bind(product_id)
    .bind(meta_key.as_str())
    .bind(meta_value)
    .fetch_optional(pool)
    .await?;

    Ok(match inserted {
        Some(true) => MetaChangeOutcome::Added,
        Some(false) => MetaChangeOutcome::Updated,
        None => MetaChangeOutcome::Unchanged,
    })
}

/// Deletes a metadata row. Returns `true` if a row existed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product_meta(
    pool: &PgPool,
    product_id: i64,
    meta_key: MetaKey,
) -> Result<bool, DbError> {
    let rows_affected = sqlx::query(
        "DELETE FROM product_meta WHERE product_id = $1 AND meta_key = $2",
    )
    .bind(product_id)
    .bind(meta_key.as_str())
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows_affected > 0)
}

/// Reads a metadata value, or `None` when the row is absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_meta(
    pool: &PgPool,
    product_id: i64,
    meta_key: MetaKey,
) -> Result<Option<String>, DbError> {
    let value = sqlx::query_scalar::<_, String>(
        "SELECT meta_value FROM product_meta WHERE product_id = $1 AND meta_key = $2",
    )
    .bind(product_id)
    .bind(meta_key.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_changed_classification() {
        assert!(MetaChangeOutcome::Added.changed());
        assert!(MetaChangeOutcome::Updated.changed());
        assert!(!MetaChangeOutcome::Unchanged.changed());
    }
}
