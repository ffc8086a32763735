//! Bulk refresh used by the CLI.
//!
//! Invalid id tokens are silently skipped and missing products are logged
//! no-ops, but an unexpected database error halts the remaining batch and
//! surfaces to the operator.

use saleflash_db::products;

use crate::pipeline::PercentageEngine;
use crate::EngineError;

/// Parses a comma-separated id list, silently skipping blank and non-numeric
/// tokens.
#[must_use]
pub fn parse_product_ids(input: &str) -> Vec<i64> {
    input
        .trim()
        .trim_matches(',')
        .split(',')
        .filter_map(|token| token.trim().parse::<i64>().ok())
        .collect()
}

/// Recomputes the derived fields for each given product, fail-fast.
///
/// Returns the number of products actually recomputed; ids without a matching
/// product are skipped without counting.
///
/// # Errors
///
/// Returns [`EngineError::Db`] on the first database failure; the remaining
/// ids are not processed.
pub async fn refresh_products(
    engine: &PercentageEngine,
    product_ids: &[i64],
) -> Result<usize, EngineError> {
    let mut processed = 0usize;

    for &product_id in product_ids {
        if engine.recompute(product_id).await?.is_some() {
            processed += 1;
        }
    }

    Ok(processed)
}

/// Recomputes the derived fields for every non-variation product.
///
/// # Errors
///
/// Returns [`EngineError::Db`] if listing products or any recompute fails.
pub async fn refresh_all_products(engine: &PercentageEngine) -> Result<usize, EngineError> {
    let ids = products::list_product_ids(engine.pool()).await?;
    refresh_products(engine, &ids).await
}
