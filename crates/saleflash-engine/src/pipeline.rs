//! Event routing and recompute orchestration.

use async_trait::async_trait;
use sqlx::PgPool;

use saleflash_core::ProductKind;
use saleflash_db::{percentage, products, DerivedPercentages};

use crate::hooks::{MetaChange, MetaChangeKind, MetaObserver};
use crate::EngineError;

/// Computes and persists the two derived percentage fields.
///
/// Owns nothing but a pool handle; every operation is a pure function of the
/// stored price pairs, so repeated invocations with unchanged inputs store
/// identical values.
#[derive(Clone)]
pub struct PercentageEngine {
    pool: PgPool,
}

impl PercentageEngine {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Recomputes and stores both derived fields for a product.
    ///
    /// A variation id resolves to its parent first; the derived fields only
    /// ever live on the parent. If the resolved product has any variation
    /// (regardless of status), the aggregate runs over its published
    /// variations; otherwise over the product's own price pair. An empty
    /// aggregation set stores zeros. A missing product is a logged no-op
    /// returning `None`, never an error.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] if a query or write fails.
    pub async fn recompute(
        &self,
        product_id: i64,
    ) -> Result<Option<DerivedPercentages>, EngineError> {
        let Some(mut target) = products::get_product(&self.pool, product_id).await? else {
            tracing::warn!(product_id, "recompute target does not exist; skipping");
            return Ok(None);
        };

        if target.kind.parse::<ProductKind>() == Ok(ProductKind::Variation) {
            let Some(parent_id) = target.parent_id else {
                tracing::warn!(product_id, "variation has no parent; skipping recompute");
                return Ok(None);
            };
            let Some(parent) = products::get_product(&self.pool, parent_id).await? else {
                tracing::warn!(
                    product_id,
                    parent_id,
                    "variation parent does not exist; skipping recompute"
                );
                return Ok(None);
            };
            target = parent;
        }

        let over_variations = percentage::has_variations(&self.pool, target.id).await?;
        let aggregated =
            percentage::aggregate_sale_percentages(&self.pool, target.id, over_variations)
                .await?
                .unwrap_or(DerivedPercentages::ZERO);

        percentage::write_derived_percentages(&self.pool, target.id, aggregated).await?;

        tracing::debug!(
            product_id = target.id,
            lowest = aggregated.lowest,
            highest = aggregated.highest,
            over_variations,
            "stored derived sale percentages"
        );
        Ok(Some(aggregated))
    }

    /// Writes both derived fields as zero without recomputation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] if the write fails.
    pub async fn reset_to_zero(&self, product_id: i64) -> Result<(), EngineError> {
        percentage::write_derived_percentages(&self.pool, product_id, DerivedPercentages::ZERO)
            .await?;
        Ok(())
    }

    /// Routes one metadata-change event.
    ///
    /// Non-price keys are ignored. A variation event always rolls up to the
    /// parent. On the add/update path only `simple | variable | bundle`
    /// products recompute themselves; on the delete path any non-variation
    /// product resets to zero directly.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] if a query or write fails.
    pub async fn apply(&self, change: &MetaChange) -> Result<(), EngineError> {
        if !change.meta_key.is_price_field() {
            return Ok(());
        }

        let Some(product) = products::get_product(&self.pool, change.product_id).await? else {
            tracing::warn!(
                product_id = change.product_id,
                "metadata change for unknown product; skipping"
            );
            return Ok(());
        };

        let Ok(kind) = product.kind.parse::<ProductKind>() else {
            return Ok(());
        };

        match change.kind {
            MetaChangeKind::Added | MetaChangeKind::Updated => {
                if kind.is_variation() {
                    if let Some(parent_id) = product.parent_id {
                        self.recompute(parent_id).await?;
                    } else {
                        tracing::warn!(
                            product_id = product.id,
                            "variation has no parent; skipping recompute"
                        );
                    }
                } else if kind.is_standalone() {
                    self.recompute(product.id).await?;
                }
            }
            MetaChangeKind::Deleted => {
                if kind.is_variation() {
                    if let Some(parent_id) = product.parent_id {
                        self.recompute(parent_id).await?;
                    } else {
                        tracing::warn!(
                            product_id = product.id,
                            "variation has no parent; skipping recompute"
                        );
                    }
                } else {
                    self.reset_to_zero(product.id).await?;
                }
            }
        }

        Ok(())
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MetaObserver for PercentageEngine {
    fn name(&self) -> &'static str {
        "percentage-engine"
    }

    async fn on_meta_change(&self, change: &MetaChange) -> Result<(), EngineError> {
        self.apply(change).await
    }
}

#[cfg(test)]
mod tests {
    use saleflash_core::MetaKey;
    use saleflash_db::{meta, percentage, products};

    use super::*;
    use crate::hooks::{MetaChange, MetaChangeKind};

    async fn seed_product(pool: &PgPool, slug: &str, kind: &str, parent_id: Option<i64>) -> i64 {
        products::insert_product(pool, &format!("Product {slug}"), slug, kind, "publish", parent_id)
            .await
            .expect("insert product")
            .id
    }

    async fn set_prices(pool: &PgPool, product_id: i64, regular: &str, sale: &str) {
        meta::upsert_product_meta(pool, product_id, MetaKey::RegularPrice, regular)
            .await
            .expect("set regular price");
        meta::upsert_product_meta(pool, product_id, MetaKey::SalePrice, sale)
            .await
            .expect("set sale price");
    }

    async fn stored(pool: &PgPool, product_id: i64) -> (i32, i32) {
        let derived = percentage::read_derived_percentages(pool, product_id)
            .await
            .expect("read derived");
        (derived.lowest, derived.highest)
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn simple_product_discount_is_floored(pool: PgPool) {
        let engine = PercentageEngine::new(pool.clone());
        let id = seed_product(&pool, "floored", "simple", None).await;
        set_prices(&pool, id, "100", "81").await;

        let result = engine.recompute(id).await.expect("recompute");
        assert_eq!(
            result,
            Some(DerivedPercentages {
                lowest: 18,
                highest: 18
            })
        );
        assert_eq!(stored(&pool, id).await, (18, 18));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn small_discount_still_stored(pool: PgPool) {
        // 100 -> 95 is 5%: below the default display minimum but the stored
        // value does not care about display rules.
        let engine = PercentageEngine::new(pool.clone());
        let id = seed_product(&pool, "small-discount", "simple", None).await;
        set_prices(&pool, id, "100", "95").await;

        engine.recompute(id).await.expect("recompute");
        assert_eq!(stored(&pool, id).await, (5, 5));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn variable_product_aggregates_min_and_max(pool: PgPool) {
        let engine = PercentageEngine::new(pool.clone());
        let parent = seed_product(&pool, "variable-agg", "variable", None).await;

        // Discounts 10, 25, 40.
        let v1 = seed_product(&pool, "variable-agg-v1", "variation", Some(parent)).await;
        set_prices(&pool, v1, "100", "90").await;
        let v2 = seed_product(&pool, "variable-agg-v2", "variation", Some(parent)).await;
        set_prices(&pool, v2, "200", "150").await;
        let v3 = seed_product(&pool, "variable-agg-v3", "variation", Some(parent)).await;
        set_prices(&pool, v3, "50", "30").await;

        engine.recompute(parent).await.expect("recompute");
        assert_eq!(stored(&pool, parent).await, (10, 40));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn draft_variations_are_excluded_from_aggregate(pool: PgPool) {
        let engine = PercentageEngine::new(pool.clone());
        let parent = seed_product(&pool, "draft-vars", "variable", None).await;

        let published = seed_product(&pool, "draft-vars-v1", "variation", Some(parent)).await;
        set_prices(&pool, published, "100", "80").await;

        let draft = products::insert_product(
            &pool,
            "Draft Variation",
            "draft-vars-v2",
            "variation",
            "draft",
            Some(parent),
        )
        .await
        .expect("insert draft variation")
        .id;
        set_prices(&pool, draft, "100", "10").await;

        engine.recompute(parent).await.expect("recompute");
        // Only the published variation's 20% counts; the draft's 90% does not.
        assert_eq!(stored(&pool, parent).await, (20, 20));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn all_draft_variations_take_variable_branch_and_store_zeros(pool: PgPool) {
        // The variation probe ignores status, so a product whose variations
        // are all drafts still aggregates over variations and lands on the
        // empty set, even if the parent has its own sale price.
        let engine = PercentageEngine::new(pool.clone());
        let parent = seed_product(&pool, "all-drafts", "variable", None).await;
        set_prices(&pool, parent, "100", "50").await;

        let draft = products::insert_product(
            &pool,
            "Draft Only",
            "all-drafts-v1",
            "variation",
            "draft",
            Some(parent),
        )
        .await
        .expect("insert draft variation")
        .id;
        set_prices(&pool, draft, "100", "40").await;

        engine.recompute(parent).await.expect("recompute");
        assert_eq!(stored(&pool, parent).await, (0, 0));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn zero_regular_price_is_excluded_not_divided(pool: PgPool) {
        let engine = PercentageEngine::new(pool.clone());
        let id = seed_product(&pool, "zero-regular", "simple", None).await;
        set_prices(&pool, id, "0", "10").await;

        engine.recompute(id).await.expect("recompute");
        assert_eq!(stored(&pool, id).await, (0, 0));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn blank_sale_price_means_not_on_sale(pool: PgPool) {
        let engine = PercentageEngine::new(pool.clone());
        let id = seed_product(&pool, "blank-sale", "simple", None).await;
        set_prices(&pool, id, "100", "").await;

        engine.recompute(id).await.expect("recompute");
        assert_eq!(stored(&pool, id).await, (0, 0));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn malformed_price_meta_is_excluded(pool: PgPool) {
        let engine = PercentageEngine::new(pool.clone());
        let id = seed_product(&pool, "garbage-price", "simple", None).await;
        set_prices(&pool, id, "abc", "80").await;

        engine.recompute(id).await.expect("recompute");
        assert_eq!(stored(&pool, id).await, (0, 0));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn recompute_is_idempotent(pool: PgPool) {
        let engine = PercentageEngine::new(pool.clone());
        let id = seed_product(&pool, "idempotent", "simple", None).await;
        set_prices(&pool, id, "300", "250").await;

        let first = engine.recompute(id).await.expect("first recompute");
        let second = engine.recompute(id).await.expect("second recompute");
        assert_eq!(first, second);
        assert_eq!(stored(&pool, id).await, (16, 16));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn recompute_of_variation_id_resolves_to_parent(pool: PgPool) {
        let engine = PercentageEngine::new(pool.clone());
        let parent = seed_product(&pool, "resolve-parent", "variable", None).await;
        let variation = seed_product(&pool, "resolve-parent-v1", "variation", Some(parent)).await;
        set_prices(&pool, variation, "100", "70").await;

        let result = engine.recompute(variation).await.expect("recompute");
        assert_eq!(
            result,
            Some(DerivedPercentages {
                lowest: 30,
                highest: 30
            })
        );
        // The parent carries the stored fields; the variation stays bare.
        assert_eq!(stored(&pool, parent).await, (30, 30));
        assert_eq!(
            meta::get_product_meta(&pool, variation, MetaKey::SalePercentage)
                .await
                .expect("read variation meta"),
            None
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn recompute_of_missing_product_is_a_no_op(pool: PgPool) {
        let engine = PercentageEngine::new(pool);
        let result = engine.recompute(999_999).await.expect("recompute");
        assert_eq!(result, None);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn variation_event_updates_parent_not_variation(pool: PgPool) {
        let engine = PercentageEngine::new(pool.clone());
        let parent = seed_product(&pool, "rollup", "variable", None).await;
        let variation = seed_product(&pool, "rollup-v1", "variation", Some(parent)).await;
        set_prices(&pool, variation, "100", "70").await;

        engine
            .apply(&MetaChange {
                product_id: variation,
                meta_key: MetaKey::SalePrice,
                kind: MetaChangeKind::Updated,
            })
            .await
            .expect("apply");

        assert_eq!(stored(&pool, parent).await, (30, 30));
        // The variation itself never carries stored percentages.
        assert_eq!(stored(&pool, variation).await, (0, 0));
        assert_eq!(
            meta::get_product_meta(&pool, variation, MetaKey::SalePercentage)
                .await
                .expect("read variation meta"),
            None
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn delete_event_on_simple_product_resets_to_zero(pool: PgPool) {
        let engine = PercentageEngine::new(pool.clone());
        let id = seed_product(&pool, "delete-reset", "simple", None).await;
        set_prices(&pool, id, "100", "60").await;
        engine.recompute(id).await.expect("recompute");
        assert_eq!(stored(&pool, id).await, (40, 40));

        meta::delete_product_meta(&pool, id, MetaKey::SalePrice)
            .await
            .expect("delete sale price");
        engine
            .apply(&MetaChange {
                product_id: id,
                meta_key: MetaKey::SalePrice,
                kind: MetaChangeKind::Deleted,
            })
            .await
            .expect("apply");

        assert_eq!(stored(&pool, id).await, (0, 0));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn delete_event_on_variation_recomputes_parent(pool: PgPool) {
        let engine = PercentageEngine::new(pool.clone());
        let parent = seed_product(&pool, "delete-rollup", "variable", None).await;
        let v1 = seed_product(&pool, "delete-rollup-v1", "variation", Some(parent)).await;
        set_prices(&pool, v1, "100", "80").await;
        let v2 = seed_product(&pool, "delete-rollup-v2", "variation", Some(parent)).await;
        set_prices(&pool, v2, "100", "50").await;
        engine.recompute(parent).await.expect("recompute");
        assert_eq!(stored(&pool, parent).await, (20, 50));

        meta::delete_product_meta(&pool, v2, MetaKey::SalePrice)
            .await
            .expect("delete sale price");
        engine
            .apply(&MetaChange {
                product_id: v2,
                meta_key: MetaKey::SalePrice,
                kind: MetaChangeKind::Deleted,
            })
            .await
            .expect("apply");

        assert_eq!(stored(&pool, parent).await, (20, 20));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn non_price_keys_are_ignored(pool: PgPool) {
        let engine = PercentageEngine::new(pool.clone());
        let id = seed_product(&pool, "non-price", "simple", None).await;
        set_prices(&pool, id, "100", "50").await;

        // An event for an engine-owned key must not trigger anything.
        engine
            .apply(&MetaChange {
                product_id: id,
                meta_key: MetaKey::SalePercentage,
                kind: MetaChangeKind::Updated,
            })
            .await
            .expect("apply");

        assert_eq!(stored(&pool, id).await, (0, 0));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn unchanged_meta_upsert_reports_no_change(pool: PgPool) {
        let id = seed_product(&pool, "no-op-write", "simple", None).await;

        let first = meta::upsert_product_meta(&pool, id, MetaKey::SalePrice, "80")
            .await
            .expect("first write");
        assert!(first.changed());

        let second = meta::upsert_product_meta(&pool, id, MetaKey::SalePrice, "80")
            .await
            .expect("second write");
        assert!(!second.changed());

        let third = meta::upsert_product_meta(&pool, id, MetaKey::SalePrice, "75")
            .await
            .expect("third write");
        assert!(third.changed());
    }
}
