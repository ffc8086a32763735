//! The `refresh` command: manual recomputation of stored percentages.
//!
//! `--all` walks every non-variation product; `--ids` takes a comma-separated
//! list and silently skips tokens that are not numeric, the same tolerance
//! the id parser applies everywhere. A batch stops at the first database
//! error.

use saleflash_engine::{
    parse_product_ids, refresh_all_products, refresh_products, PercentageEngine,
};

use crate::RefreshArgs;

pub async fn run(args: RefreshArgs) -> anyhow::Result<()> {
    let pool = saleflash_db::connect_pool_from_env().await?;
    let engine = PercentageEngine::new(pool);

    let processed = if args.all {
        tracing::info!("refreshing sale percentages for all products");
        refresh_all_products(&engine).await?
    } else if let Some(raw) = args.ids.as_deref() {
        let ids = parse_product_ids(raw);
        if ids.is_empty() {
            anyhow::bail!("--ids contained no usable product ids: {raw:?}");
        }
        tracing::info!(count = ids.len(), "refreshing sale percentages by id");
        refresh_products(&engine, &ids).await?
    } else {
        anyhow::bail!("provide --ids <comma-separated ids> or --all");
    };

    println!("Sale percentages updated for {processed} product(s).");
    Ok(())
}
