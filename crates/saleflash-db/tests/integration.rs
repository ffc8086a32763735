//! Offline unit tests for saleflash-db pool configuration and row types.
//! These tests do not require a live database connection.

use saleflash_core::{AppConfig, Environment, MetaKey};
use saleflash_db::{CatalogOrdering, DerivedPercentages, PoolConfig, ProductRow, VariationPrices};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        categories_path: PathBuf::from("./config/categories.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`ProductRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn product_row_has_expected_fields() {
    use chrono::Utc;

    let row = ProductRow {
        id: 2165_i64,
        name: "Garden Chair".to_string(),
        slug: "garden-chair".to_string(),
        kind: "simple".to_string(),
        status: "publish".to_string(),
        parent_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.id, 2165);
    assert_eq!(row.kind, "simple");
    assert_eq!(row.status, "publish");
    assert!(row.parent_id.is_none());
}

#[test]
fn variation_prices_row_allows_absent_prices() {
    let row = VariationPrices {
        id: 7_i64,
        name: "Garden Chair - Green".to_string(),
        slug: "garden-chair-green".to_string(),
        regular_price: None,
        sale_price: None,
    };

    assert!(row.regular_price.is_none());
    assert!(row.sale_price.is_none());
}

#[test]
fn derived_percentages_zero_constant() {
    assert_eq!(
        DerivedPercentages::ZERO,
        DerivedPercentages {
            lowest: 0,
            highest: 0
        }
    );
}

#[test]
fn catalog_ordering_carries_display_mode_meta_key() {
    let ordering = CatalogOrdering::SalePercentage(MetaKey::SalePercentageHighest);
    assert_eq!(
        ordering,
        CatalogOrdering::SalePercentage(MetaKey::SalePercentageHighest)
    );
    assert_ne!(
        ordering,
        CatalogOrdering::SalePercentage(MetaKey::SalePercentage)
    );
}
