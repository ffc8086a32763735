mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use saleflash_engine::{HookBus, MetaObserver, PercentageEngine};

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(saleflash_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = saleflash_db::PoolConfig::from_app_config(&config);
    let pool = saleflash_db::connect_pool(&config.database_url, pool_config).await?;
    saleflash_db::run_migrations(&pool).await?;

    // The engine subscribes once at startup; every metadata write performed
    // by a request handler dispatches through this bus before responding.
    let mut hooks = HookBus::new();
    hooks.subscribe(Arc::new(PercentageEngine::new(pool.clone())) as Arc<dyn MetaObserver>);
    let hooks = Arc::new(hooks);

    let auth = AuthState::from_env(matches!(
        config.env,
        saleflash_core::Environment::Development
    ))?;
    let app = build_app(AppState { pool, hooks }, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "saleflash-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
