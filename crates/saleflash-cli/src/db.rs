//! The `db` command group: ping, migrate, seed.

use crate::DbCommands;

pub async fn run(command: DbCommands) -> anyhow::Result<()> {
    let pool = saleflash_db::connect_pool_from_env().await?;

    match command {
        DbCommands::Ping => {
            saleflash_db::ping(&pool).await?;
            println!("Database connection OK");
        }
        DbCommands::Migrate => {
            let applied = saleflash_db::run_migrations(&pool).await?;
            println!("Applied {applied} migration(s)");
        }
        DbCommands::Seed => {
            let config = saleflash_core::load_app_config()?;
            let categories_file = saleflash_core::load_categories(&config.categories_path)?;
            let seeded = saleflash_db::seed_categories(&pool, &categories_file.categories).await?;
            println!("Seeded {seeded} categories");
        }
    }

    Ok(())
}
