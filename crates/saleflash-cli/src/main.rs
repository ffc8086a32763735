mod db;
mod refresh;

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "saleflash-cli")]
#[command(about = "Sale percentage engine command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Recompute stored sale percentages
    Refresh(RefreshArgs),
    /// Database management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Args)]
struct RefreshArgs {
    /// Comma-separated product ids to recompute
    #[arg(long, value_name = "IDS")]
    ids: Option<String>,
    /// Recompute every non-variation product instead
    #[arg(long)]
    all: bool,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Verify database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert categories from the configured YAML file
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Refresh(args)) => refresh::run(args).await,
        Some(Commands::Db { command }) => db::run(command).await,
        None => {
            println!("saleflash-cli: use `refresh` or `db` (see --help)");
            Ok(())
        }
    }
}
