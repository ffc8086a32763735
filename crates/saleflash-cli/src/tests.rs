use super::*;

#[test]
fn parses_db_ping_command() {
    let cli =
        Cli::try_parse_from(["saleflash-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["saleflash-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_db_seed_command() {
    let cli =
        Cli::try_parse_from(["saleflash-cli", "db", "seed"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Seed
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["saleflash-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn refresh_with_ids_captures_raw_list() {
    let cli = Cli::try_parse_from(["saleflash-cli", "refresh", "--ids", "2165,2166"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Refresh(RefreshArgs {
            ids: Some(ref raw),
            all: false
        })) if raw == "2165,2166"
    ));
}

#[test]
fn refresh_all_flag() {
    let cli =
        Cli::try_parse_from(["saleflash-cli", "refresh", "--all"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Refresh(RefreshArgs { ids: None, all: true }))
    ));
}

#[test]
fn refresh_without_flags_still_parses() {
    // The usage error for a missing selection is raised at run time, not by
    // the argument parser.
    let cli = Cli::try_parse_from(["saleflash-cli", "refresh"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Refresh(RefreshArgs {
            ids: None,
            all: false
        }))
    ));
}
