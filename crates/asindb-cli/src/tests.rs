use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["asindb-cli", "db", "ping"]).expect("expected valid cli args");

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
        Cli::try_parse_from(["asindb-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["asindb-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_asins_import_with_file() {
    let cli = Cli::try_parse_from(["asindb-cli", "asins", "import", "sheet.csv"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Asins {
            command: AsinsCommands::Import { ref file }
        }) if file == &PathBuf::from("sheet.csv")
    ));
}

#[test]
fn asins_add_requires_at_least_one_value() {
    assert!(Cli::try_parse_from(["asindb-cli", "asins", "add"]).is_err());

    let cli = Cli::try_parse_from(["asindb-cli", "asins", "add", "B07XHL9S65", "B0PAN"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Asins {
            command: AsinsCommands::Add { ref asins }
        }) if asins.len() == 2
    ));
}

#[test]
fn scrape_defaults_to_all_pending() {
    let cli = Cli::try_parse_from(["asindb-cli", "scrape"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            limit: None,
            dry_run: false
        })
    ));
}

#[test]
fn scrape_with_limit_and_dry_run() {
    let cli =
        Cli::try_parse_from(["asindb-cli", "scrape", "--limit", "50", "--dry-run"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            limit: Some(50),
            dry_run: true
        })
    ));
}

#[test]
fn fetch_requires_an_asin() {
    assert!(Cli::try_parse_from(["asindb-cli", "fetch"]).is_err());

    let cli = Cli::try_parse_from(["asindb-cli", "fetch", "B07XHL9S65"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Fetch { ref asins }) if asins == &["B07XHL9S65".to_string()]
    ));
}

#[test]
fn export_accepts_output_and_new_only() {
    let cli =
        Cli::try_parse_from(["asindb-cli", "export", "-o", "out.tsv", "--new-only"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Export {
            output: Some(ref path),
            new_only: true
        }) if path == &PathBuf::from("out.tsv")
    ));
}

#[test]
fn status_accepts_job_id() {
    let cli = Cli::try_parse_from(["asindb-cli", "status", "--job", "12"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Status { job: Some(12) })
    ));
}

#[test]
fn status_rejects_non_numeric_job_id() {
    assert!(Cli::try_parse_from(["asindb-cli", "status", "--job", "latest"]).is_err());
}

#[test]
fn help_is_handled_by_the_parser() {
    let err = Cli::try_parse_from(["asindb-cli", "--help"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);

    let err = Cli::try_parse_from(["asindb-cli", "scrape", "--help"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}
