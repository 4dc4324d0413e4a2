use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod asins;
mod export;
mod scrape;
mod status;

use asins::AsinsCommands;

#[derive(Debug, Parser)]
#[command(name = "asindb-cli")]
#[command(about = "Scrape manufacturer and responsible-party disclosures for ASINs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Manage the ASINs registered for scraping
    Asins {
        #[command(subcommand)]
        command: AsinsCommands,
    },
    /// Scrape every pending ASIN in batches and store the results
    Scrape {
        /// Only take the first N pending ASINs
        #[arg(long)]
        limit: Option<i64>,
        /// Show what would be scraped without fetching or writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Scrape the given ASINs without a database and print JSON results
    Fetch {
        #[arg(required = true)]
        asins: Vec<String>,
    },
    /// Write scraped disclosures as tab-separated rows
    Export {
        /// Output file; defaults to stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Only export rows scraped since the last export
        #[arg(long)]
        new_only: bool,
    },
    /// Show scrape job status and ASIN counts
    Status {
        /// Job id; defaults to the most recent job
        #[arg(long)]
        job: Option<i64>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --help and argument errors must not depend on the environment.
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("asindb-cli: no command given, see --help");
        return Ok(());
    };

    dotenvy::dotenv().ok();
    let config = asindb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Fetch { asins } => scrape::run_fetch(&config, &asins).await,
        Commands::Db { command } => {
            let pool = asindb_db::connect_pool_from_config(&config).await?;
            run_db(&pool, command).await
        }
        Commands::Asins { command } => {
            let pool = asindb_db::connect_pool_from_config(&config).await?;
            asins::run_asins(&pool, command).await
        }
        Commands::Scrape { limit, dry_run } => {
            let pool = asindb_db::connect_pool_from_config(&config).await?;
            scrape::run_scrape(&pool, &config, limit, dry_run).await
        }
        Commands::Export { output, new_only } => {
            let pool = asindb_db::connect_pool_from_config(&config).await?;
            export::run_export(&pool, output.as_deref(), new_only).await
        }
        Commands::Status { job } => {
            let pool = asindb_db::connect_pool_from_config(&config).await?;
            status::run_status(&pool, job).await
        }
    }
}

async fn run_db(pool: &sqlx::PgPool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            asindb_db::ping(pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = asindb_db::run_migrations(pool).await?;
            tracing::info!(applied, "migrations complete");
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}

/// Marks a scrape job as failed, logging instead of propagating if that
/// update fails too.
pub(crate) async fn fail_job_best_effort(pool: &sqlx::PgPool, job_id: i64, message: &str) {
    if let Err(mark_err) = asindb_db::fail_scrape_job(pool, job_id, message).await {
        tracing::error!(
            job_id,
            error = %mark_err,
            "failed to mark scrape job as failed"
        );
    }
}

#[cfg(test)]
mod tests;
