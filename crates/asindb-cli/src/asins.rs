//! `asins` command handlers: register identifiers for scraping.

use std::path::{Path, PathBuf};

use clap::Subcommand;

/// Sub-commands available under `asins`.
#[derive(Debug, Subcommand)]
pub enum AsinsCommands {
    /// Register ASINs from the second column of a CSV or TSV file (header row skipped)
    Import { file: PathBuf },
    /// Register ASINs given on the command line
    Add {
        #[arg(required = true)]
        asins: Vec<String>,
    },
}

pub(crate) async fn run_asins(pool: &sqlx::PgPool, command: AsinsCommands) -> anyhow::Result<()> {
    match command {
        AsinsCommands::Import { file } => run_asins_import(pool, &file).await,
        AsinsCommands::Add { asins } => register(pool, &asins).await,
    }
}

async fn run_asins_import(pool: &sqlx::PgPool, file: &Path) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", file.display()))?;
    let raw = parse_import(&content);
    tracing::info!(file = %file.display(), rows = raw.len(), "read import file");
    register(pool, &raw).await
}

async fn register(pool: &sqlx::PgPool, raw: &[String]) -> anyhow::Result<()> {
    let asins = asindb_scraper::prepare_asins(raw);
    if asins.is_empty() {
        println!("no valid ASINs to register");
        return Ok(());
    }

    let inserted = asindb_db::insert_asins_if_absent(pool, &asins).await?;
    let skipped = u64::try_from(asins.len())
        .unwrap_or(u64::MAX)
        .saturating_sub(inserted);
    tracing::info!(inserted, skipped, "registered ASINs");
    println!("registered {inserted} new ASIN(s), {skipped} already present or duplicated");
    Ok(())
}

/// Extracts the second column of every data row.
///
/// The first line is a header. Each line is split on tabs when it has any,
/// otherwise on commas. Quoted cells may contain the separator; whitespace
/// is trimmed and empty cells are dropped.
pub(crate) fn parse_import(content: &str) -> Vec<String> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let sep = if line.contains('\t') { '\t' } else { ',' };
            let cell = split_row(line, sep).into_iter().nth(1)?;
            let cell = cell.trim();
            (!cell.is_empty()).then(|| cell.to_string())
        })
        .collect()
}

/// Splits one delimited line, honouring double quotes and `""` escapes.
fn split_row(line: &str, sep: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    fields.push(field);
    fields
}
