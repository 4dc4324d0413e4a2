//! `export` command handler: writes scraped disclosures as TSV, one contact
//! pair per row, and flags the exported ASINs.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use asindb_core::{flatten_results, ExportSheet, EXPORT_HEADINGS};

pub(crate) async fn run_export(
    pool: &sqlx::PgPool,
    output: Option<&Path>,
    new_only: bool,
) -> anyhow::Result<()> {
    let rows = asindb_db::list_scraped_asins(pool, new_only).await?;

    let mut results = Vec::with_capacity(rows.len());
    let mut exported = Vec::with_capacity(rows.len());
    for row in &rows {
        match row.to_result() {
            Ok(result) => {
                results.push(result);
                exported.push(row.asin.clone());
            }
            Err(err) => {
                tracing::warn!(asin = %row.asin, error = %err, "skipping undecodable row");
            }
        }
    }

    let sheet = flatten_results(&results);

    match output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_tsv(&mut writer, &sheet)?;
            writer.flush()?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            write_tsv(&mut stdout, &sheet)?;
            stdout.flush()?;
        }
    }

    let marked = asindb_db::mark_exported(pool, &exported).await?;
    tracing::info!(
        asins = results.len(),
        rows = sheet.rows.len(),
        merged = sheet.merge_spans.len(),
        marked,
        "export complete"
    );
    if let Some(path) = output {
        println!(
            "exported {} ASIN(s) as {} row(s) to {}",
            results.len(),
            sheet.rows.len(),
            path.display()
        );
    }
    Ok(())
}

fn write_tsv<W: Write>(out: &mut W, sheet: &ExportSheet) -> io::Result<()> {
    writeln!(out, "{}", EXPORT_HEADINGS.join("\t"))?;
    for row in &sheet.rows {
        let cells: Vec<Cow<'_, str>> = row.cells().into_iter().map(tsv_cell).collect();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    Ok(())
}

/// Tabs and line breaks inside a value would break the row structure.
fn tsv_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\t', '\n', '\r']) {
        Cow::Owned(value.replace(['\t', '\n', '\r'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
