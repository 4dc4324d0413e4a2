//! `status` command handler.

use asindb_db::ScrapeJobRow;

pub(crate) async fn run_status(pool: &sqlx::PgPool, job_id: Option<i64>) -> anyhow::Result<()> {
    let job = match job_id {
        Some(id) => Some(asindb_db::get_scrape_job(pool, id).await.map_err(|e| match e {
            asindb_db::DbError::NotFound => anyhow::anyhow!("scrape job {id} not found"),
            other => other.into(),
        })?),
        None => asindb_db::latest_scrape_job(pool).await?,
    };

    match job {
        Some(job) => {
            println!("{}", describe_job(&job));
            let batches = asindb_db::list_scrape_job_batches(pool, job.id).await?;
            for batch in &batches {
                println!(
                    "  batch {:>3}  {:<9}  requested {:>4}  stored {:>4}  failed {:>4}{}",
                    batch.batch_index,
                    batch.status,
                    batch.asins_requested,
                    batch.results_stored,
                    batch.asins_failed,
                    batch
                        .error_message
                        .as_deref()
                        .map(|m| format!("  ({m})"))
                        .unwrap_or_default(),
                );
            }
        }
        None => println!("no scrape jobs yet"),
    }

    let (total, pending, unexported) = asindb_db::asin_counts(pool).await?;
    println!("asins: {total} total, {pending} pending, {unexported} not yet exported");
    Ok(())
}

fn describe_job(job: &ScrapeJobRow) -> String {
    let mut line = format!(
        "job {} ({}): {}  requested {}  stored {}",
        job.id, job.public_id, job.status, job.asins_requested, job.results_stored
    );
    if let Some(started) = job.started_at {
        line.push_str(&format!("  started {}", started.format("%Y-%m-%d %H:%M:%S")));
    }
    if let Some(completed) = job.completed_at {
        line.push_str(&format!("  completed {}", completed.format("%Y-%m-%d %H:%M:%S")));
    }
    if let Some(message) = &job.error_message {
        line.push_str(&format!("\n  error: {message}"));
    }
    line
}
