//! `folio check`: report bucket inconsistencies, optionally repairing
//! empty buckets.

use anyhow::Result;

use crate::config::Config;
use crate::session;

/// Returns whether every collection was clean (after repair, if requested).
pub async fn run_check(
    config: &Config,
    identity: Option<&str>,
    repair: bool,
    json: bool,
) -> Result<bool> {
    let catalog = session::open_catalog(config).await?;

    if repair {
        let editor = session::editor(config, identity)?;
        let removed = catalog.repair(&editor).await?;
        eprintln!("Removed {} empty bucket(s)", removed);
    }

    let reports = catalog.check().await?;
    let clean = reports.iter().all(|r| r.is_clean());

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(clean);
    }

    for report in &reports {
        let status = if report.is_clean() { "ok" } else { "issues" };
        println!(
            "{:<24} {:>3} bucket(s) {:>5} record(s)  {}",
            report.collection, report.buckets, report.records, status
        );
        for finding in &report.findings {
            println!("    - {}", finding);
        }
    }

    Ok(clean)
}
