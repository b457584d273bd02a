//! Export the whole portfolio as one JSON document.
//!
//! The output carries the hero and about documents, every publication
//! kind grouped by year (newest first), every flat section, and freshly
//! computed statistics. It is what a static build of the site consumes.

use anyhow::Result;
use serde_json::Value;
use std::path::Path;

use crate::config::Config;
use crate::session;

/// Export the portfolio as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let catalog = session::open_catalog(config).await?;
    let data = catalog.export().await?;
    let json = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            eprintln!(
                "Exported {} publications to {}",
                publication_count(&data),
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

fn publication_count(data: &Value) -> usize {
    data.get("publications")
        .and_then(Value::as_object)
        .map(|kinds| {
            kinds
                .values()
                .filter_map(Value::as_array)
                .flatten()
                .filter_map(|group| group.get("entries").and_then(Value::as_array))
                .map(Vec::len)
                .sum()
        })
        .unwrap_or(0)
}
