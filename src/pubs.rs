//! `folio pubs`: list and edit year-bucketed publications.

use anyhow::Result;
use serde_json::Value;

use folio_core::catalog::PublicationKind;

use crate::config::Config;
use crate::session;

/// Print publications of one kind, newest year first.
pub async fn run_list(config: &Config, kind: PublicationKind, json: bool) -> Result<()> {
    let catalog = session::open_catalog(config).await?;
    let groups = catalog.publications(kind).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    if groups.is_empty() {
        println!("No {} yet.", kind.label().to_lowercase());
        return Ok(());
    }

    println!("{}", kind.label());
    for group in &groups {
        println!();
        println!("  {}", group.year);
        for entry in &group.entries {
            println!("    [{}] {}", entry.index, headline(&entry.record));
        }
    }
    Ok(())
}

pub async fn run_add(
    config: &Config,
    identity: Option<&str>,
    kind: PublicationKind,
    year: &str,
    record: Value,
) -> Result<()> {
    let editor = session::editor(config, identity)?;
    let catalog = session::open_catalog(config).await?;
    let tagged = catalog.add_publication(&editor, kind, year, record).await?;
    println!(
        "Added to {} {} at index {} ({})",
        kind,
        tagged.year,
        tagged.index,
        record_id(&tagged.record)
    );
    Ok(())
}

pub async fn run_update(
    config: &Config,
    identity: Option<&str>,
    kind: PublicationKind,
    year: &str,
    index: usize,
    record: Value,
) -> Result<()> {
    let editor = session::editor(config, identity)?;
    let catalog = session::open_catalog(config).await?;
    let tagged = catalog
        .update_publication(&editor, kind, year, index, record)
        .await?;
    if tagged.year == year.trim() {
        println!("Updated {} {} [{}]", kind, tagged.year, tagged.index);
    } else {
        println!(
            "Moved {} {} [{}] to {} [{}]",
            kind,
            year.trim(),
            index,
            tagged.year,
            tagged.index
        );
    }
    Ok(())
}

pub async fn run_remove(
    config: &Config,
    identity: Option<&str>,
    kind: PublicationKind,
    year: &str,
    index: usize,
) -> Result<()> {
    let editor = session::editor(config, identity)?;
    let catalog = session::open_catalog(config).await?;
    let removed = catalog.remove_publication(&editor, kind, year, index).await?;
    println!("Removed \"{}\" from {} {}", headline(&removed), kind, year.trim());
    Ok(())
}

fn headline(record: &Value) -> String {
    let title = record.get("title").and_then(Value::as_str).unwrap_or("(untitled)");
    let byline = record
        .get("authors")
        .or_else(|| record.get("editors"))
        .and_then(Value::as_str);
    match byline {
        Some(authors) if !authors.is_empty() => format!("{} ({})", title, authors),
        _ => title.to_string(),
    }
}

fn record_id(record: &Value) -> &str {
    record.get("id").and_then(Value::as_str).unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn headline_includes_authors_when_present() {
        assert_eq!(
            headline(&json!({"title": "A", "authors": "Doe, J."})),
            "A (Doe, J.)"
        );
        assert_eq!(headline(&json!({"title": "A", "authors": ""})), "A");
        assert_eq!(
            headline(&json!({"title": "B", "editors": "Roe, R."})),
            "B (Roe, R.)"
        );
        assert_eq!(headline(&json!({})), "(untitled)");
    }
}
