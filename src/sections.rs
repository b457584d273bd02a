//! `folio section`: list and edit the flat-list sections.

use anyhow::Result;
use serde_json::Value;

use folio_core::catalog::Section;

use crate::config::Config;
use crate::session;

pub async fn run_list(config: &Config, section: Section, json: bool) -> Result<()> {
    let catalog = session::open_catalog(config).await?;
    let items = catalog.section(section).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No {} yet.", section);
        return Ok(());
    }

    for (index, item) in items.iter().enumerate() {
        println!("[{}] {}", index, summary(item));
    }
    Ok(())
}

pub async fn run_add(
    config: &Config,
    identity: Option<&str>,
    section: Section,
    record: Value,
) -> Result<()> {
    let editor = session::editor(config, identity)?;
    let catalog = session::open_catalog(config).await?;
    let index = catalog.add_to_section(&editor, section, record).await?;
    println!("Added to {} at index {}", section, index);
    Ok(())
}

pub async fn run_update(
    config: &Config,
    identity: Option<&str>,
    section: Section,
    index: usize,
    record: Value,
) -> Result<()> {
    let editor = session::editor(config, identity)?;
    let catalog = session::open_catalog(config).await?;
    catalog
        .update_in_section(&editor, section, index, record)
        .await?;
    println!("Updated {} [{}]", section, index);
    Ok(())
}

/// Remove the first item equal to `record`.
pub async fn run_remove(
    config: &Config,
    identity: Option<&str>,
    section: Section,
    record: Value,
) -> Result<()> {
    let editor = session::editor(config, identity)?;
    let catalog = session::open_catalog(config).await?;
    let label = summary(&record);
    catalog.remove_from_section(&editor, section, record).await?;
    println!("Removed {} from {}", label, section);
    Ok(())
}

/// Remove by position: the stored item is read back and removed by value.
pub async fn run_remove_at(
    config: &Config,
    identity: Option<&str>,
    section: Section,
    index: usize,
) -> Result<()> {
    let catalog = session::open_catalog(config).await?;
    let items = catalog.section(section).await?;
    let Some(item) = items.get(index).cloned() else {
        anyhow::bail!("{} has no item at index {}", section, index);
    };
    run_remove(config, identity, section, item).await
}

/// Name-like fields, in the order they are tried.
const SUMMARY_FIELDS: [&str; 6] = ["name", "title", "degree", "role", "organization", "venue"];

fn summary(item: &Value) -> String {
    SUMMARY_FIELDS
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| item.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_prefers_name_like_fields() {
        assert_eq!(summary(&json!({"category": "Lang", "name": "Rust"})), "Rust");
        assert_eq!(
            summary(&json!({"institution": "MIT", "degree": "PhD"})),
            "PhD"
        );
        assert_eq!(summary(&json!({"year": "2020"})), r#"{"year":"2020"}"#);
    }
}
