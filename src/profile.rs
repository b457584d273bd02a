//! `folio profile`: read and overwrite the hero and about documents.

use anyhow::Result;
use serde_json::Value;

use folio_core::catalog::ProfileDoc;

use crate::config::Config;
use crate::session;

pub async fn run_get(config: &Config, doc: ProfileDoc) -> Result<()> {
    let catalog = session::open_catalog(config).await?;
    match catalog.profile(doc).await? {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => eprintln!("No {} document saved yet.", doc.document()),
    }
    Ok(())
}

pub async fn run_set(
    config: &Config,
    identity: Option<&str>,
    doc: ProfileDoc,
    value: Value,
) -> Result<()> {
    let editor = session::editor(config, identity)?;
    let catalog = session::open_catalog(config).await?;
    catalog.set_profile(&editor, doc, value).await?;
    println!("Saved {}", doc.document());
    Ok(())
}
