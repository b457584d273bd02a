//! JSON record input for editing commands.
//!
//! A record comes from `--json '<object>'`, from `--file <path>`, or from
//! stdin when `--file -` is given.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct JsonInput {
    /// Record as an inline JSON object.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,

    /// Read the record from a JSON file (`-` for stdin).
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl JsonInput {
    pub fn read(&self) -> Result<Value> {
        let raw = match (&self.json, &self.file) {
            (Some(inline), _) => inline.clone(),
            (None, Some(path)) if path.as_os_str() == "-" => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read record from stdin")?;
                buf
            }
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read record file: {}", path.display()))?,
            (None, None) => bail!("provide the record with --json or --file"),
        };
        serde_json::from_str(&raw).context("Record is not valid JSON")
    }
}
