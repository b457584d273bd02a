//! Opening the catalog and resolving the CLI caller.

use anyhow::Result;

use folio_core::access::{AccessPolicy, Editor, Identity, OwnerPolicy};
use folio_core::catalog::Catalog;

use crate::config::Config;
use crate::db;

pub async fn open_catalog(config: &Config) -> Result<Catalog> {
    Ok(Catalog::new(db::open_store(config).await?))
}

/// Authorize the identity given with `--as` (or `FOLIO_IDENTITY`).
///
/// Whoever runs the CLI already holds the database file, so the email is
/// taken as verified; it must still match the configured owner.
pub fn editor(config: &Config, identity: Option<&str>) -> Result<Editor> {
    let policy = OwnerPolicy::new(config.owner.email.clone());
    let identity = identity
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(Identity::verified);
    Ok(policy.authorize(identity.as_ref())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DbConfig, OwnerConfig, ServerConfig};

    fn config() -> Config {
        Config {
            db: DbConfig {
                path: "unused.sqlite".into(),
            },
            owner: OwnerConfig {
                email: "Owner@Example.org".into(),
            },
            server: ServerConfig::default(),
        }
    }

    #[test]
    fn owner_is_authorized_case_insensitively() {
        let editor = editor(&config(), Some(" owner@example.org ")).unwrap();
        assert_eq!(editor.email(), "owner@example.org");
    }

    #[test]
    fn missing_or_foreign_identity_is_refused() {
        assert!(editor(&config(), None).is_err());
        assert!(editor(&config(), Some("   ")).is_err());
        assert!(editor(&config(), Some("someone@else.org")).is_err());
    }
}
