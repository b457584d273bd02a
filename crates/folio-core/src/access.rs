//! Who may edit the portfolio.
//!
//! The site has exactly one editor. An [`AccessPolicy`] decides whether an
//! [`Identity`] is that editor and, if so, hands out an [`Editor`]
//! capability. Every mutating operation in [`catalog`](crate::catalog)
//! takes `&Editor`, so code that never obtained one cannot write.
//!
//! The repositories themselves do not check anything.

use crate::error::{FolioError, Result};

/// The caller as reported by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub email_verified: bool,
}

impl Identity {
    pub fn verified(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            email_verified: true,
        }
    }
}

/// Proof that the holder passed an [`AccessPolicy`].
///
/// Only [`AccessPolicy::authorize`] can construct one.
#[derive(Debug, Clone)]
pub struct Editor {
    email: String,
}

impl Editor {
    pub fn email(&self) -> &str {
        &self.email
    }
}

pub trait AccessPolicy: Send + Sync {
    /// Whether `identity` may mutate portfolio data.
    fn can_edit(&self, identity: &Identity) -> bool;

    fn authorize(&self, identity: Option<&Identity>) -> Result<Editor> {
        let identity = identity
            .ok_or_else(|| FolioError::Forbidden("sign in to edit the portfolio".into()))?;
        if self.can_edit(identity) {
            Ok(Editor {
                email: identity.email.trim().to_string(),
            })
        } else {
            Err(FolioError::Forbidden(format!(
                "{} is not allowed to edit this portfolio",
                identity.email
            )))
        }
    }
}

/// Allows only a verified identity whose email is the configured owner's.
#[derive(Debug, Clone)]
pub struct OwnerPolicy {
    owner_email: String,
}

impl OwnerPolicy {
    pub fn new(owner_email: impl Into<String>) -> Self {
        Self {
            owner_email: owner_email.into().trim().to_lowercase(),
        }
    }

    pub fn owner_email(&self) -> &str {
        &self.owner_email
    }
}

impl AccessPolicy for OwnerPolicy {
    fn can_edit(&self, identity: &Identity) -> bool {
        identity.email_verified
            && !self.owner_email.is_empty()
            && identity.email.trim().to_lowercase() == self.owner_email
    }
}
