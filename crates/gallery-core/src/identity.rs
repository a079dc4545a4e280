//! User identities and the resolver trait

use crate::error::Result;
use crate::types::IdentityId;
use serde::{Deserialize, Serialize};

/// A user identity as seen by the comment model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    /// Login name
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// True for the distinguished anonymous identity
    #[serde(default)]
    pub guest: bool,
    #[serde(default)]
    pub admin: bool,
}

impl Identity {
    /// Create a registered identity
    pub fn new(id: IdentityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            full_name: None,
            email: None,
            url: None,
            guest: false,
            admin: false,
        }
    }

    /// Create the guest identity
    pub fn guest(id: IdentityId) -> Self {
        Self {
            guest: true,
            ..Self::new(id, "guest")
        }
    }

    /// Full name when one is set, otherwise the login name
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(full_name) if !full_name.trim().is_empty() => full_name,
            _ => &self.name,
        }
    }
}

/// Resolves author ids to identities
pub trait IdentityResolver: Send + Sync {
    /// Look up an identity by id
    fn lookup(&self, id: IdentityId) -> Result<Option<Identity>>;

    /// The guest identity
    fn guest(&self) -> Result<Identity>;

    /// Check whether an id is the guest identity
    fn is_guest(&self, id: IdentityId) -> Result<bool> {
        Ok(self.guest()?.id == id)
    }
}
