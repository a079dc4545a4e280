//! Comment data models

use super::diagnostics::ServerDiagnostics;
use crate::error::Result;
use crate::identity::{Identity, IdentityResolver};
use crate::item::{Item, ItemRepository};
use crate::types::{CommentId, IdentityId, ItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A validated comment attached to a gallery item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Storage-assigned identifier, `None` until first persisted
    #[serde(default)]
    pub id: Option<CommentId>,
    pub item_id: ItemId,
    pub author_id: IdentityId,
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub guest_email: Option<String>,
    #[serde(default)]
    pub guest_url: Option<String>,
    pub text: String,
    pub state: CommentState,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Request snapshot taken at creation
    #[serde(flatten)]
    pub server: ServerDiagnostics,
}

impl Comment {
    /// Check whether the comment has been persisted
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_published(&self) -> bool {
        self.state == CommentState::Published
    }

    /// Resolve the author identity
    pub fn author(&self, identities: &dyn IdentityResolver) -> Result<Option<Identity>> {
        identities.lookup(self.author_id)
    }

    /// Guest-supplied name for guests, display name otherwise
    pub fn author_name(&self, identities: &dyn IdentityResolver) -> Result<Option<String>> {
        Ok(self.author(identities)?.and_then(|author| {
            if author.guest {
                self.guest_name.clone()
            } else {
                Some(author.display_name().to_string())
            }
        }))
    }

    /// Guest-supplied email for guests, account email otherwise
    pub fn author_email(&self, identities: &dyn IdentityResolver) -> Result<Option<String>> {
        Ok(self.author(identities)?.and_then(|author| {
            if author.guest {
                self.guest_email.clone()
            } else {
                author.email
            }
        }))
    }

    /// Guest-supplied URL for guests, account URL otherwise
    pub fn author_url(&self, identities: &dyn IdentityResolver) -> Result<Option<String>> {
        Ok(self.author(identities)?.and_then(|author| {
            if author.guest {
                self.guest_url.clone()
            } else {
                author.url
            }
        }))
    }

    /// Resolve the commented item
    pub fn item(&self, items: &dyn ItemRepository) -> Result<Option<Item>> {
        items.find(self.item_id)
    }
}

/// Moderation state
///
/// A flat status: any state may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentState {
    /// Visible to viewers of the item
    #[default]
    Published,
    /// Held for moderation
    Unpublished,
    /// Flagged as spam
    Spam,
    /// Soft-deleted
    Deleted,
}

impl CommentState {
    pub const ALL: [CommentState; 4] = [
        CommentState::Published,
        CommentState::Unpublished,
        CommentState::Spam,
        CommentState::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommentState::Published => "published",
            CommentState::Unpublished => "unpublished",
            CommentState::Spam => "spam",
            CommentState::Deleted => "deleted",
        }
    }

    /// Parse the stored representation
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_str() == s)
    }
}

impl std::fmt::Display for CommentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated comment fields, as submitted or as being edited
///
/// `state` is kept as text so out-of-range values can reach validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentDraft {
    pub id: Option<CommentId>,
    pub item_id: Option<ItemId>,
    pub author_id: Option<IdentityId>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_url: Option<String>,
    pub text: String,
    pub state: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub server: ServerDiagnostics,
}

impl CommentDraft {
    /// Check whether this draft targets a stored comment
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// State as entered, treating the empty string as unset
    pub fn state_value(&self) -> Option<&str> {
        self.state.as_deref().filter(|s| !s.is_empty())
    }

    /// Typed state, if the entered value is one of the allowed ones
    pub fn parsed_state(&self) -> Option<CommentState> {
        self.state_value().and_then(CommentState::parse)
    }

    /// Convert into a typed comment.
    ///
    /// Returns `None` if a required field is missing or the state is out of
    /// range; run validation first to learn which.
    pub(crate) fn into_comment(self) -> Option<Comment> {
        let state = self.parsed_state()?;
        let now = Utc::now();
        let updated = self.updated.unwrap_or(now);

        Some(Comment {
            id: self.id,
            item_id: self.item_id?,
            author_id: self.author_id?,
            guest_name: non_empty(self.guest_name),
            guest_email: non_empty(self.guest_email),
            guest_url: non_empty(self.guest_url),
            text: self.text,
            state,
            created: self.created.unwrap_or(updated),
            updated,
            server: self.server,
        })
    }
}

impl From<&Comment> for CommentDraft {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            item_id: Some(comment.item_id),
            author_id: Some(comment.author_id),
            guest_name: comment.guest_name.clone(),
            guest_email: comment.guest_email.clone(),
            guest_url: comment.guest_url.clone(),
            text: comment.text.clone(),
            state: Some(comment.state.as_str().to_string()),
            created: Some(comment.created),
            updated: Some(comment.updated),
            server: comment.server.clone(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
