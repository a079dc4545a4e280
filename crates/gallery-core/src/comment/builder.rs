//! Comment builder for fluent API

use super::diagnostics::ServerDiagnostics;
use super::model::{Comment, CommentDraft, CommentState};
use crate::types::{IdentityId, ItemId};

/// Builder for comment drafts
///
/// Builds unvalidated drafts; validation happens when the draft is saved.
#[derive(Debug, Clone)]
pub struct CommentBuilder {
    draft: CommentDraft,
}

impl CommentBuilder {
    /// Start a new comment on an item
    pub fn new(item_id: ItemId) -> Self {
        Self {
            draft: CommentDraft {
                item_id: Some(item_id),
                ..Default::default()
            },
        }
    }

    /// Start editing a stored comment
    pub fn edit(comment: &Comment) -> Self {
        Self {
            draft: CommentDraft::from(comment),
        }
    }

    /// Continue from an existing draft
    pub fn from_draft(draft: CommentDraft) -> Self {
        Self { draft }
    }

    /// Set the author identity
    pub fn author(mut self, author_id: IdentityId) -> Self {
        self.draft.author_id = Some(author_id);
        self
    }

    pub fn guest_name(mut self, name: impl Into<String>) -> Self {
        self.draft.guest_name = Some(name.into());
        self
    }

    pub fn guest_email(mut self, email: impl Into<String>) -> Self {
        self.draft.guest_email = Some(email.into());
        self
    }

    pub fn guest_url(mut self, url: impl Into<String>) -> Self {
        self.draft.guest_url = Some(url.into());
        self
    }

    /// Set the comment text
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.draft.text = text.into();
        self
    }

    /// Set the state from text; out-of-range values are rejected on save
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.draft.state = Some(state.into());
        self
    }

    pub fn published(self) -> Self {
        self.state(CommentState::Published.as_str())
    }

    pub fn unpublished(self) -> Self {
        self.state(CommentState::Unpublished.as_str())
    }

    pub fn spam(self) -> Self {
        self.state(CommentState::Spam.as_str())
    }

    pub fn deleted(self) -> Self {
        self.state(CommentState::Deleted.as_str())
    }

    /// Preset the request snapshot, e.g. when importing comments
    pub fn diagnostics(mut self, server: ServerDiagnostics) -> Self {
        self.draft.server = server;
        self
    }

    /// Build the draft
    pub fn build(self) -> CommentDraft {
        self.draft
    }
}
