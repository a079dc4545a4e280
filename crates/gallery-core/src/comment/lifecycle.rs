//! Side-effect free steps of the comment lifecycle
//!
//! These functions turn a draft into the record that should be stored.
//! Persistence and event dispatch live in [`super::CommentManager`].

use super::diagnostics::RequestMetadata;
use super::model::{Comment, CommentDraft, CommentState};
use super::validator::CommentValidator;
use crate::error::Result;
use crate::item::ItemRepository;
use crate::types::IdentityId;
use chrono::{DateTime, Utc};

/// What validation needs to know about the outside world
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    pub validator: &'a CommentValidator,
    pub guest_id: IdentityId,
    pub items: &'a dyn ItemRepository,
}

impl ValidationContext<'_> {
    pub fn validate(&self, draft: CommentDraft) -> Result<Comment> {
        self.validator.validate(draft, self.guest_id, self.items)
    }
}

/// Record to insert for a new comment.
///
/// Stamps both timestamps with `now`, defaults the state to published and
/// takes the request snapshot unless one is already present.
pub fn prepare_create(
    mut draft: CommentDraft,
    request: &RequestMetadata,
    now: DateTime<Utc>,
    ctx: &ValidationContext<'_>,
) -> Result<Comment> {
    draft.updated = Some(now);
    draft.created = Some(now);
    apply_create_defaults(&mut draft);

    draft.server.capture_once(request);

    ctx.validate(draft)
}

/// Field defaults a new comment gets before validation
pub fn apply_create_defaults(draft: &mut CommentDraft) {
    if draft.state_value().is_none() {
        draft.state = Some(CommentState::Published.as_str().to_string());
    }
}

/// Record to write over a stored comment.
///
/// Creation data is carried over from the original; only validation applies.
pub fn prepare_update(
    mut draft: CommentDraft,
    original: &Comment,
    ctx: &ValidationContext<'_>,
) -> Result<Comment> {
    draft.created = Some(original.created);
    draft.server = original.server.clone();
    if draft.updated.is_none() {
        draft.updated = Some(original.updated);
    }

    ctx.validate(draft)
}

/// A save has to notify the item when the comment was or is visible
pub fn affects_item(previous: Option<CommentState>, current: CommentState) -> bool {
    current == CommentState::Published || previous == Some(CommentState::Published)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::{CommentBuilder, ErrorCode, ServerDiagnostics};
    use crate::memory::MemoryStore;
    use crate::types::ItemId;
    use pretty_assertions::assert_eq;

    fn with_ctx<T>(f: impl FnOnce(&ValidationContext<'_>) -> T) -> T {
        let store = MemoryStore::seeded();
        let validator = CommentValidator::new();
        let ctx = ValidationContext {
            validator: &validator,
            guest_id: MemoryStore::GUEST_ID,
            items: &store,
        };
        f(&ctx)
    }

    fn request() -> RequestMetadata {
        RequestMetadata {
            server_name: Some("photos.example.com".to_string()),
            remote_addr: Some("192.0.2.1".to_string()),
            ..Default::default()
        }
    }

    fn guest_draft() -> CommentDraft {
        CommentBuilder::new(ItemId(5))
            .author(MemoryStore::GUEST_ID)
            .guest_name("Alice")
            .text("nice photo")
            .build()
    }

    #[test]
    fn test_prepare_create_defaults() {
        let now = Utc::now();
        let comment = with_ctx(|ctx| prepare_create(guest_draft(), &request(), now, ctx)).unwrap();

        assert_eq!(comment.state, CommentState::Published);
        assert_eq!(comment.created, now);
        assert_eq!(comment.updated, now);
        assert_eq!(comment.server.server_name.as_deref(), Some("photos.example.com"));
        assert_eq!(comment.id, None);
    }

    #[test]
    fn test_prepare_create_keeps_explicit_state() {
        let mut draft = guest_draft();
        draft.state = Some("unpublished".to_string());

        let comment = with_ctx(|ctx| prepare_create(draft, &request(), Utc::now(), ctx)).unwrap();
        assert_eq!(comment.state, CommentState::Unpublished);
    }

    #[test]
    fn test_prepare_create_keeps_existing_snapshot() {
        let imported = ServerDiagnostics {
            server_name: Some("old.example.com".to_string()),
            server_remote_addr: Some("198.51.100.4".to_string()),
            ..Default::default()
        };
        let mut draft = guest_draft();
        draft.server = imported.clone();

        let comment = with_ctx(|ctx| prepare_create(draft, &request(), Utc::now(), ctx)).unwrap();
        assert_eq!(comment.server, imported);
    }

    #[test]
    fn test_prepare_create_rejects_invalid_state() {
        let mut draft = guest_draft();
        draft.state = Some("archived".to_string());

        let err = with_ctx(|ctx| prepare_create(draft, &request(), Utc::now(), ctx)).unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().get("state"),
            Some(ErrorCode::InvalidState)
        );
    }

    #[test]
    fn test_prepare_update_preserves_creation_data() {
        let original =
            with_ctx(|ctx| prepare_create(guest_draft(), &request(), Utc::now(), ctx)).unwrap();

        let mut draft = CommentBuilder::edit(&original).text("edited").build();
        draft.server = ServerDiagnostics::default();
        draft.created = None;

        let updated = with_ctx(|ctx| prepare_update(draft, &original, ctx)).unwrap();
        assert_eq!(updated.text, "edited");
        assert_eq!(updated.created, original.created);
        assert_eq!(updated.server, original.server);
    }

    #[test]
    fn test_apply_create_defaults() {
        let mut draft = guest_draft();
        draft.state = Some(String::new());
        apply_create_defaults(&mut draft);
        assert_eq!(draft.parsed_state(), Some(CommentState::Published));

        let mut draft = guest_draft();
        draft.state = Some("spam".to_string());
        apply_create_defaults(&mut draft);
        assert_eq!(draft.parsed_state(), Some(CommentState::Spam));
    }

    #[test]
    fn test_affects_item() {
        use CommentState::*;

        assert!(affects_item(None, Published));
        assert!(affects_item(Some(Unpublished), Published));
        assert!(affects_item(Some(Published), Spam));
        assert!(affects_item(Some(Published), Published));

        assert!(!affects_item(None, Unpublished));
        assert!(!affects_item(Some(Spam), Deleted));
        assert!(!affects_item(Some(Spam), Spam));
    }
}
