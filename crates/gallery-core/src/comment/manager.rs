//! Comment manager: validation, persistence and events

use super::diagnostics::RequestMetadata;
use super::lifecycle::{self, ValidationContext};
use super::model::{Comment, CommentDraft, CommentState};
use super::persistence::CommentRepository;
use super::rest::RestUrls;
use super::validator::{CommentValidator, ValidationErrors};
use crate::config::Config;
use crate::error::{GalleryError, Result};
use crate::events::{CommentEvent, EventSink, NullSink};
use crate::identity::{Identity, IdentityResolver};
use crate::item::{Item, ItemRepository, OwnerOrPublic, VisibilityPolicy};
use crate::types::{CommentId, ItemId};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a successful write
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// The comment as stored
    pub comment: Comment,
    /// Events dispatched for the write, in order
    pub events: Vec<CommentEvent>,
}

impl SaveOutcome {
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.iter().map(CommentEvent::name).collect()
    }
}

/// Manager for the comment lifecycle
///
/// Writes go through [`save`](Self::save) (or `create`/`update`). Events
/// are buffered while a write runs and dispatched only once it succeeded,
/// so a rejected write has no side effects.
pub struct CommentManager {
    comments: Arc<dyn CommentRepository>,
    items: Arc<dyn ItemRepository>,
    identities: Arc<dyn IdentityResolver>,
    visibility: Arc<dyn VisibilityPolicy>,
    events: Arc<dyn EventSink>,
    validator: CommentValidator,
    urls: RestUrls,
}

impl CommentManager {
    /// Create a manager with default policy, no event subscribers and default config
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        items: Arc<dyn ItemRepository>,
        identities: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            comments,
            items,
            identities,
            visibility: Arc::new(OwnerOrPublic),
            events: Arc::new(NullSink),
            validator: CommentValidator::new(),
            urls: RestUrls::default(),
        }
    }

    /// Apply validation and REST settings
    pub fn with_config(mut self, config: &Config) -> Self {
        self.validator = CommentValidator::from_config(&config.comments);
        self.urls = RestUrls::from_config(&config.rest);
        self
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    pub fn with_visibility(mut self, policy: Arc<dyn VisibilityPolicy>) -> Self {
        self.visibility = policy;
        self
    }

    pub fn with_validator(mut self, validator: CommentValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn identities(&self) -> &dyn IdentityResolver {
        self.identities.as_ref()
    }

    pub fn items(&self) -> &dyn ItemRepository {
        self.items.as_ref()
    }

    /// Create or update, refreshing `updated` and notifying the item when
    /// the comment is or was published
    pub fn save(&self, mut draft: CommentDraft, request: &RequestMetadata) -> Result<SaveOutcome> {
        let now = Utc::now();
        draft.updated = Some(now);

        let (comment, previous_state, mut events) = match draft.id {
            None => {
                let (comment, events) = self.create_at(draft, request, now)?;
                (comment, None, events)
            }
            Some(id) => {
                let (comment, original, events) = self.update_inner(id, draft)?;
                (comment, Some(original.state), events)
            }
        };

        if lifecycle::affects_item(previous_state, comment.state) {
            match comment.item(self.items.as_ref())? {
                Some(item) => events.push(CommentEvent::ItemRelatedUpdate(item)),
                None => warn!(item_id = %comment.item_id, "Item vanished before notification"),
            }
        }

        self.dispatch(&events);
        Ok(SaveOutcome { comment, events })
    }

    /// Store a new comment
    pub fn create(&self, draft: CommentDraft, request: &RequestMetadata) -> Result<SaveOutcome> {
        if let Some(id) = draft.id {
            return Err(GalleryError::AlreadyPersisted(id));
        }
        let (comment, events) = self.create_at(draft, request, Utc::now())?;
        self.dispatch(&events);
        Ok(SaveOutcome { comment, events })
    }

    /// Overwrite a stored comment. Leaves `updated` as given in the draft.
    pub fn update(&self, draft: CommentDraft) -> Result<SaveOutcome> {
        let id = draft.id.ok_or(GalleryError::NotPersisted)?;
        let (comment, _, events) = self.update_inner(id, draft)?;
        self.dispatch(&events);
        Ok(SaveOutcome { comment, events })
    }

    /// Soft-delete: save with the `deleted` state
    pub fn delete(&self, id: CommentId) -> Result<SaveOutcome> {
        let comment = self.get(id)?;
        let mut draft = CommentDraft::from(&comment);
        draft.state = Some(CommentState::Deleted.as_str().to_string());
        self.save(draft, &RequestMetadata::default())
    }

    /// Field errors the draft would be rejected with, without writing.
    /// New drafts are checked with the defaults creation would apply.
    pub fn check(&self, draft: &CommentDraft) -> Result<ValidationErrors> {
        let guest_id = self.identities.guest()?.id;
        if draft.is_new() {
            let mut draft = draft.clone();
            lifecycle::apply_create_defaults(&mut draft);
            return self.validator.check(&draft, guest_id, self.items.as_ref());
        }
        self.validator.check(draft, guest_id, self.items.as_ref())
    }

    /// Get a comment by ID
    pub fn get(&self, id: CommentId) -> Result<Comment> {
        self.comments
            .find(id)?
            .ok_or(GalleryError::CommentNotFound(id))
    }

    /// All comments sorted by creation time
    pub fn all(&self) -> Result<Vec<Comment>> {
        let mut comments = self.comments.list()?;
        comments.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    /// Comments on one item sorted by creation time
    pub fn for_item(&self, item_id: ItemId) -> Result<Vec<Comment>> {
        let mut comments = self.comments.list_by_item(item_id)?;
        comments.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    /// Comments whose item the viewer may see
    pub fn viewable(&self, viewer: &Identity) -> Result<Vec<Comment>> {
        let mut visible_items: HashMap<ItemId, bool> = HashMap::new();
        let mut result = Vec::new();

        for comment in self.all()? {
            let visible = match visible_items.get(&comment.item_id) {
                Some(visible) => *visible,
                None => {
                    let visible = self
                        .items
                        .find(comment.item_id)?
                        .is_some_and(|item| self.visibility.can_view(viewer, &item));
                    visible_items.insert(comment.item_id, visible);
                    visible
                }
            };
            if visible {
                result.push(comment);
            }
        }

        Ok(result)
    }

    /// External representation of a stored comment
    pub fn restful(&self, id: CommentId) -> Result<Map<String, Value>> {
        self.get(id)?.as_restful_array(self.items.as_ref(), &self.urls)
    }

    /// REST URL of an item
    pub fn item_url(&self, item: &Item) -> String {
        self.urls.url("item", item.id)
    }

    fn validation_context(&self) -> Result<ValidationContext<'_>> {
        Ok(ValidationContext {
            validator: &self.validator,
            guest_id: self.identities.guest()?.id,
            items: self.items.as_ref(),
        })
    }

    fn create_at(
        &self,
        draft: CommentDraft,
        request: &RequestMetadata,
        now: DateTime<Utc>,
    ) -> Result<(Comment, Vec<CommentEvent>)> {
        let ctx = self.validation_context()?;

        let comment = lifecycle::prepare_create(draft, request, now, &ctx)?;
        let mut events = vec![CommentEvent::BeforeCreate(comment.clone())];

        let id = self.comments.insert(&comment)?;
        let stored = Comment {
            id: Some(id),
            ..comment
        };
        info!(comment_id = %id, item_id = %stored.item_id, state = %stored.state, "Created comment");

        events.push(CommentEvent::Created(stored.clone()));
        Ok((stored, events))
    }

    fn update_inner(
        &self,
        id: CommentId,
        draft: CommentDraft,
    ) -> Result<(Comment, Comment, Vec<CommentEvent>)> {
        let ctx = self.validation_context()?;

        let original = self.get(id)?;
        let comment = lifecycle::prepare_update(draft, &original, &ctx)?;
        let mut events = vec![CommentEvent::BeforeUpdate(comment.clone())];

        self.comments.update(id, &comment)?;
        info!(comment_id = %id, from = %original.state, to = %comment.state, "Updated comment");

        events.push(CommentEvent::Updated {
            original: original.clone(),
            updated: comment.clone(),
        });
        Ok((comment, original, events))
    }

    fn dispatch(&self, events: &[CommentEvent]) {
        for event in events {
            debug!(event = event.name(), "Dispatching");
            self.events.dispatch(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::{CommentBuilder, ErrorCode, ServerDiagnostics};
    use crate::events::RecordingSink;
    use crate::memory::MemoryStore;
    use crate::types::{IdentityId, ItemId};
    use pretty_assertions::assert_eq;

    struct Fixture {
        store: Arc<MemoryStore>,
        sink: Arc<RecordingSink>,
        manager: CommentManager,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::seeded());
        let sink = Arc::new(RecordingSink::new());
        let manager = CommentManager::new(store.clone(), store.clone(), store.clone())
            .with_event_sink(sink.clone());
        Fixture {
            store,
            sink,
            manager,
        }
    }

    fn request() -> RequestMetadata {
        RequestMetadata {
            server_name: Some("photos.example.com".to_string()),
            remote_addr: Some("192.0.2.1".to_string()),
            http_user_agent: Some("Mozilla/5.0".to_string()),
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

    fn create(f: &Fixture, draft: CommentDraft) -> Comment {
        let outcome = f.manager.save(draft, &request()).unwrap();
        f.sink.clear();
        outcome.comment
    }

    #[test]
    fn test_save_new_guest_comment() {
        let f = fixture();
        let outcome = f.manager.save(guest_draft(), &request()).unwrap();

        let comment = &outcome.comment;
        assert_eq!(comment.id, Some(CommentId(1)));
        assert_eq!(comment.state, CommentState::Published);
        assert_eq!(comment.created, comment.updated);
        assert_eq!(comment.server.server_remote_addr.as_deref(), Some("192.0.2.1"));

        assert_eq!(
            outcome.event_names(),
            vec!["comment_before_create", "comment_created", "item_related_update"]
        );
        assert_eq!(f.sink.names(), outcome.event_names());
        assert_eq!(f.manager.get(CommentId(1)).unwrap(), *comment);
    }

    #[test]
    fn test_created_event_carries_stored_comment() {
        let f = fixture();
        let outcome = f.manager.save(guest_draft(), &request()).unwrap();

        match &outcome.events[..] {
            [CommentEvent::BeforeCreate(before), CommentEvent::Created(created), CommentEvent::ItemRelatedUpdate(item)] =>
            {
                assert_eq!(before.id, None);
                assert_eq!(created.id, Some(CommentId(1)));
                assert_eq!(item.id, ItemId(5));
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn test_save_dangling_item_writes_nothing() {
        let f = fixture();
        let draft = CommentDraft {
            item_id: Some(ItemId(999)),
            text: "x".to_string(),
            ..Default::default()
        };

        let err = f.manager.save(draft, &request()).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.get("item_id"), Some(ErrorCode::Invalid));
        assert!(errors.is_dangling_item());

        assert_eq!(f.store.count().unwrap(), 0);
        assert!(f.sink.events().is_empty());
    }

    #[test]
    fn test_save_unpublished_new_comment_does_not_notify_item() {
        let f = fixture();
        let outcome = f
            .manager
            .save(CommentBuilder::from_draft(guest_draft()).unpublished().build(), &request())
            .unwrap();
        assert_eq!(
            outcome.event_names(),
            vec!["comment_before_create", "comment_created"]
        );
    }

    #[test]
    fn test_publishing_notifies_item_once() {
        let f = fixture();
        let comment = create(&f, CommentBuilder::from_draft(guest_draft()).unpublished().build());

        let draft = CommentBuilder::edit(&comment).published().build();
        let outcome = f.manager.save(draft, &request()).unwrap();

        let names = outcome.event_names();
        assert_eq!(
            names,
            vec!["comment_before_update", "comment_updated", "item_related_update"]
        );
        assert_eq!(
            f.sink
                .names()
                .iter()
                .filter(|name| **name == "item_related_update")
                .count(),
            1
        );
    }

    #[test]
    fn test_unpublishing_notifies_item() {
        let f = fixture();
        let comment = create(&f, guest_draft());

        let outcome = f
            .manager
            .save(CommentBuilder::edit(&comment).spam().build(), &request())
            .unwrap();
        assert!(outcome.event_names().contains(&"item_related_update"));
    }

    #[test]
    fn test_spam_to_deleted_does_not_notify_item() {
        let f = fixture();
        let comment = create(&f, CommentBuilder::from_draft(guest_draft()).spam().build());

        let outcome = f.manager.delete(comment.id.unwrap()).unwrap();
        assert_eq!(outcome.comment.state, CommentState::Deleted);
        assert_eq!(
            outcome.event_names(),
            vec!["comment_before_update", "comment_updated"]
        );
    }

    #[test]
    fn test_update_event_carries_original() {
        let f = fixture();
        let comment = create(&f, guest_draft());

        let outcome = f
            .manager
            .save(CommentBuilder::edit(&comment).text("even nicer").build(), &request())
            .unwrap();

        match &outcome.events[1] {
            CommentEvent::Updated { original, updated } => {
                assert_eq!(original.text, "nice photo");
                assert_eq!(updated.text, "even nicer");
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(outcome.comment.updated >= comment.updated);
        assert_eq!(outcome.comment.created, comment.created);
    }

    #[test]
    fn test_update_never_overwrites_diagnostics() {
        let f = fixture();
        let comment = create(&f, guest_draft());

        let mut draft = CommentBuilder::edit(&comment).text("edited").build();
        draft.server = ServerDiagnostics {
            server_name: Some("attacker.example.com".to_string()),
            ..Default::default()
        };
        let other_request = RequestMetadata {
            server_name: Some("other.example.com".to_string()),
            ..Default::default()
        };

        let outcome = f.manager.save(draft, &other_request).unwrap();
        assert_eq!(outcome.comment.server, comment.server);
    }

    #[test]
    fn test_create_twice_keeps_first_snapshot() {
        let f = fixture();
        let first = create(&f, guest_draft());

        // Re-create from the stored record, e.g. a copy into another item
        let mut draft = CommentDraft::from(&first);
        draft.id = None;
        let second_request = RequestMetadata {
            server_name: Some("second.example.com".to_string()),
            remote_addr: Some("203.0.113.9".to_string()),
            ..Default::default()
        };

        let second = f.manager.create(draft, &second_request).unwrap().comment;
        assert_ne!(second.id, first.id);
        assert_eq!(second.server, first.server);
    }

    #[test]
    fn test_create_keeps_partial_imported_snapshot() {
        let f = fixture();
        let imported = ServerDiagnostics {
            server_remote_addr: Some("198.51.100.4".to_string()),
            server_http_user_agent: Some("first-agent".to_string()),
            ..Default::default()
        };
        let draft = CommentBuilder::from_draft(guest_draft())
            .diagnostics(imported)
            .build();
        let request = RequestMetadata {
            server_name: Some("photos.example.com".to_string()),
            remote_addr: Some("203.0.113.9".to_string()),
            ..Default::default()
        };

        let comment = f.manager.save(draft, &request).unwrap().comment;
        assert_eq!(comment.server.server_remote_addr.as_deref(), Some("198.51.100.4"));
        assert_eq!(comment.server.server_http_user_agent.as_deref(), Some("first-agent"));
        assert_eq!(comment.server.server_name.as_deref(), Some("photos.example.com"));
    }

    #[test]
    fn test_check_new_draft_uses_create_defaults() {
        let f = fixture();
        assert!(f.manager.check(&guest_draft()).unwrap().is_empty());

        let mut draft = guest_draft();
        draft.state = Some("archived".to_string());
        assert_eq!(
            f.manager.check(&draft).unwrap().get("state"),
            Some(ErrorCode::InvalidState)
        );

        // Stored comments are checked as they are
        let stored = create(&f, guest_draft());
        let mut edit = CommentDraft::from(&stored);
        edit.state = None;
        assert_eq!(
            f.manager.check(&edit).unwrap().get("state"),
            Some(ErrorCode::InvalidState)
        );
    }

    #[test]
    fn test_rejected_update_leaves_record_untouched() {
        let f = fixture();
        let comment = create(&f, guest_draft());

        let draft = CommentBuilder::edit(&comment).state("archived").text("").build();
        let err = f.manager.save(draft, &request()).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.get("state"), Some(ErrorCode::InvalidState));
        assert_eq!(errors.get("text"), Some(ErrorCode::Required));

        assert_eq!(f.manager.get(comment.id.unwrap()).unwrap(), comment);
        assert!(f.sink.events().is_empty());
    }

    #[test]
    fn test_update_requires_stored_comment() {
        let f = fixture();
        assert!(matches!(
            f.manager.update(guest_draft()),
            Err(GalleryError::NotPersisted)
        ));

        let mut draft = guest_draft();
        draft.id = Some(CommentId(42));
        assert!(matches!(
            f.manager.save(draft, &request()),
            Err(GalleryError::CommentNotFound(CommentId(42)))
        ));
    }

    #[test]
    fn test_direct_update_keeps_updated_timestamp() {
        let f = fixture();
        let comment = create(&f, guest_draft());

        let outcome = f
            .manager
            .update(CommentBuilder::edit(&comment).text("quiet edit").build())
            .unwrap();
        assert_eq!(outcome.comment.updated, comment.updated);
        assert_eq!(
            outcome.event_names(),
            vec!["comment_before_update", "comment_updated"]
        );
    }

    #[test]
    fn test_create_rejects_stored_comment() {
        let f = fixture();
        let comment = create(&f, guest_draft());
        assert!(f
            .manager
            .create(CommentDraft::from(&comment), &request())
            .is_err());
    }

    #[test]
    fn test_required_guest_email_config() {
        let f = fixture();
        let mut config = Config::default();
        config.comments.require_guest_email = true;
        let manager = CommentManager::new(f.store.clone(), f.store.clone(), f.store.clone())
            .with_config(&config);

        let errors = manager.check(&guest_draft()).unwrap();
        assert_eq!(errors.get("guest_email"), Some(ErrorCode::Required));

        let draft = CommentBuilder::from_draft(guest_draft())
            .guest_email("alice@example.com")
            .build();
        assert!(manager.save(draft, &request()).is_ok());

        let relaxed = manager.with_validator(CommentValidator::new().with_required_guest_email(false));
        assert!(relaxed.check(&guest_draft()).unwrap().is_empty());
    }

    #[test]
    fn test_viewable_filters_by_item_visibility() {
        let f = fixture();
        create(&f, guest_draft());
        let private = CommentBuilder::new(ItemId(6))
            .author(IdentityId(3))
            .text("family only")
            .build();
        create(&f, private);

        let guest = f.store.guest().unwrap();
        let alice = f.store.lookup(IdentityId(3)).unwrap().unwrap();
        let admin = f.store.lookup(MemoryStore::ADMIN_ID).unwrap().unwrap();

        assert_eq!(f.manager.viewable(&guest).unwrap().len(), 1);
        assert_eq!(f.manager.viewable(&alice).unwrap().len(), 2);
        assert_eq!(f.manager.viewable(&admin).unwrap().len(), 2);

        f.store.remove_item(ItemId(6));
        assert_eq!(f.manager.viewable(&admin).unwrap().len(), 1);
    }

    #[test]
    fn test_viewable_with_custom_policy() {
        struct AdminsOnly;

        impl VisibilityPolicy for AdminsOnly {
            fn can_view(&self, viewer: &Identity, _item: &Item) -> bool {
                viewer.admin
            }
        }

        let f = fixture();
        create(&f, guest_draft());
        let manager = CommentManager::new(f.store.clone(), f.store.clone(), f.store.clone())
            .with_visibility(Arc::new(AdminsOnly));

        let guest = f.store.guest().unwrap();
        let admin = f.store.lookup(MemoryStore::ADMIN_ID).unwrap().unwrap();
        assert!(manager.viewable(&guest).unwrap().is_empty());
        assert_eq!(manager.viewable(&admin).unwrap().len(), 1);
    }

    #[test]
    fn test_for_item_and_all() {
        let f = fixture();
        create(&f, guest_draft());
        create(&f, CommentBuilder::from_draft(guest_draft()).text("second").build());
        create(
            &f,
            CommentBuilder::new(ItemId(1))
                .author(MemoryStore::ADMIN_ID)
                .text("root")
                .build(),
        );

        assert_eq!(f.manager.for_item(ItemId(5)).unwrap().len(), 2);
        assert_eq!(f.manager.for_item(ItemId(1)).unwrap().len(), 1);

        let all = f.manager.all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].text, "nice photo");
    }

    #[test]
    fn test_restful() {
        let f = fixture();
        let comment = create(&f, guest_draft());

        let data = f.manager.restful(comment.id.unwrap()).unwrap();
        assert_eq!(
            data["item"],
            "http://localhost/gallery3/index.php/rest/item/5"
        );
        assert!(!data.contains_key("server_name"));
        assert!(!data.contains_key("item_id"));
    }

    #[test]
    fn test_author_name_through_manager() {
        let f = fixture();
        let comment = create(&f, guest_draft());
        assert_eq!(
            comment.author_name(f.manager.identities()).unwrap().as_deref(),
            Some("Alice")
        );
    }
}
