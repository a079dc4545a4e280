//! Domain events emitted by the comment lifecycle

use crate::comment::Comment;
use crate::item::Item;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Event raised by a create, update or save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentEvent {
    /// A new comment is about to be stored
    BeforeCreate(Comment),
    /// A new comment was stored
    Created(Comment),
    /// A stored comment is about to be overwritten
    BeforeUpdate(Comment),
    /// A stored comment was overwritten
    Updated { original: Comment, updated: Comment },
    /// Something visible on the item changed; dependent views should refresh
    ItemRelatedUpdate(Item),
}

impl CommentEvent {
    /// Subscriber-facing event name
    pub fn name(&self) -> &'static str {
        match self {
            CommentEvent::BeforeCreate(_) => "comment_before_create",
            CommentEvent::Created(_) => "comment_created",
            CommentEvent::BeforeUpdate(_) => "comment_before_update",
            CommentEvent::Updated { .. } => "comment_updated",
            CommentEvent::ItemRelatedUpdate(_) => "item_related_update",
        }
    }
}

/// Receives events synchronously, in emission order
pub trait EventSink: Send + Sync {
    fn dispatch(&self, event: &CommentEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn dispatch(&self, _event: &CommentEvent) {}
}

/// Keeps every event it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<CommentEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far
    pub fn events(&self) -> Vec<CommentEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of the events received so far
    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(CommentEvent::name)
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for RecordingSink {
    fn dispatch(&self, event: &CommentEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Logs each event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn dispatch(&self, event: &CommentEvent) {
        match event {
            CommentEvent::BeforeCreate(comment) => {
                info!(event = event.name(), item_id = %comment.item_id, "event")
            }
            CommentEvent::Created(comment) | CommentEvent::BeforeUpdate(comment) => info!(
                event = event.name(),
                comment_id = ?comment.id,
                item_id = %comment.item_id,
                "event"
            ),
            CommentEvent::Updated { original, updated } => info!(
                event = event.name(),
                comment_id = ?updated.id,
                from = %original.state,
                to = %updated.state,
                "event"
            ),
            CommentEvent::ItemRelatedUpdate(item) => {
                info!(event = event.name(), item_id = %item.id, "event")
            }
        }
    }
}
