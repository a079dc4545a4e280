//! Comment storage trait

use super::model::Comment;
use crate::error::Result;
use crate::types::{CommentId, ItemId};

/// Trait for comment storage implementations
pub trait CommentRepository: Send + Sync {
    /// Find a comment by ID
    fn find(&self, id: CommentId) -> Result<Option<Comment>>;

    /// Store a new comment and return its assigned ID.
    /// Any `id` already on the comment is ignored.
    fn insert(&self, comment: &Comment) -> Result<CommentId>;

    /// Overwrite a stored comment
    fn update(&self, id: CommentId, comment: &Comment) -> Result<()>;

    /// List all comments
    fn list(&self) -> Result<Vec<Comment>>;

    /// List comments on one item
    fn list_by_item(&self, item_id: ItemId) -> Result<Vec<Comment>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|c| c.item_id == item_id)
            .collect())
    }

    /// Count stored comments
    fn count(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }
}
