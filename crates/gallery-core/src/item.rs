//! Gallery items, item lookup and visibility policy

use crate::error::Result;
use crate::identity::Identity;
use crate::types::{IdentityId, ItemId};
use serde::{Deserialize, Serialize};

/// A commentable gallery item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub owner_id: IdentityId,
    /// Visible to everyone, guests included
    #[serde(default)]
    pub public: bool,
}

impl Item {
    pub fn new(id: ItemId, title: impl Into<String>, owner_id: IdentityId) -> Self {
        Self {
            id,
            title: title.into(),
            owner_id,
            public: false,
        }
    }
}

/// Lookup of items by id
pub trait ItemRepository: Send + Sync {
    /// Find an item by id
    fn find(&self, id: ItemId) -> Result<Option<Item>>;

    /// Check if an item exists
    fn exists(&self, id: ItemId) -> Result<bool> {
        Ok(self.find(id)?.is_some())
    }
}

/// Decides which items a viewer may see
pub trait VisibilityPolicy: Send + Sync {
    fn can_view(&self, viewer: &Identity, item: &Item) -> bool;
}

/// Public items for everyone, private items for their owner and administrators
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOrPublic;

impl VisibilityPolicy for OwnerOrPublic {
    fn can_view(&self, viewer: &Identity, item: &Item) -> bool {
        item.public || viewer.admin || (!viewer.guest && item.owner_id == viewer.id)
    }
}
