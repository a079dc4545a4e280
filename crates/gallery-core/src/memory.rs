//! In-memory collaborators for tests and embedding

use crate::comment::{Comment, CommentRepository};
use crate::error::{GalleryError, Result};
use crate::identity::{Identity, IdentityResolver};
use crate::item::{Item, ItemRepository};
use crate::types::{CommentId, IdentityId, ItemId};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Comments, items and identities held in memory
pub struct MemoryStore {
    comments: RwLock<BTreeMap<CommentId, Comment>>,
    items: RwLock<BTreeMap<ItemId, Item>>,
    identities: RwLock<BTreeMap<IdentityId, Identity>>,
    guest_id: IdentityId,
}

impl MemoryStore {
    pub const GUEST_ID: IdentityId = IdentityId(1);
    pub const ADMIN_ID: IdentityId = IdentityId(2);

    /// Empty store containing only the guest identity
    pub fn new() -> Self {
        let store = Self {
            comments: RwLock::new(BTreeMap::new()),
            items: RwLock::new(BTreeMap::new()),
            identities: RwLock::new(BTreeMap::new()),
            guest_id: Self::GUEST_ID,
        };
        store.add_identity(Identity::guest(Self::GUEST_ID));
        store
    }

    /// Store with a small fixture gallery:
    /// guest (1), admin (2), alice (3); public items 1 and 5, item 6 private to alice
    pub fn seeded() -> Self {
        let store = Self::new();

        let mut admin = Identity::new(Self::ADMIN_ID, "admin");
        admin.full_name = Some("Gallery Administrator".to_string());
        admin.email = Some("admin@example.com".to_string());
        admin.admin = true;
        store.add_identity(admin);

        let mut alice = Identity::new(IdentityId(3), "alice");
        alice.url = Some("https://alice.example.com".to_string());
        store.add_identity(alice);

        let mut root = Item::new(ItemId(1), "Gallery", Self::ADMIN_ID);
        root.public = true;
        store.add_item(root);

        let mut sunset = Item::new(ItemId(5), "Sunset", Self::ADMIN_ID);
        sunset.public = true;
        store.add_item(sunset);

        store.add_item(Item::new(ItemId(6), "Family", IdentityId(3)));
        store
    }

    pub fn add_item(&self, item: Item) {
        write(&self.items).insert(item.id, item);
    }

    pub fn remove_item(&self, id: ItemId) -> Option<Item> {
        write(&self.items).remove(&id)
    }

    pub fn add_identity(&self, identity: Identity) {
        write(&self.identities).insert(identity.id, identity);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl CommentRepository for MemoryStore {
    fn find(&self, id: CommentId) -> Result<Option<Comment>> {
        Ok(read(&self.comments).get(&id).cloned())
    }

    fn insert(&self, comment: &Comment) -> Result<CommentId> {
        let mut comments = write(&self.comments);
        let id = CommentId(comments.keys().next_back().map_or(1, |last| last.0 + 1));
        let mut stored = comment.clone();
        stored.id = Some(id);
        comments.insert(id, stored);
        Ok(id)
    }

    fn update(&self, id: CommentId, comment: &Comment) -> Result<()> {
        let mut comments = write(&self.comments);
        let stored = comments
            .get_mut(&id)
            .ok_or(GalleryError::CommentNotFound(id))?;
        *stored = comment.clone();
        stored.id = Some(id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Comment>> {
        Ok(read(&self.comments).values().cloned().collect())
    }
}

impl ItemRepository for MemoryStore {
    fn find(&self, id: ItemId) -> Result<Option<Item>> {
        Ok(read(&self.items).get(&id).cloned())
    }
}

impl IdentityResolver for MemoryStore {
    fn lookup(&self, id: IdentityId) -> Result<Option<Identity>> {
        Ok(read(&self.identities).get(&id).cloned())
    }

    fn guest(&self) -> Result<Identity> {
        Ok(read(&self.identities)
            .get(&self.guest_id)
            .cloned()
            .unwrap_or_else(|| Identity::guest(self.guest_id)))
    }
}
