//! File-backed items and identities

use gallery_core::error::{GalleryError, Result};
use gallery_core::identity::{Identity, IdentityResolver};
use gallery_core::item::{Item, ItemRepository};
use gallery_core::types::{IdentityId, ItemId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

const ITEMS_FILE: &str = "items.json";
const IDENTITIES_FILE: &str = "identities.json";

/// Items and identities kept in `items.json` and `identities.json`
///
/// Both files are loaded once when the catalog is opened. Changes made
/// through [`Catalog::add_item`] and [`Catalog::add_identity`] are written
/// back with [`Catalog::save`].
pub struct Catalog {
    base_dir: PathBuf,
    items: RwLock<BTreeMap<ItemId, Item>>,
    identities: RwLock<BTreeMap<IdentityId, Identity>>,
}

impl Catalog {
    pub const GUEST_ID: IdentityId = IdentityId(1);
    pub const ADMIN_ID: IdentityId = IdentityId(2);
    pub const ROOT_ITEM_ID: ItemId = ItemId(1);

    /// Open the catalog in `base_dir`; missing files load as empty
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();

        let items: Vec<Item> = read_list(&base_dir.join(ITEMS_FILE))?;
        let identities: Vec<Identity> = read_list(&base_dir.join(IDENTITIES_FILE))?;
        debug!(
            "Loaded {} items and {} identities from {:?}",
            items.len(),
            identities.len(),
            base_dir
        );

        Ok(Self {
            base_dir,
            items: RwLock::new(items.into_iter().map(|i| (i.id, i)).collect()),
            identities: RwLock::new(identities.into_iter().map(|i| (i.id, i)).collect()),
        })
    }

    /// Write a fresh catalog holding the guest, an administrator and the
    /// public root album
    pub fn seed_default(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;

        let catalog = Self {
            base_dir,
            items: RwLock::new(BTreeMap::new()),
            identities: RwLock::new(BTreeMap::new()),
        };

        catalog.add_identity(Identity::guest(Self::GUEST_ID));
        catalog.add_identity(Identity {
            full_name: Some("Gallery Administrator".to_string()),
            admin: true,
            ..Identity::new(Self::ADMIN_ID, "admin")
        });
        catalog.add_item(Item {
            public: true,
            ..Item::new(Self::ROOT_ITEM_ID, "Gallery", Self::ADMIN_ID)
        });

        catalog.save()?;
        Ok(catalog)
    }

    /// Check whether a catalog has been written to `base_dir`
    pub fn exists_in(base_dir: &Path) -> bool {
        base_dir.join(ITEMS_FILE).exists() && base_dir.join(IDENTITIES_FILE).exists()
    }

    pub fn add_item(&self, item: Item) {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(item.id, item);
    }

    pub fn add_identity(&self, identity: Identity) {
        self.identities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.id, identity);
    }

    pub fn items(&self) -> Vec<Item> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn identities(&self) -> Vec<Identity> {
        self.identities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Write both files back to disk
    pub fn save(&self) -> Result<()> {
        write_list(&self.base_dir.join(ITEMS_FILE), &self.items())?;
        write_list(&self.base_dir.join(IDENTITIES_FILE), &self.identities())?;
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl ItemRepository for Catalog {
    fn find(&self, id: ItemId) -> Result<Option<Item>> {
        Ok(self
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }
}

impl IdentityResolver for Catalog {
    fn lookup(&self, id: IdentityId) -> Result<Option<Identity>> {
        Ok(self
            .identities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }

    /// The identity flagged as guest, or a bare guest with the default id
    fn guest(&self) -> Result<Identity> {
        let identities = self
            .identities
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(identities
            .values()
            .find(|identity| identity.guest)
            .cloned()
            .unwrap_or_else(|| Identity::guest(Self::GUEST_ID)))
    }
}

fn read_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| GalleryError::from(e).with_context(format!("Failed to parse {:?}", path)))
}

/// Temp file then rename, like comment files
fn write_list<T: Serialize>(path: &Path, values: &[T]) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(values)?;
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        GalleryError::from(e).with_context(format!("Failed to write {:?}", path))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_open_empty_directory() {
        let temp = TempDir::new().unwrap();
        let catalog = Catalog::open(temp.path()).unwrap();

        assert!(catalog.items().is_empty());
        assert!(!Catalog::exists_in(temp.path()));
        // No guest on file still yields a guest identity
        assert_eq!(catalog.guest().unwrap().id, Catalog::GUEST_ID);
    }

    #[test]
    fn test_seed_default() {
        let temp = TempDir::new().unwrap();
        let catalog = Catalog::seed_default(temp.path()).unwrap();

        assert!(Catalog::exists_in(temp.path()));
        assert!(catalog.exists(Catalog::ROOT_ITEM_ID).unwrap());

        let admin = catalog.lookup(Catalog::ADMIN_ID).unwrap().unwrap();
        assert!(admin.admin);
        assert_eq!(admin.display_name(), "Gallery Administrator");
        assert!(catalog.is_guest(Catalog::GUEST_ID).unwrap());
        assert!(!catalog.is_guest(Catalog::ADMIN_ID).unwrap());
    }

    #[test]
    fn test_save_and_reopen() {
        let temp = TempDir::new().unwrap();
        let catalog = Catalog::seed_default(temp.path()).unwrap();

        catalog.add_item(Item::new(ItemId(7), "Holiday", Catalog::ADMIN_ID));
        let mut bob = Identity::new(IdentityId(3), "bob");
        bob.email = Some("bob@example.com".to_string());
        catalog.add_identity(bob.clone());
        catalog.save().unwrap();

        let reopened = Catalog::open(temp.path()).unwrap();
        assert_eq!(reopened.items().len(), 2);
        assert_eq!(
            reopened.find(ItemId(7)).unwrap().map(|i| i.title),
            Some("Holiday".to_string())
        );
        assert_eq!(reopened.lookup(IdentityId(3)).unwrap(), Some(bob));
        assert!(!temp.path().join("items.json.tmp").exists());
    }

    #[test]
    fn test_open_rejects_malformed_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(ITEMS_FILE), "not json").unwrap();

        let err = Catalog::open(temp.path()).err().unwrap();
        assert!(err.to_string().contains("items.json"));
    }
}
