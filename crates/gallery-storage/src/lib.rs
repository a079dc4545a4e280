//! gallery-storage - Storage library for gallery-comments
//!
//! This crate provides file-system implementations of the comment
//! repository and of the item/identity lookups used by `gallery-core`.

mod catalog;
mod comment_store;

pub use catalog::Catalog;
pub use comment_store::{FileSystemStorage, CURRENT_SCHEMA_VERSION};
