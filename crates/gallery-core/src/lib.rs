//! gallery-core - Core library for gallery-comments
//!
//! This crate provides the comment model of a web photo gallery: the
//! comment entity, field validation, moderation state, request diagnostics
//! and the create/update/save lifecycle with its domain events.
//!
//! Storage, identities, items and event subscribers are supplied by the
//! host application through the traits in [`comment`], [`identity`],
//! [`item`] and [`events`].

pub mod comment;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod item;
pub mod memory;
pub mod types;

pub use error::{GalleryError, Result};
pub use types::*;
