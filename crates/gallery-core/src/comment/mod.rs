//! Comment module
//!
//! The comment entity, its validation and the create/update/save lifecycle.

pub mod builder;
pub mod diagnostics;
pub mod lifecycle;
pub mod manager;
pub mod model;
mod persistence;
pub mod rest;
pub mod validator;

pub use builder::CommentBuilder;
pub use diagnostics::{RequestMetadata, ServerDiagnostics};
pub use manager::{CommentManager, SaveOutcome};
pub use model::{Comment, CommentDraft, CommentState};
pub use persistence::CommentRepository;
pub use rest::{RestUrls, DIAGNOSTIC_PREFIX};
pub use validator::{CommentValidator, ErrorCode, ValidationErrors};
