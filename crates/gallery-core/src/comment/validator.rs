//! Comment validation

use super::model::{Comment, CommentDraft};
use crate::config::CommentConfig;
use crate::error::{GalleryError, Result};
use crate::item::ItemRepository;
use crate::types::IdentityId;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[\-_a-z0-9'+*$\^&%=~!?\{\}]+(?:\.[\-_a-z0-9'+*$\^&%=~!?\{\}]+)*@(?:[a-z0-9](?:[\-a-z0-9.]*[a-z0-9])?\.[a-z]{2,63}|\d{1,3}(?:\.\d{1,3}){3})$",
    )
    .expect("email pattern compiles")
});

/// Machine-readable reason a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Required,
    Invalid,
    InvalidState,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Required => "required",
            ErrorCode::Invalid => "invalid",
            ErrorCode::InvalidState => "invalid_state",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field name to error code, one entry per failing field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, ErrorCode>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; the first error reported for a field is kept
    pub fn add(&mut self, field: impl Into<String>, code: ErrorCode) {
        self.errors.entry(field.into()).or_insert(code);
    }

    pub fn get(&self, field: &str) -> Option<ErrorCode> {
        self.errors.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ErrorCode)> {
        self.errors.iter().map(|(field, code)| (field.as_str(), *code))
    }

    /// `item_id` points at no existing item
    pub fn is_dangling_item(&self) -> bool {
        self.get("item_id") == Some(ErrorCode::Invalid)
    }

    /// `Ok(())` when empty, the collected errors otherwise
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(GalleryError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, code) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field, code)?;
            first = false;
        }
        Ok(())
    }
}

/// Validator for comments
#[derive(Debug, Clone, Default)]
pub struct CommentValidator {
    require_guest_email: bool,
}

impl CommentValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CommentConfig) -> Self {
        Self {
            require_guest_email: config.require_guest_email,
        }
    }

    /// Make guests supply an email address
    pub fn with_required_guest_email(mut self, required: bool) -> Self {
        self.require_guest_email = required;
        self
    }

    /// Collect every field error in the draft
    pub fn check(
        &self,
        draft: &CommentDraft,
        guest_id: IdentityId,
        items: &dyn ItemRepository,
    ) -> Result<ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let is_guest = draft.author_id == Some(guest_id);

        match draft.author_id {
            None => errors.add("author_id", ErrorCode::Required),
            Some(_) if is_guest && is_blank(&draft.guest_name) => {
                errors.add("guest_name", ErrorCode::Required)
            }
            Some(_) => {}
        }

        match draft.guest_email.as_deref().filter(|e| !e.trim().is_empty()) {
            Some(email) if !is_valid_email(email) => errors.add("guest_email", ErrorCode::Invalid),
            Some(_) => {}
            None if is_guest && self.require_guest_email => {
                errors.add("guest_email", ErrorCode::Required)
            }
            None => {}
        }

        if let Some(url) = draft.guest_url.as_deref().filter(|u| !u.trim().is_empty()) {
            if !is_valid_url(url) {
                errors.add("guest_url", ErrorCode::Invalid);
            }
        }

        let item_exists = match draft.item_id {
            Some(item_id) => items.exists(item_id)?,
            None => false,
        };
        if !item_exists {
            errors.add("item_id", ErrorCode::Invalid);
        }

        if draft.parsed_state().is_none() {
            errors.add("state", ErrorCode::InvalidState);
        }

        if draft.text.trim().is_empty() {
            errors.add("text", ErrorCode::Required);
        }

        Ok(errors)
    }

    /// Validate a draft and convert it into a typed comment
    pub fn validate(
        &self,
        draft: CommentDraft,
        guest_id: IdentityId,
        items: &dyn ItemRepository,
    ) -> Result<Comment> {
        self.check(&draft, guest_id, items)?.into_result()?;
        let missing = conversion_errors(&draft);
        draft
            .into_comment()
            .ok_or(GalleryError::Validation(missing))
    }
}

/// Fields that keep a draft from becoming a typed comment; a clean
/// `check` already rules all of these out
fn conversion_errors(draft: &CommentDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if draft.author_id.is_none() {
        errors.add("author_id", ErrorCode::Required);
    }
    if draft.item_id.is_none() {
        errors.add("item_id", ErrorCode::Invalid);
    }
    if draft.parsed_state().is_none() {
        errors.add("state", ErrorCode::InvalidState);
    }
    errors
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Syntactic email check
pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Absolute URL with a scheme and a host
pub fn is_valid_url(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) || !value.contains("://") {
        return false;
    }
    match url::Url::parse(value) {
        Ok(url) => url.host_str().is_some_and(|host| !host.is_empty()),
        Err(_) => false,
    }
}
