//! External (REST) representation of comments

use super::model::Comment;
use crate::config::RestConfig;
use crate::error::Result;
use crate::item::ItemRepository;
use serde_json::{Map, Value};
use std::fmt::Display;

/// Key prefix of the request diagnostic fields
pub const DIAGNOSTIC_PREFIX: &str = "server_";

/// Builds REST resource URLs
#[derive(Debug, Clone)]
pub struct RestUrls {
    base_url: String,
}

impl RestUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &RestConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    /// `{base_url}/rest/{resource}/{id}`
    pub fn url(&self, resource: &str, id: impl Display) -> String {
        format!("{}/rest/{}/{}", self.base_url.trim_end_matches('/'), resource, id)
    }
}

impl Default for RestUrls {
    fn default() -> Self {
        Self::from_config(&RestConfig::default())
    }
}

impl Comment {
    /// All fields except the diagnostics, with `item_id` swapped for the
    /// item's REST URL (`null` if the item no longer exists).
    pub fn as_restful_array(
        &self,
        items: &dyn ItemRepository,
        urls: &RestUrls,
    ) -> Result<Map<String, Value>> {
        let mut data = match serde_json::to_value(self)? {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        data.retain(|key, _| !key.starts_with(DIAGNOSTIC_PREFIX));
        data.remove("item_id");

        let item = match self.item(items)? {
            Some(item) => Value::String(urls.url("item", item.id)),
            None => Value::Null,
        };
        data.insert("item".to_string(), item);

        Ok(data)
    }
}
