//! Demo API endpoints and the per-endpoint view state

pub mod catalog;
pub mod state;
pub mod transform;

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::api::TRANSACTIONS_ENDPOINT;

/// One table row: field name -> display text
pub type DataItem = BTreeMap<String, String>;

/// Rows handed to the table renderer
pub type Data = Vec<DataItem>;

/// Maps a raw response body to table rows. Must not panic on missing fields.
pub type Transform = fn(&Value) -> Data;

/// A table column: header title and the row field it reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub title: String,
    pub field: String,
}

impl Category {
    pub fn new(title: &str, field: &str) -> Self {
        Self {
            title: title.to_string(),
            field: field.to_string(),
        }
    }
}

/// Everything needed to query and display one endpoint
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    /// Path segment under `/api/`
    pub endpoint: String,
    pub name: Option<String>,
    pub categories: Vec<Category>,
    /// Upstream API route shown next to the name, e.g. `/auth/get/`
    pub schema: String,
    pub description: String,
    pub transform: Transform,
}

impl EndpointDescriptor {
    /// Only the transactions endpoint offers the sync operation
    pub fn supports_sync(&self) -> bool {
        self.endpoint == TRANSACTIONS_ENDPOINT
    }

    /// Identity rows hold several values per cell
    pub fn is_identity(&self) -> bool {
        self.endpoint == "identity"
    }

    /// Name for lists and titles, falling back to the endpoint path
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.endpoint)
    }
}
