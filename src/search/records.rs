//! Domain records fetched from the clinic backend.
//!
//! Shapes are checked by serde when a fetch result is decoded, so the
//! search layer only ever sees well-formed records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stock item in a department's inventory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub code: String,
    pub category: String,
    pub department: String,
    pub classification: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
}

/// Item moved out of active inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedItem {
    pub id: String,
    pub name: String,
    pub code: String,
    pub category: String,
    pub department: String,
    pub classification: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub archived_by: String,
    pub archived_at: DateTime<Utc>,
}

/// Audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: String,
    pub action: String,
    pub description: String,
    pub username: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn matches(&self, query: &str) -> bool {
        [
            self.name.as_str(),
            self.code.as_str(),
            self.category.as_str(),
            self.department.as_str(),
            self.classification.as_str(),
        ]
        .iter()
        .any(|field| contains_ci(field, query))
    }
}

impl ArchivedItem {
    pub fn matches(&self, query: &str) -> bool {
        [
            self.name.as_str(),
            self.code.as_str(),
            self.category.as_str(),
            self.reason.as_deref().unwrap_or_default(),
            self.archived_by.as_str(),
        ]
        .iter()
        .any(|field| contains_ci(field, query))
    }
}

impl ActivityLog {
    pub fn matches(&self, query: &str) -> bool {
        [
            self.action.as_str(),
            self.description.as_str(),
            self.username.as_str(),
            self.entity_type.as_deref().unwrap_or_default(),
        ]
        .iter()
        .any(|field| contains_ci(field, query))
    }
}

/// Case-insensitive substring test; `query` must already be lowercase.
pub(crate) fn contains_ci(field: &str, query: &str) -> bool {
    field.to_lowercase().contains(query)
}
