//! Request DTOs for the HTTP API

use serde::Deserialize;

use crate::search::InventoryItem;

/// Query string of `GET /search`. A missing `q` searches for nothing,
/// which lists every quick action.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Body of `PUT /inventory`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertInventoryRequest {
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(default)]
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

impl UpsertInventoryRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        let required = [
            ("id", &self.id),
            ("name", &self.name),
            ("code", &self.code),
            ("department", &self.department),
            ("classification", &self.classification),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Some(format!("{} cannot be empty", field));
        }
        if self.quantity < 0 {
            return Some("quantity cannot be negative".to_string());
        }
        None
    }

    pub fn into_item(self) -> InventoryItem {
        InventoryItem {
            id: self.id,
            name: self.name,
            code: self.code,
            category: self.category,
            department: self.department,
            classification: self.classification,
            quantity: self.quantity,
            unit: self.unit,
            is_archived: self.is_archived,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> UpsertInventoryRequest {
        serde_json::from_str(
            r#"{"id":"gz1","name":"Gauze Pads","code":"GZ1","department":"Nursing","classification":"Supplies","quantity":40,"unit":"pack"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_search_params_default_to_empty() {
        let params: SearchParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.q, "");
    }

    #[test]
    fn test_upsert_request_deserialize() {
        let req = request();
        assert_eq!(req.department, "Nursing");
        assert_eq!(req.unit.as_deref(), Some("pack"));
        assert!(!req.is_archived);
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_blank_field() {
        let mut req = request();
        req.department = "  ".to_string();
        assert_eq!(req.validate().as_deref(), Some("department cannot be empty"));
    }

    #[test]
    fn test_validate_negative_quantity() {
        let mut req = request();
        req.quantity = -1;
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_into_item_keeps_fields() {
        let item = request().into_item();
        assert_eq!(item.id, "gz1");
        assert_eq!(item.quantity, 40);
    }
}
