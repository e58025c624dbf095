//! Static navigation shortcuts and search suggestions.

use std::collections::BTreeMap;

use crate::search::records::contains_ci;
use crate::search::results::{SearchResult, SearchResultType};

/// A navigation or command entry offered regardless of live data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAction {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub url: &'static str,
    pub keywords: &'static [&'static str],
}

pub const QUICK_ACTIONS: &[QuickAction] = &[
    QuickAction {
        id: "go-inventory",
        title: "Go to Inventory",
        description: "Browse stock by department and classification",
        icon: "package",
        url: "/inventory",
        keywords: &["inventory", "supplies", "stock", "items", "medications", "equipment"],
    },
    QuickAction {
        id: "add-inventory-item",
        title: "Add Inventory Item",
        description: "Register a new item in stock",
        icon: "plus",
        url: "/inventory?action=add",
        keywords: &["new item", "add", "create", "stock"],
    },
    QuickAction {
        id: "go-archives",
        title: "View Archives",
        description: "Items removed from active inventory",
        icon: "archive",
        url: "/archives",
        keywords: &["archive", "archived", "disposed", "expired"],
    },
    QuickAction {
        id: "go-logs",
        title: "Activity Logs",
        description: "Audit trail of recent changes",
        icon: "clock",
        url: "/logs",
        keywords: &["logs", "activity", "audit", "history"],
    },
    QuickAction {
        id: "go-patients",
        title: "Patients",
        description: "Patient records and admissions",
        icon: "users",
        url: "/patients",
        keywords: &["patient", "records", "admission"],
    },
    QuickAction {
        id: "new-consultation",
        title: "New Consultation",
        description: "Start a consultation for a patient",
        icon: "stethoscope",
        url: "/consultations?action=new",
        keywords: &["consultation", "visit", "checkup"],
    },
    QuickAction {
        id: "record-vitals",
        title: "Record Vital Signs",
        description: "Blood pressure, pulse, temperature and more",
        icon: "activity",
        url: "/vitals?action=new",
        keywords: &["vitals", "vital signs", "blood pressure", "temperature", "pulse"],
    },
    QuickAction {
        id: "gcs-assessment",
        title: "Glasgow Coma Scale Assessment",
        description: "Score eye, verbal and motor response",
        icon: "brain",
        url: "/gcs?action=new",
        keywords: &["gcs", "glasgow", "coma", "consciousness"],
    },
    QuickAction {
        id: "go-attachments",
        title: "Attachments",
        description: "Uploaded documents and images",
        icon: "paperclip",
        url: "/attachments",
        keywords: &["attachments", "files", "documents", "upload"],
    },
];

/// Suggestion terms grouped by the area they lead to.
pub const SEARCH_SHORTCUTS: &[(&str, &[&str])] = &[
    ("inventory", &["supplies", "medications", "equipment", "low stock"]),
    ("archives", &["archived items", "disposed items", "expired stock"]),
    ("logs", &["recent activity", "audit trail", "stock adjustments"]),
    ("patients", &["patient records", "admissions", "consultations"]),
    ("vitals", &["vital signs", "blood pressure", "glasgow coma scale"]),
];

impl QuickAction {
    /// Empty queries match every action.
    pub fn matches(&self, query: &str) -> bool {
        query.is_empty()
            || contains_ci(self.title, query)
            || contains_ci(self.description, query)
            || self.keywords.iter().any(|k| contains_ci(k, query))
    }

    pub fn to_result(&self, priority: u32) -> SearchResult {
        SearchResult {
            id: format!("action-{}", self.id),
            result_type: SearchResultType::Action,
            title: self.title.to_string(),
            subtitle: None,
            description: Some(self.description.to_string()),
            metadata: BTreeMap::new(),
            icon: self.icon.to_string(),
            url: Some(self.url.to_string()),
            priority,
            item_data: None,
            page_location: None,
        }
    }
}

/// Actions matching a lowercase query, in table order.
pub fn matching_actions(query: &str) -> Vec<&'static QuickAction> {
    QUICK_ACTIONS.iter().filter(|a| a.matches(query)).collect()
}

/// Shortcut terms for a lowercase query: every term of an area whose name
/// contains the query, plus any single term containing it.
pub fn suggestions(query: &str, limit: usize) -> Vec<String> {
    if query.is_empty() {
        return Vec::new();
    }

    let mut out: Vec<String> = Vec::new();
    for (area, terms) in SEARCH_SHORTCUTS {
        let whole_area = area.contains(query);
        for term in terms.iter() {
            if (whole_area || term.contains(query)) && !out.iter().any(|t| t == term) {
                out.push(term.to_string());
            }
        }
    }
    out.truncate(limit);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supp_suggests_supplies() {
        let found = suggestions("supp", 5);
        assert!(found.contains(&"supplies".to_string()));
    }

    #[test]
    fn test_area_name_suggests_all_its_terms() {
        let found = suggestions("invent", 5);
        assert_eq!(found, vec!["supplies", "medications", "equipment", "low stock"]);
    }

    #[test]
    fn test_suggestions_capped_and_deduplicated() {
        let found = suggestions("s", 3);
        assert_eq!(found.len(), 3);

        let mut unique = found.clone();
        unique.dedup();
        assert_eq!(unique, found);
    }

    #[test]
    fn test_supp_matches_inventory_action() {
        let actions = matching_actions("supp");
        assert!(actions.iter().any(|a| a.title.contains("Inventory")));
    }

    #[test]
    fn test_empty_query_matches_every_action() {
        assert_eq!(matching_actions("").len(), QUICK_ACTIONS.len());
    }

    #[test]
    fn test_no_match() {
        assert!(matching_actions("zzzz").is_empty());
        assert!(suggestions("zzzz", 5).is_empty());
    }

    #[test]
    fn test_action_result_shape() {
        let result = QUICK_ACTIONS[0].to_result(100);
        assert_eq!(result.id, "action-go-inventory");
        assert_eq!(result.result_type, SearchResultType::Action);
        assert_eq!(result.url.as_deref(), Some("/inventory"));
    }
}
