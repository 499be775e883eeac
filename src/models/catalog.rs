//! Static catalog documents.
//!
//! A read-only catalog is published as a JSON document of the shape
//! `{ "destinations": [{"name": ..., "description": ...}, ...] }`. Entries
//! carry no ids; the consumer synthesizes sequential ids in list order.

use super::Destination;
use serde::{Deserialize, Serialize};

/// One entry of a static catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
}

/// A static catalog document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// The published entries, in document order.
    #[serde(default)]
    pub destinations: Vec<CatalogEntry>,
}

impl CatalogDocument {
    /// Converts the document into records, assigning ids 1.. in list order.
    #[must_use]
    pub fn into_destinations(self) -> Vec<Destination> {
        self.destinations
            .into_iter()
            .zip(1u64..)
            .map(|(entry, id)| Destination {
                id,
                name: entry.name,
                description: entry.description,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_in_list_order() {
        let document: CatalogDocument = serde_json::from_str(
            r#"{"destinations": [
                {"name": "Moon", "description": "Earth's natural satellite"},
                {"name": "Mars", "description": "The red planet"}
            ]}"#,
        )
        .unwrap();

        let records = document.into_destinations();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].name, "Moon");
        assert_eq!(records[1].id, 2);
        assert_eq!(records[1].name, "Mars");
    }

    #[test]
    fn test_missing_destinations_key_is_empty() {
        let document: CatalogDocument = serde_json::from_str("{}").unwrap();
        assert!(document.into_destinations().is_empty());
    }
}
