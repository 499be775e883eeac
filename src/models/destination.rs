//! Destination records and their input shapes.

use serde::{Deserialize, Serialize};

/// A destination record.
///
/// Plain data with no identity beyond `id`. Ids are unique within one
/// collection and assigned by the backend (server-assigned for HTTP,
/// `max + 1` for key-value stores).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Unique identifier within the collection.
    pub id: u64,
    /// Display name, non-empty.
    pub name: String,
    /// Description, non-empty.
    pub description: String,
}

/// Input for creating a destination.
///
/// The id is never part of the input: backends assign it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationDraft {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
}

impl DestinationDraft {
    /// Creates a new draft.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Validates the draft against the required-field rules.
    ///
    /// Runs in the consumer before any backend call; a rejected draft never
    /// reaches a controller.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut issues = Vec::new();
        if self.name.trim().is_empty() {
            issues.push(ValidationIssue::new("name", "name is required"));
        }
        if self.description.trim().is_empty() {
            issues.push(ValidationIssue::new(
                "description",
                "description is required",
            ));
        }
        ValidationReport { issues }
    }

    /// Attaches a backend-assigned id, producing a full record.
    #[must_use]
    pub fn into_destination(self, id: u64) -> Destination {
        Destination {
            id,
            name: self.name,
            description: self.description,
        }
    }
}

/// Partial update for a destination.
///
/// Absent fields are left untouched and omitted from serialized PATCH bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationPatch {
    /// New display name, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DestinationPatch {
    /// Creates a patch that changes only the name.
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Creates a patch that changes only the description.
    #[must_use]
    pub fn describe(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Returns true when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    /// Merges the patch into an existing record.
    pub fn apply(&self, target: &mut Destination) {
        if let Some(name) = &self.name {
            target.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            target.description.clone_from(description);
        }
    }
}

/// A single validation problem on a draft field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// The field that has an issue.
    pub field: String,
    /// Description of the issue.
    pub message: String,
}

impl ValidationIssue {
    /// Creates an issue.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Issues found, empty when the draft is acceptable.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when the draft passed validation.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// Renders the issues as one line per field.
    #[must_use]
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_validate_ok() {
        let draft = DestinationDraft::new("Mars", "The red planet");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_draft_validate_missing_fields() {
        let report = DestinationDraft::new("", "  ").validate();
        assert!(!report.is_ok());
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[0].field, "name");
        assert_eq!(report.issues[1].field, "description");
        assert!(report.summary().contains("name is required"));
    }

    #[test]
    fn test_patch_apply_partial() {
        let mut record = Destination {
            id: 1,
            name: "Moon".to_string(),
            description: "Earth's natural satellite".to_string(),
        };
        DestinationPatch::describe("Edited").apply(&mut record);
        assert_eq!(record.name, "Moon");
        assert_eq!(record.description, "Edited");
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = DestinationPatch::rename("Europa");
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"name":"Europa"}"#);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(DestinationPatch::default().is_empty());
        assert!(!DestinationPatch::rename("x").is_empty());
    }

    #[test]
    fn test_draft_into_destination() {
        let record = DestinationDraft::new("Europa", "Icy moon of Jupiter").into_destination(6);
        assert_eq!(record.id, 6);
        assert_eq!(record.name, "Europa");
    }
}
