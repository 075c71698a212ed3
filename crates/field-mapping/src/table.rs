//! Compiled mapping tables.
//!
//! Tables are compiled once from declarative configuration (see
//! [`crate::config`]) and are immutable afterwards, so they can be shared
//! across concurrent transformations without locking.

use crate::error::{MappingError, Result};
use crate::path::FieldPath;
use std::collections::{HashMap, HashSet};

/// A single declared field correspondence.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    /// Dot path into the source record.
    pub source: FieldPath,
    /// Dot path into the canonical record.
    pub target: FieldPath,
    /// Optional named coercion applied to the raw value.
    pub transform: Option<String>,
    /// Absence of the source field is a field-level error when set.
    pub required: bool,
    /// Allows this mapping to share its target path with another mapping.
    pub merge: bool,
    pub description: Option<String>,
}

/// The ordered mapping table for one entity type.
#[derive(Debug, Clone)]
pub struct EntityTable {
    pub entity_type: String,
    /// Any field-level error aborts the whole record when set.
    pub strict: bool,
    /// Platform label used to annotate diverted fields.
    pub source_platform: Option<String>,
    /// Top-level source fields to discard instead of diverting.
    pub drop: HashSet<String>,
    pub mappings: Vec<FieldMapping>,
}

impl EntityTable {
    /// Annotation attached to diverted fields, when a platform is declared.
    #[must_use]
    pub fn annotation(&self) -> Option<String> {
        self.source_platform
            .as_deref()
            .map(|platform| format!("Unmapped {platform} field"))
    }

    /// Reject duplicate target paths unless every mapping sharing the path is
    /// flagged `merge`.
    pub(crate) fn validate(&self) -> Result<()> {
        let mut seen: HashMap<&str, &FieldMapping> = HashMap::new();
        for mapping in &self.mappings {
            if let Some(first) = seen.get(mapping.target.as_str()) {
                if !(first.merge && mapping.merge) {
                    return Err(MappingError::Config(format!(
                        "entity '{}': mappings '{}' and '{}' both write target '{}' without the merge flag",
                        self.entity_type,
                        first.source,
                        mapping.source,
                        mapping.target,
                    )));
                }
            } else {
                seen.insert(mapping.target.as_str(), mapping);
            }
        }
        Ok(())
    }
}

/// All compiled tables plus the job-type dispatch map.
///
/// Built at startup, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    tables: HashMap<String, EntityTable>,
    job_types: HashMap<u32, String>,
}

impl TableSet {
    pub(crate) fn new(tables: HashMap<String, EntityTable>, job_types: HashMap<u32, String>) -> Self {
        TableSet { tables, job_types }
    }

    /// Look up the table for an entity type.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnknownEntityType`] if no table is registered.
    pub fn lookup(&self, entity_type: &str) -> Result<&EntityTable> {
        self.tables
            .get(entity_type)
            .ok_or_else(|| MappingError::UnknownEntityType {
                entity_type: entity_type.to_string(),
            })
    }

    /// The ordered mappings for an entity type.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnknownEntityType`] if no table is registered.
    pub fn mappings_for(&self, entity_type: &str) -> Result<&[FieldMapping]> {
        Ok(&self.lookup(entity_type)?.mappings)
    }

    /// Resolve a job type code to its entity type.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnsupportedJobType`] for unregistered codes.
    pub fn entity_for_job_type(&self, job_type: u32) -> Result<&str> {
        self.job_types
            .get(&job_type)
            .map(String::as_str)
            .ok_or(MappingError::UnsupportedJobType { job_type })
    }

    /// Registered entity types, sorted.
    #[must_use]
    pub fn entity_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered job type codes, sorted.
    #[must_use]
    pub fn job_types(&self) -> Vec<u32> {
        let mut codes: Vec<u32> = self.job_types.keys().copied().collect();
        codes.sort_unstable();
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(source: &str, target: &str, merge: bool) -> FieldMapping {
        FieldMapping {
            source: FieldPath::parse(source).unwrap(),
            target: FieldPath::parse(target).unwrap(),
            transform: None,
            required: false,
            merge,
            description: None,
        }
    }

    fn table(mappings: Vec<FieldMapping>) -> EntityTable {
        EntityTable {
            entity_type: "person".to_string(),
            strict: false,
            source_platform: None,
            drop: HashSet::new(),
            mappings,
        }
    }

    #[test]
    fn validate_rejects_duplicate_targets() {
        let t = table(vec![
            mapping("email", "person.email", false),
            mapping("work_email", "person.email", false),
        ]);
        let err = t.validate().unwrap_err();
        assert!(err.to_string().contains("person.email"));
    }

    #[test]
    fn validate_allows_duplicate_targets_when_both_merge() {
        let t = table(vec![
            mapping("email", "person.email", true),
            mapping("work_email", "person.email", true),
        ]);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn validate_rejects_mixed_merge_flags() {
        let t = table(vec![
            mapping("email", "person.email", true),
            mapping("work_email", "person.email", false),
        ]);
        assert!(t.validate().is_err());
    }

    #[test]
    fn annotation_includes_the_platform() {
        let mut t = table(vec![]);
        assert_eq!(t.annotation(), None);
        t.source_platform = Some("dialpad".to_string());
        assert_eq!(t.annotation().as_deref(), Some("Unmapped dialpad field"));
    }

    #[test]
    fn lookup_fails_for_unknown_entity_types() {
        let set = TableSet::default();
        let err = set.lookup("person").unwrap_err();
        assert!(matches!(
            err,
            MappingError::UnknownEntityType { entity_type } if entity_type == "person"
        ));
    }

    #[test]
    fn entity_for_job_type_fails_for_unregistered_codes() {
        let mut tables = HashMap::new();
        tables.insert("person".to_string(), table(vec![]));
        let mut job_types = HashMap::new();
        job_types.insert(60, "person".to_string());
        let set = TableSet::new(tables, job_types);

        assert_eq!(set.entity_for_job_type(60).unwrap(), "person");
        assert!(matches!(
            set.entity_for_job_type(999).unwrap_err(),
            MappingError::UnsupportedJobType { job_type: 999 }
        ));
        assert_eq!(set.job_types(), vec![60]);
        assert_eq!(set.entity_types(), vec!["person"]);
    }

    #[test]
    fn mappings_for_returns_the_ordered_slice() {
        let mut tables = HashMap::new();
        tables.insert(
            "person".to_string(),
            table(vec![
                mapping("email", "person.email", false),
                mapping("first_name", "person.first_name", false),
            ]),
        );
        let set = TableSet::new(tables, HashMap::new());

        let mappings = set.mappings_for("person").unwrap();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].source.as_str(), "email");
        assert_eq!(mappings[1].source.as_str(), "first_name");
        assert!(set.mappings_for("location").is_err());
    }
}
