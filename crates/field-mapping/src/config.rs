//! Declarative mapping configuration (the loader boundary).
//!
//! Mapping tables are data, not code: deployments declare field
//! correspondences in YAML or JSON, and [`MappingConfig::compile`] turns the
//! declaration into an immutable [`TableSet`] with fail-fast validation.
//! The engine core only ever sees the compiled form.

use crate::coerce::CoercionRegistry;
use crate::error::{MappingError, Result};
use crate::path::FieldPath;
use crate::table::{EntityTable, FieldMapping, TableSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Top-level mapping configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfig {
    /// Mapping tables keyed by entity type (`person`, `location`, ...).
    #[serde(default)]
    pub entities: BTreeMap<String, EntityTableConfig>,

    /// Job type dispatch: code -> entity type.
    #[serde(default)]
    pub job_types: BTreeMap<u32, String>,
}

/// Declarative table for one entity type.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTableConfig {
    /// Abort the whole record on any field-level error.
    #[serde(default)]
    pub strict: bool,

    /// Platform label used to annotate diverted fields.
    #[serde(default)]
    pub source_platform: Option<String>,

    /// Top-level source fields to discard instead of diverting.
    #[serde(default)]
    pub drop: Vec<String>,

    /// Ordered field mappings.
    #[serde(default)]
    pub fields: Vec<FieldMappingConfig>,
}

/// One declared field correspondence.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMappingConfig {
    /// Dot path into the source record.
    pub source: String,

    /// Dot path into the canonical record.
    pub target: String,

    /// Named coercion from the registry.
    #[serde(default)]
    pub transform: Option<String>,

    /// Treat absence of the source field as a field-level error.
    #[serde(default)]
    pub required: bool,

    /// Allow sharing the target path with other merge-flagged mappings.
    #[serde(default)]
    pub merge: bool,

    #[serde(default)]
    pub description: Option<String>,
}

impl MappingConfig {
    /// Parse a YAML configuration document.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed documents.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed documents.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a configuration file, choosing the parser by extension
    /// (`.json` is JSON, everything else is YAML).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&text)
        } else {
            Self::from_yaml(&text)
        }
    }

    /// Compile into an immutable [`TableSet`], validating against `coercions`.
    ///
    /// Validation is fail-fast: invalid paths, duplicate targets without the
    /// merge flag, job types naming undeclared entities, and references to
    /// unregistered coercions are all rejected here rather than at transform
    /// time.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Config`] or [`MappingError::UnknownTransform`]
    /// describing the first defect found.
    pub fn compile(&self, coercions: &CoercionRegistry) -> Result<TableSet> {
        let mut tables = HashMap::new();
        for (entity_type, table_cfg) in &self.entities {
            let table = compile_table(entity_type, table_cfg, coercions)?;
            table.validate()?;
            tables.insert(entity_type.clone(), table);
        }

        for (code, entity_type) in &self.job_types {
            if !tables.contains_key(entity_type) {
                return Err(MappingError::Config(format!(
                    "job type {code} maps to undeclared entity '{entity_type}'"
                )));
            }
        }

        tracing::debug!(
            entities = tables.len(),
            job_types = self.job_types.len(),
            "compiled mapping configuration"
        );

        Ok(TableSet::new(
            tables,
            self.job_types
                .iter()
                .map(|(code, entity)| (*code, entity.clone()))
                .collect(),
        ))
    }
}

fn compile_table(
    entity_type: &str,
    cfg: &EntityTableConfig,
    coercions: &CoercionRegistry,
) -> Result<EntityTable> {
    let mut mappings = Vec::with_capacity(cfg.fields.len());
    for field in &cfg.fields {
        let source = FieldPath::parse(&field.source).map_err(|e| {
            MappingError::Config(format!("entity '{entity_type}': invalid source path: {e}"))
        })?;
        let target = FieldPath::parse(&field.target).map_err(|e| {
            MappingError::Config(format!("entity '{entity_type}': invalid target path: {e}"))
        })?;

        if let Some(name) = &field.transform {
            if !coercions.contains(name) {
                return Err(MappingError::UnknownTransform {
                    name: name.clone(),
                    field: field.source.clone(),
                });
            }
        }

        mappings.push(FieldMapping {
            source,
            target,
            transform: field.transform.clone(),
            required: field.required,
            merge: field.merge,
            description: field.description.clone(),
        });
    }

    Ok(EntityTable {
        entity_type: entity_type.to_string(),
        strict: cfg.strict,
        source_platform: cfg.source_platform.clone(),
        drop: cfg.drop.iter().cloned().collect::<HashSet<String>>(),
        mappings,
    })
}
