//! The entity transformer: applies compiled mapping tables to source records.
//!
//! A [`Transformer`] is immutable after construction and safe to share across
//! tasks. Each transformation is a pure, synchronous computation over its
//! inputs; persistence and transport are the caller's concern.

use crate::coerce::CoercionRegistry;
use crate::error::{FieldError, MappingError, Result};
use crate::sidecar::{self, UnmappedMetadata};
use crate::table::TableSet;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// The result of transforming one source record.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedRecord {
    pub entity_type: String,
    /// Canonical fields as a nested JSON object (intermediate containers are
    /// created from the mappings' target paths).
    pub canonical_fields: Value,
    /// Source fields with no declared mapping, preserved verbatim.
    pub unmapped_metadata: UnmappedMetadata,
    /// Field-level failures collected on non-strict tables; empty on success.
    pub field_errors: Vec<FieldError>,
    /// Coercion names actually applied, in order of first use.
    pub applied_transforms: Vec<String>,
}

impl TransformedRecord {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.field_errors.is_empty()
    }
}

/// Applies compiled mapping tables and coercions to source records.
#[derive(Debug, Clone)]
pub struct Transformer {
    tables: TableSet,
    coercions: CoercionRegistry,
}

impl Transformer {
    #[must_use]
    pub fn new(tables: TableSet, coercions: CoercionRegistry) -> Self {
        Transformer { tables, coercions }
    }

    #[must_use]
    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    #[must_use]
    pub fn coercions(&self) -> &CoercionRegistry {
        &self.coercions
    }

    /// Transform a source record into its canonical form plus metadata sidecar.
    ///
    /// Field-level failures (coercion rejections, missing required fields) are
    /// collected into the returned record's `field_errors`; on a strict table
    /// any such failure aborts the whole record instead.
    ///
    /// # Errors
    ///
    /// - [`MappingError::UnknownEntityType`] if no table is registered.
    /// - [`MappingError::UnknownTransform`] if a mapping names a coercion the
    ///   registry does not have (configuration defect, never skipped).
    /// - [`MappingError::RecordFailed`] on a strict table with field errors.
    /// - [`MappingError::Config`] if the record is not a JSON object.
    pub fn transform(&self, entity_type: &str, record: &Value) -> Result<TransformedRecord> {
        let table = self.tables.lookup(entity_type)?;
        let Some(source) = record.as_object() else {
            return Err(MappingError::Config(format!(
                "source record for entity '{entity_type}' must be a JSON object"
            )));
        };

        let mut canonical = Value::Object(Map::new());
        let mut field_errors: Vec<FieldError> = Vec::new();
        let mut applied: Vec<String> = Vec::new();
        let mut consumed_roots: HashSet<&str> = HashSet::new();

        for mapping in &table.mappings {
            let Some(raw) = mapping.source.get(record) else {
                if mapping.required {
                    field_errors.push(FieldError::missing_required(mapping.source.as_str()));
                }
                continue;
            };
            consumed_roots.insert(mapping.source.root());

            let value = match &mapping.transform {
                Some(name) => {
                    match self.coercions.apply(name, mapping.source.as_str(), raw)? {
                        Ok(v) => {
                            if !applied.iter().any(|a| a == name) {
                                applied.push(name.clone());
                            }
                            v
                        }
                        Err(field_error) => {
                            tracing::warn!(
                                entity_type,
                                field = %mapping.source,
                                transform = %name,
                                error = %field_error,
                                "field coercion failed"
                            );
                            field_errors.push(field_error);
                            continue;
                        }
                    }
                }
                None => raw.clone(),
            };

            mapping.target.set(&mut canonical, value);
        }

        if table.strict && !field_errors.is_empty() {
            return Err(MappingError::RecordFailed {
                entity_type: entity_type.to_string(),
                errors: field_errors,
            });
        }

        let unmapped_metadata = sidecar::divert(
            source,
            &consumed_roots,
            &table.drop,
            table.annotation().as_deref(),
        );

        Ok(TransformedRecord {
            entity_type: entity_type.to_string(),
            canonical_fields: canonical,
            unmapped_metadata,
            field_errors,
            applied_transforms: applied,
        })
    }

    /// Resolve a job type to its entity type and transform.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnsupportedJobType`] for unregistered codes,
    /// plus everything [`Transformer::transform`] can return.
    pub fn dispatch(&self, job_type: u32, record: &Value) -> Result<TransformedRecord> {
        let entity_type = self.tables.entity_for_job_type(job_type)?.to_string();
        tracing::debug!(job_type, entity_type = %entity_type, "dispatching record");
        self.transform(&entity_type, record)
    }

    /// Reverse pass: rebuild a source-shaped record from canonical fields and
    /// the metadata sidecar.
    ///
    /// Each mapping's canonical value is written back at its source path (the
    /// first mapping wins where several share a source), then the sidecar is
    /// reinjected. Coercions are not inverted: coerced fields flow back in
    /// canonical form, so the round trip is exact for tables whose transforms
    /// are `identity` or absent.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnknownEntityType`] if no table is registered.
    pub fn reverse(
        &self,
        entity_type: &str,
        canonical_fields: &Value,
        unmapped_metadata: &UnmappedMetadata,
    ) -> Result<Value> {
        let table = self.tables.lookup(entity_type)?;
        let mut record = Value::Object(Map::new());

        for mapping in &table.mappings {
            let Some(value) = mapping.target.get(canonical_fields) else {
                continue;
            };
            if mapping.source.get(&record).is_none() {
                mapping.source.set(&mut record, value.clone());
            }
        }

        if let Value::Object(map) = &mut record {
            for (field, value) in sidecar::reinject(unmapped_metadata) {
                map.entry(field).or_insert(value);
            }
        }

        Ok(record)
    }
}
