//! The SSOT envelope handed to the persistence layer.
//!
//! An envelope wraps one transformed record with its identity, provenance and
//! transformation metadata. It contains no wall-clock timestamps and no
//! generated identifiers: transforming the same record twice yields the same
//! envelope, byte for byte.

use crate::entity::SsotEntity;
use dialsync_field_mapping::sidecar::UnmappedMetadata;
use dialsync_field_mapping::transform::TransformedRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One transformed record in SSOT form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsotEnvelope {
    pub entity_type: SsotEntity,

    /// `ssot_<entity>_<id>` when the canonical record carries an id;
    /// absent otherwise (the source record had no id-mapped field).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// The job type that produced this envelope, when dispatch was used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<u32>,

    pub source_platform: String,

    /// Canonical fields as a nested object rooted at the entity name.
    pub mapped_fields: Value,

    /// Source fields preserved verbatim for the reverse pass.
    pub unmapped_metadata: UnmappedMetadata,

    pub transformation_info: TransformationInfo,
}

/// How the envelope was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationInfo {
    /// Version label of the mapping catalog that was applied.
    pub field_mapping_version: String,

    /// Coercion names actually applied, in order of first use.
    pub applied_rules: Vec<String>,

    pub validation: ValidationSummary,
}

/// Field-level validation outcome for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub status: ValidationStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Invalid,
}

impl SsotEnvelope {
    /// Wrap a transformed record.
    #[must_use]
    pub fn from_record(
        record: TransformedRecord,
        entity_type: SsotEntity,
        job_type: Option<u32>,
        source_platform: impl Into<String>,
        field_mapping_version: impl Into<String>,
    ) -> Self {
        let entity_id = canonical_id(&record.canonical_fields, entity_type)
            .map(|id| format!("ssot_{}_{id}", entity_type.as_str()));
        let status = if record.field_errors.is_empty() {
            ValidationStatus::Valid
        } else {
            ValidationStatus::Invalid
        };
        let errors = record
            .field_errors
            .iter()
            .map(ToString::to_string)
            .collect();

        SsotEnvelope {
            entity_type,
            entity_id,
            job_type,
            source_platform: source_platform.into(),
            mapped_fields: record.canonical_fields,
            unmapped_metadata: record.unmapped_metadata,
            transformation_info: TransformationInfo {
                field_mapping_version: field_mapping_version.into(),
                applied_rules: record.applied_transforms,
                validation: ValidationSummary {
                    status,
                    warnings: Vec::new(),
                    errors,
                },
            },
        }
    }

    /// The nested object for this envelope's own entity, if any fields mapped.
    #[must_use]
    pub fn entity_fields(&self) -> Option<&Value> {
        self.extract_entity(self.entity_type)
    }

    /// Pull the nested object for `entity` out of the mapped fields.
    #[must_use]
    pub fn extract_entity(&self, entity: SsotEntity) -> Option<&Value> {
        self.mapped_fields.get(entity.as_str())
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.transformation_info.validation.status == ValidationStatus::Valid
    }
}

/// Read `<entity>.id` from the canonical fields as a string key.
///
/// String and integer ids are accepted; anything else does not identify.
fn canonical_id(canonical_fields: &Value, entity: SsotEntity) -> Option<String> {
    let id = canonical_fields.get(entity.as_str())?.get("id")?;
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
