//! The Dialpad -> SSOT catalog.
//!
//! Compiles the builtin (or a caller-supplied) mapping configuration once at
//! startup and exposes the job-type dispatch surface. The compiled catalog is
//! immutable and cheap to clone; share it freely across request handlers.

use crate::entity::SsotEntity;
use crate::envelope::SsotEnvelope;
use dialsync_field_mapping::coerce::CoercionRegistry;
use dialsync_field_mapping::config::MappingConfig;
use dialsync_field_mapping::error::{MappingError, Result};
use dialsync_field_mapping::transform::{TransformedRecord, Transformer};
use serde_json::Value;

/// Version label stamped into every envelope's transformation info.
pub const FIELD_MAPPING_VERSION: &str = "dialpad_v1.0";

const BUILTIN_CATALOG: &str = include_str!("catalog.yaml");

/// A compiled SSOT mapping catalog.
#[derive(Debug, Clone)]
pub struct SsotCatalog {
    transformer: Transformer,
    source_platform: String,
    version: String,
}

impl SsotCatalog {
    /// The builtin Dialpad catalog (job types 60-63) with builtin coercions.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalog fails to compile; that is a
    /// packaging defect, surfaced at startup rather than per request.
    pub fn builtin() -> Result<Self> {
        let config = MappingConfig::from_yaml(BUILTIN_CATALOG)?;
        Self::from_config(&config, CoercionRegistry::builtin(), "dialpad", FIELD_MAPPING_VERSION)
    }

    /// Compile a caller-supplied configuration into an SSOT catalog.
    ///
    /// Every declared entity must be one of the canonical [`SsotEntity`]
    /// kinds; this is what distinguishes an SSOT catalog from an arbitrary
    /// mapping table set.
    ///
    /// # Errors
    ///
    /// Returns configuration errors from compilation, or for entity types
    /// outside the SSOT set.
    pub fn from_config(
        config: &MappingConfig,
        coercions: CoercionRegistry,
        source_platform: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        for entity_type in config.entities.keys() {
            if entity_type.parse::<SsotEntity>().is_err() {
                return Err(MappingError::Config(format!(
                    "'{entity_type}' is not an SSOT entity type"
                )));
            }
        }
        let tables = config.compile(&coercions)?;
        let catalog = SsotCatalog {
            transformer: Transformer::new(tables, coercions),
            source_platform: source_platform.into(),
            version: version.into(),
        };
        tracing::debug!(
            entities = ?catalog.transformer.tables().entity_types(),
            job_types = ?catalog.transformer.tables().job_types(),
            version = %catalog.version,
            "compiled SSOT catalog"
        );
        Ok(catalog)
    }

    /// Transform a source record identified by its job type.
    ///
    /// # Errors
    ///
    /// - [`MappingError::UnsupportedJobType`] for unregistered codes.
    /// - Everything the underlying transformer can return (strict-table
    ///   aborts, configuration defects).
    pub fn transform(&self, job_type: u32, record: &Value) -> Result<SsotEnvelope> {
        let transformed = self.transformer.dispatch(job_type, record)?;
        self.wrap(transformed, Some(job_type))
    }

    /// Transform a source record for a known entity kind, bypassing dispatch.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`SsotCatalog::transform`], minus job-type
    /// resolution.
    pub fn transform_entity(&self, entity: SsotEntity, record: &Value) -> Result<SsotEnvelope> {
        let transformed = self.transformer.transform(entity.as_str(), record)?;
        self.wrap(transformed, None)
    }

    /// Rebuild a source-shaped record from an envelope (reverse pass).
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnknownEntityType`] if the envelope's entity
    /// has no table in this catalog.
    pub fn reverse(&self, envelope: &SsotEnvelope) -> Result<Value> {
        self.transformer.reverse(
            envelope.entity_type.as_str(),
            &envelope.mapped_fields,
            &envelope.unmapped_metadata,
        )
    }

    #[must_use]
    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    fn wrap(&self, transformed: TransformedRecord, job_type: Option<u32>) -> Result<SsotEnvelope> {
        let entity: SsotEntity = transformed.entity_type.parse().map_err(MappingError::Config)?;
        Ok(SsotEnvelope::from_record(
            transformed,
            entity,
            job_type,
            self.source_platform.clone(),
            self.version.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_compiles_and_registers_all_job_types() {
        let catalog = SsotCatalog::builtin().unwrap();
        let tables = catalog.transformer().tables();
        assert_eq!(tables.job_types(), vec![60, 61, 62, 63]);
        assert_eq!(
            tables.entity_types(),
            vec!["auto_attendant", "call_group", "location", "person"]
        );
    }

    #[test]
    fn from_config_rejects_non_ssot_entities() {
        let config = MappingConfig::from_yaml(
            r"
entities:
  widget:
    fields:
      - source: a
        target: widget.a
",
        )
        .unwrap();
        let err = SsotCatalog::from_config(
            &config,
            CoercionRegistry::builtin(),
            "dialpad",
            "test_v0",
        )
        .unwrap_err();
        assert!(err.to_string().contains("widget"));
    }
}
