//! Error types for the field-mapping engine.

use thiserror::Error;

/// Main error type for mapping operations.
///
/// Configuration-defect variants (`UnknownEntityType`, `UnsupportedJobType`,
/// `UnknownTransform`, `Config`) always abort the call: they indicate a broken
/// deployment, not bad data. Data-defect failures are carried per field as
/// [`FieldError`] and only escalate to [`MappingError::RecordFailed`] on
/// strict tables.
#[derive(Error, Debug)]
pub enum MappingError {
    /// No mapping table is registered for the requested entity type.
    #[error("unknown entity type '{entity_type}'")]
    UnknownEntityType { entity_type: String },

    /// The job type code is not registered.
    #[error("unsupported job type {job_type}")]
    UnsupportedJobType { job_type: u32 },

    /// A mapping references a coercion that is not in the registry.
    #[error("unknown transform '{name}' referenced by mapping for '{field}'")]
    UnknownTransform { name: String, field: String },

    /// A strict table aborted the whole record on field-level errors.
    #[error("record transform failed for entity '{entity_type}': {}", format_field_errors(.errors))]
    RecordFailed {
        entity_type: String,
        errors: Vec<FieldError>,
    },

    /// Configuration errors (invalid paths, duplicate targets, bad job types).
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors (config file loading).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for mapping operations.
pub type Result<T> = std::result::Result<T, MappingError>;

/// A single field's data-level failure, collected per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Source-record field path the failure is attributed to.
    pub field: String,
    pub reason: FieldErrorReason,
}

/// Why a field failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorReason {
    /// The raw value failed coercion.
    Invalid(String),
    /// A required source field is absent.
    MissingRequired,
}

impl FieldError {
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            reason: FieldErrorReason::Invalid(reason.into()),
        }
    }

    #[must_use]
    pub fn missing_required(field: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            reason: FieldErrorReason::MissingRequired,
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            FieldErrorReason::Invalid(reason) => write!(f, "{}: {reason}", self.field),
            FieldErrorReason::MissingRequired => {
                write!(f, "{}: required field is missing", self.field)
            }
        }
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
