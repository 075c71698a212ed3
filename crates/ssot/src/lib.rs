//! Dialpad -> SSOT transformation catalog.
//!
//! The product half of the transformation stack: the canonical entity set,
//! the builtin Dialpad mapping tables (job types 60-63), and the envelope
//! format handed to the persistence layer. The generic mapping engine lives
//! in `dialsync-field-mapping`.

pub mod catalog;
pub mod entity;
pub mod envelope;
