//! Declarative field mapping between vendor records and a canonical schema.
//!
//! This crate is the generic half of the transformation stack:
//! - a mapping DSL ([`config`]) compiled into immutable tables ([`table`])
//! - pure value coercions ([`coerce`])
//! - an unmapped-field metadata sidecar for lossless round trips ([`sidecar`])
//! - the transformer that ties them together ([`transform`])
//!
//! It intentionally knows nothing about any particular vendor or canonical
//! entity set; product catalogs layer on top.

pub mod coerce;
pub mod config;
pub mod error;
pub mod path;
pub mod sidecar;
pub mod table;
pub mod transform;
