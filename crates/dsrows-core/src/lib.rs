#![forbid(unsafe_code)]
//! dsrows-core: shared vocabulary for dataset row handling.
//!
//! Pure data only. Column schemas, rows, field values, identifiers and the
//! service configuration live here so that the codec, the stores and the
//! controller agree on one representation.

pub mod config;
pub mod error;
pub mod id;
pub mod prelude;
pub mod schema;
pub mod types;
