//! Persistent backends.
//!
//! - `fs`: one JSON document per dataset under a root directory (default).

mod fs;
pub use fs::FsDataSetStore;
