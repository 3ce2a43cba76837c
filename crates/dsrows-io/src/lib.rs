#![forbid(unsafe_code)]
//! dsrows-io: storage collaborators for the row controller.
//!
//! `traits` defines what the controller needs from a store. Two backends
//! implement all of it:
//! - `memory_storage::MemoryDataSetStore`: in-process maps, used by tests.
//! - `storage::FsDataSetStore`: one JSON document per dataset on disk.
//!
//! Both delegate grid execution to `query::execute` so filtering, sorting and
//! paging behave identically.

pub mod error;
pub mod memory_storage;
pub mod query;
pub mod storage;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory_storage::MemoryDataSetStore;
pub use storage::FsDataSetStore;
pub use traits::{Backend, DataSetCatalog, DatasetRowStore, MediaLibrary, RowPage, SaveOptions};
