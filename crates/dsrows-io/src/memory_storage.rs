//! In-memory backend for testing.
//!
//! Keeps datasets, rows and media in maps behind one mutex. Every mutating
//! call bumps a counter so tests can assert that nothing was written.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dsrows_core::id::{DataSetId, MediaId, RowId};
use dsrows_core::schema::DataSet;
use dsrows_core::types::{epoch_millis, Media, Row};
use dsrows_operators::GridQuerySpec;

use crate::error::{Result, StoreError};
use crate::query;
use crate::traits::{apply_save, check_fields, DataSetCatalog, DatasetRowStore, MediaLibrary, RowPage, SaveOptions};

#[derive(Default)]
struct Inner {
    data_sets: BTreeMap<DataSetId, DataSet>,
    rows: BTreeMap<DataSetId, BTreeMap<RowId, Row>>,
    /// Next row id per dataset; only ever grows.
    next_row_ids: BTreeMap<DataSetId, u64>,
    media: BTreeMap<MediaId, Media>,
    mutations: u64,
}

/// Thread-safe in-memory store.
#[derive(Clone, Default)]
pub struct MemoryDataSetStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDataSetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pre-populate a dataset (used by tests).
    pub fn insert_data_set(&self, data_set: DataSet) {
        let mut inner = self.lock();
        inner.rows.entry(data_set.data_set_id).or_default();
        inner.data_sets.insert(data_set.data_set_id, data_set);
    }

    pub fn insert_media(&self, media: Media) {
        self.lock().media.insert(media.media_id, media);
    }

    pub fn remove_media(&self, id: MediaId) {
        self.lock().media.remove(&id);
    }

    pub fn row_count(&self, id: DataSetId) -> usize {
        self.lock().rows.get(&id).map_or(0, BTreeMap::len)
    }

    /// Number of writes (row mutations, saves, activity marks) so far.
    pub fn mutation_count(&self) -> u64 {
        self.lock().mutations
    }
}

impl DataSetCatalog for MemoryDataSetStore {
    fn get_by_id(&self, id: DataSetId) -> Result<DataSet> {
        self.lock()
            .data_sets
            .get(&id)
            .cloned()
            .ok_or(StoreError::DataSetNotFound(id))
    }

    fn save(&self, data_set: &DataSet, opts: SaveOptions) -> Result<()> {
        if opts.validate {
            data_set.validate()?;
        }
        let mut inner = self.lock();
        let stored = inner
            .data_sets
            .get_mut(&data_set.data_set_id)
            .ok_or(StoreError::DataSetNotFound(data_set.data_set_id))?;

        apply_save(stored, data_set, opts);
        inner.mutations += 1;
        Ok(())
    }

    fn set_active(&self, id: DataSetId) -> Result<()> {
        let mut inner = self.lock();
        let stored = inner
            .data_sets
            .get_mut(&id)
            .ok_or(StoreError::DataSetNotFound(id))?;
        stored.last_active = epoch_millis();
        inner.mutations += 1;
        Ok(())
    }
}

impl DatasetRowStore for MemoryDataSetStore {
    fn query(&self, data_set: &DataSet, spec: &GridQuerySpec) -> Result<RowPage> {
        let inner = self.lock();
        let rows = inner
            .rows
            .get(&data_set.data_set_id)
            .ok_or(StoreError::DataSetNotFound(data_set.data_set_id))?;
        query::execute(data_set, rows.values(), spec)
    }

    fn get_row(&self, data_set: &DataSet, row_id: RowId) -> Result<Option<Row>> {
        let inner = self.lock();
        Ok(inner
            .rows
            .get(&data_set.data_set_id)
            .and_then(|rows| rows.get(&row_id))
            .cloned())
    }

    fn insert(&self, data_set: &DataSet, mut row: Row) -> Result<RowId> {
        check_fields(data_set, &row)?;
        let mut guard = self.lock();
        let inner = &mut *guard;
        let rows = inner.rows.entry(data_set.data_set_id).or_default();
        let counter = inner.next_row_ids.entry(data_set.data_set_id).or_insert(1);
        let next = (*counter).max(rows.keys().next_back().map_or(1, |id| id.get() + 1));
        *counter = next + 1;

        let row_id = RowId::new(next);
        row.row_id = Some(row_id);
        rows.insert(row_id, row);
        inner.mutations += 1;
        Ok(row_id)
    }

    fn update(&self, data_set: &DataSet, row_id: RowId, mut row: Row) -> Result<()> {
        check_fields(data_set, &row)?;
        let mut inner = self.lock();
        let slot = inner
            .rows
            .get_mut(&data_set.data_set_id)
            .and_then(|rows| rows.get_mut(&row_id))
            .ok_or(StoreError::RowNotFound {
                data_set_id: data_set.data_set_id,
                row_id,
            })?;
        row.row_id = Some(row_id);
        *slot = row;
        inner.mutations += 1;
        Ok(())
    }

    fn delete(&self, data_set: &DataSet, row_id: RowId) -> Result<()> {
        let mut inner = self.lock();
        inner
            .rows
            .get_mut(&data_set.data_set_id)
            .and_then(|rows| rows.remove(&row_id))
            .ok_or(StoreError::RowNotFound {
                data_set_id: data_set.data_set_id,
                row_id,
            })?;
        inner.mutations += 1;
        Ok(())
    }
}

impl MediaLibrary for MemoryDataSetStore {
    fn get_by_id(&self, id: MediaId) -> Result<Media> {
        self.lock()
            .media
            .get(&id)
            .cloned()
            .ok_or(StoreError::MediaNotFound(id))
    }
}
