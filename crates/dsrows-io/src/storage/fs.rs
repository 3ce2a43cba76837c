use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use dsrows_core::config::ServiceConfig;
use dsrows_core::id::{DataSetId, MediaId, RowId, UserId};
use dsrows_core::schema::DataSet;
use dsrows_core::types::{epoch_millis, Media, Row};
use dsrows_operators::GridQuerySpec;

use crate::error::{Result, StoreError};
use crate::query;
use crate::traits::{apply_save, check_fields, DataSetCatalog, DatasetRowStore, MediaLibrary, RowPage, SaveOptions};

/// On-disk layout of one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataSetDocument {
    data_set: DataSet,
    #[serde(default)]
    rows: Vec<Row>,
    /// Next row id to hand out; survives deletes of the highest row.
    #[serde(default)]
    next_row_id: u64,
}

/// Filesystem store rooted at a data directory:
///
/// ```text
/// <root>/datasets/<id>.json   dataset + rows
/// <root>/media.json           media library
/// ```
///
/// Writes go to a temp file and are renamed into place. A process-wide mutex
/// serializes read-modify-write cycles; separate processes are not coordinated.
#[derive(Debug)]
pub struct FsDataSetStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FsDataSetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn from_config(cfg: &ServiceConfig) -> Self {
        Self::new(&cfg.data_dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn data_sets_dir(&self) -> PathBuf {
        self.root.join("datasets")
    }

    fn doc_path(&self, id: DataSetId) -> PathBuf {
        self.data_sets_dir().join(format!("{}.json", id.get()))
    }

    fn media_path(&self) -> PathBuf {
        self.root.join("media.json")
    }

    fn read_doc(&self, id: DataSetId) -> Result<DataSetDocument> {
        let bytes = match fs::read(self.doc_path(id)) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::DataSetNotFound(id))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_doc(&self, doc: &DataSetDocument) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        write_atomic(&self.doc_path(doc.data_set.data_set_id), &bytes)
    }

    fn read_media(&self) -> Result<Vec<Media>> {
        match fs::read(self.media_path()) {
            Ok(b) => Ok(serde_json::from_slice(&b)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// All datasets, ordered by id.
    pub fn list_data_sets(&self) -> Result<Vec<DataSet>> {
        let _g = self.guard();
        self.list_unlocked()
    }

    /// Caller must hold the guard.
    fn list_unlocked(&self) -> Result<Vec<DataSet>> {
        let dir = self.data_sets_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<DataSetId>().ok());
            if let (Some(id), Some("json")) = (id, path.extension().and_then(|e| e.to_str())) {
                out.push(self.read_doc(id)?.data_set);
            }
        }
        out.sort_by_key(|d| d.data_set_id);
        Ok(out)
    }

    /// Create an empty dataset with the next free id.
    pub fn create_data_set(&self, name: &str, owner_id: UserId) -> Result<DataSet> {
        let _g = self.guard();
        let next = self
            .list_unlocked()?
            .last()
            .map_or(1, |d| d.data_set_id.get() + 1);
        let data_set = DataSet::new(DataSetId::new(next), name, owner_id);
        data_set.validate()?;

        self.write_doc(&DataSetDocument {
            data_set: data_set.clone(),
            rows: Vec::new(),
            next_row_id: 1,
        })?;
        tracing::debug!(data_set = %data_set.data_set_id, name, "created dataset");
        Ok(data_set)
    }

    pub fn add_media(&self, name: &str, stored_as: Option<String>) -> Result<Media> {
        let _g = self.guard();
        let mut library = self.read_media()?;
        let next = library.iter().map(|m| m.media_id.get()).max().unwrap_or(0) + 1;
        let media = Media {
            media_id: MediaId::new(next),
            name: name.to_string(),
            stored_as,
        };
        library.push(media.clone());
        write_atomic(&self.media_path(), &serde_json::to_vec_pretty(&library)?)?;
        Ok(media)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let mut f = File::create(&tmp)?;
    f.write_all(bytes)?;
    f.flush()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl DataSetCatalog for FsDataSetStore {
    fn get_by_id(&self, id: DataSetId) -> Result<DataSet> {
        let _g = self.guard();
        Ok(self.read_doc(id)?.data_set)
    }

    fn save(&self, data_set: &DataSet, opts: SaveOptions) -> Result<()> {
        if opts.validate {
            data_set.validate()?;
        }
        let _g = self.guard();
        let mut doc = self.read_doc(data_set.data_set_id)?;
        apply_save(&mut doc.data_set, data_set, opts);
        self.write_doc(&doc)
    }

    fn set_active(&self, id: DataSetId) -> Result<()> {
        let _g = self.guard();
        let mut doc = self.read_doc(id)?;
        doc.data_set.last_active = epoch_millis();
        self.write_doc(&doc)
    }
}

impl DatasetRowStore for FsDataSetStore {
    fn query(&self, data_set: &DataSet, spec: &GridQuerySpec) -> Result<RowPage> {
        let _g = self.guard();
        let doc = self.read_doc(data_set.data_set_id)?;
        query::execute(data_set, &doc.rows, spec)
    }

    fn get_row(&self, data_set: &DataSet, row_id: RowId) -> Result<Option<Row>> {
        let _g = self.guard();
        let doc = self.read_doc(data_set.data_set_id)?;
        Ok(doc.rows.into_iter().find(|r| r.row_id == Some(row_id)))
    }

    fn insert(&self, data_set: &DataSet, mut row: Row) -> Result<RowId> {
        check_fields(data_set, &row)?;
        let _g = self.guard();
        let mut doc = self.read_doc(data_set.data_set_id)?;
        let after_max = doc
            .rows
            .iter()
            .filter_map(|r| r.row_id)
            .map(RowId::get)
            .max()
            .unwrap_or(0)
            + 1;
        let next = doc.next_row_id.max(after_max);
        doc.next_row_id = next + 1;
        let row_id = RowId::new(next);
        row.row_id = Some(row_id);
        doc.rows.push(row);
        self.write_doc(&doc)?;
        Ok(row_id)
    }

    fn update(&self, data_set: &DataSet, row_id: RowId, mut row: Row) -> Result<()> {
        check_fields(data_set, &row)?;
        let _g = self.guard();
        let mut doc = self.read_doc(data_set.data_set_id)?;
        let slot = doc
            .rows
            .iter_mut()
            .find(|r| r.row_id == Some(row_id))
            .ok_or(StoreError::RowNotFound {
                data_set_id: data_set.data_set_id,
                row_id,
            })?;
        row.row_id = Some(row_id);
        *slot = row;
        self.write_doc(&doc)
    }

    fn delete(&self, data_set: &DataSet, row_id: RowId) -> Result<()> {
        let _g = self.guard();
        let mut doc = self.read_doc(data_set.data_set_id)?;
        let before = doc.rows.len();
        doc.rows.retain(|r| r.row_id != Some(row_id));
        if doc.rows.len() == before {
            return Err(StoreError::RowNotFound {
                data_set_id: data_set.data_set_id,
                row_id,
            });
        }
        self.write_doc(&doc)
    }
}

impl MediaLibrary for FsDataSetStore {
    fn get_by_id(&self, id: MediaId) -> Result<Media> {
        let _g = self.guard();
        self.read_media()?
            .into_iter()
            .find(|m| m.media_id == id)
            .ok_or(StoreError::MediaNotFound(id))
    }
}
