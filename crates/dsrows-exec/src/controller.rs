//! RowController: data entry for dataset rows.
//!
//! Each operation is stateless and runs the same way:
//! 1. resolve the dataset (`NotFound`),
//! 2. check that the caller may edit it (`AccessDenied`), before any write,
//! 3. do the work and shape a `ResponseState`.
//!
//! Mutations are two sequential store calls: the row write, then a data-only
//! save that stamps `last_data_edit` and nothing else. A failing second call does not undo the
//! first.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use dsrows_core::config::ServiceConfig;
use dsrows_core::id::{DataSetId, RowId};
use dsrows_core::schema::{DataSet, ValueKind};
use dsrows_core::types::{epoch_millis, Row};
use dsrows_io::{Backend, DataSetCatalog, DatasetRowStore, MediaLibrary, RowPage, SaveOptions};
use dsrows_operators::{DateService, GridQueryBuilder, GridQuerySpec, RawParams, RowCodec};

use crate::auth::{Authorizer, Caller, OwnerAuthorizer};
use crate::error::{ControllerError, Result};
use crate::metrics::emit_span;
use crate::state::ResponseState;

pub const PAGE_TEMPLATE: &str = "dataset-dataentry-page";
pub const GRID_TEMPLATE: &str = "grid";
pub const ADD_FORM_TEMPLATE: &str = "dataset-data-form-add";
pub const EDIT_FORM_TEMPLATE: &str = "dataset-data-form-edit";
pub const DELETE_FORM_TEMPLATE: &str = "dataset-data-form-delete";

/// Key under which the edit form's row carries resolved media, by column id.
pub const IMAGES_KEY: &str = "__images";

const GRID_FAILURE_PREFIX: &str = "Error getting DataSet data, failed with following message: ";

/// A grid query that failed and was turned into an empty page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degraded {
    pub message: String,
}

impl fmt::Display for Degraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub struct RowController {
    catalog: Arc<dyn DataSetCatalog>,
    rows: Arc<dyn DatasetRowStore>,
    media: Arc<dyn MediaLibrary>,
    authorizer: Arc<dyn Authorizer>,
    codec: RowCodec,
    grid: GridQueryBuilder,
}

impl RowController {
    pub fn new(
        catalog: Arc<dyn DataSetCatalog>,
        rows: Arc<dyn DatasetRowStore>,
        media: Arc<dyn MediaLibrary>,
        cfg: &ServiceConfig,
    ) -> Self {
        Self {
            catalog,
            rows,
            media,
            authorizer: Arc::new(OwnerAuthorizer),
            codec: RowCodec::new(DateService::from_offset_minutes(cfg.tz_offset_minutes)),
            grid: GridQueryBuilder::new(cfg.collation),
        }
    }

    /// All three collaborators served by one store.
    pub fn with_backend<B: Backend + 'static>(backend: Arc<B>, cfg: &ServiceConfig) -> Self {
        Self::new(backend.clone(), backend.clone(), backend, cfg)
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    fn load_editable(&self, caller: &Caller, id: DataSetId) -> Result<DataSet> {
        let data_set = self.catalog.get_by_id(id)?;
        if !self.authorizer.can_edit(caller, &data_set) {
            tracing::warn!(data_set = %id, user = %caller.user_id, "edit permission denied");
            return Err(ControllerError::AccessDenied);
        }
        Ok(data_set)
    }

    fn existing_row(&self, data_set: &DataSet, row_id: RowId) -> Result<Row> {
        self.rows
            .get_row(data_set, row_id)?
            .ok_or_else(|| ControllerError::NotFound("row not found".into()))
    }

    fn mark_modified(&self, mut data_set: DataSet) -> Result<()> {
        data_set.last_data_edit = epoch_millis();
        self.catalog.save(&data_set, SaveOptions::data_only())?;
        Ok(())
    }

    /// Page shell listing the dataset's columns.
    pub fn display_page(&self, caller: &Caller, id: DataSetId) -> Result<ResponseState> {
        let data_set = self.load_editable(caller, id)?;
        Ok(ResponseState::render(PAGE_TEMPLATE, json!({ "dataSet": data_set })))
    }

    /// One page of rows. A failing query still answers 200, with no rows and
    /// the failure as the message.
    pub fn grid(&self, caller: &Caller, id: DataSetId, params: &RawParams) -> Result<ResponseState> {
        let _span = tracing::debug_span!("grid", data_set = %id).entered();
        let data_set = self.load_editable(caller, id)?;
        let spec = self.grid.build_from_params(&data_set.columns, params);

        let state = match self.query_rows(&data_set, &spec) {
            Ok(page) => {
                let rows = page.rows.iter().map(Row::to_json).collect();
                let state = ResponseState::render(GRID_TEMPLATE, Value::Array(rows));
                // An empty match set carries no total.
                if page.total != 0 {
                    state.records_total(page.total)
                } else {
                    state
                }
            }
            Err(degraded) => {
                ResponseState::render(GRID_TEMPLATE, Value::Array(Vec::new())).message(degraded.message)
            }
        };

        if let Err(e) = self.catalog.set_active(id) {
            tracing::warn!(data_set = %id, error = %e, "could not mark dataset active");
        }
        Ok(state)
    }

    /// Run a grid query, converting any store failure into `Degraded`.
    pub fn query_rows(
        &self,
        data_set: &DataSet,
        spec: &GridQuerySpec,
    ) -> std::result::Result<RowPage, Degraded> {
        self.rows.query(data_set, spec).map_err(|e| {
            tracing::error!(data_set = %data_set.data_set_id, filter = %spec.filter, error = %e, "grid query failed");
            Degraded {
                message: format!("{GRID_FAILURE_PREFIX}{e}"),
            }
        })
    }

    pub fn add_form(&self, caller: &Caller, id: DataSetId) -> Result<ResponseState> {
        let data_set = self.load_editable(caller, id)?;
        Ok(ResponseState::render(ADD_FORM_TEMPLATE, json!({ "dataSet": data_set })))
    }

    pub fn add(&self, caller: &Caller, id: DataSetId, params: &RawParams) -> Result<ResponseState> {
        let _span = tracing::debug_span!("add_row", data_set = %id).entered();
        let data_set = self.load_editable(caller, id)?;
        let row = self.codec.build_for_insert(&data_set.columns, params)?;
        let row_id = self.rows.insert(&data_set, row)?;
        tracing::debug!(row = %row_id, "row inserted");
        self.mark_modified(data_set)?;

        emit_span("row_added", &[("data_set", id.to_string()), ("row", row_id.to_string())]);
        Ok(ResponseState::with_status(201)
            .message("Added Row")
            .id(row_id)
            .data(json!({ "id": row_id })))
    }

    /// Edit form: the row plus, under `__images`, the media resolved for each
    /// image column. Media that cannot be resolved is left out.
    pub fn edit_form(&self, caller: &Caller, id: DataSetId, row_id: RowId) -> Result<ResponseState> {
        let data_set = self.load_editable(caller, id)?;
        let row = self.existing_row(&data_set, row_id)?;

        let mut row_json = row.to_json();
        if let Value::Object(obj) = &mut row_json {
            obj.insert(IMAGES_KEY.into(), Value::Object(self.resolve_images(&data_set, &row)));
        }
        Ok(ResponseState::render(
            EDIT_FORM_TEMPLATE,
            json!({ "dataSet": data_set, "row": row_json }),
        ))
    }

    fn resolve_images(&self, data_set: &DataSet, row: &Row) -> Map<String, Value> {
        let mut images = Map::new();
        for column in data_set
            .columns
            .iter()
            .filter(|c| c.value_kind == ValueKind::Image)
        {
            let Some(media_id) = row.get(&column.heading).and_then(|v| v.as_media_id()) else {
                continue;
            };
            match self.media.get_by_id(media_id) {
                Ok(media) => match serde_json::to_value(&media) {
                    Ok(v) => {
                        images.insert(column.column_id.to_string(), v);
                    }
                    Err(e) => tracing::debug!(media = %media_id, error = %e, "media not serializable"),
                },
                Err(e) => {
                    tracing::debug!(column = %column.heading, media = %media_id, error = %e, "image not found")
                }
            }
        }
        images
    }

    pub fn edit(
        &self,
        caller: &Caller,
        id: DataSetId,
        row_id: RowId,
        params: &RawParams,
    ) -> Result<ResponseState> {
        let _span = tracing::debug_span!("edit_row", data_set = %id, row = %row_id).entered();
        let data_set = self.load_editable(caller, id)?;
        let existing = self.existing_row(&data_set, row_id)?;
        let row = self.codec.build_for_update(&data_set.columns, &existing, params)?;
        self.rows.update(&data_set, row_id, row)?;
        self.mark_modified(data_set)?;

        emit_span("row_edited", &[("data_set", id.to_string()), ("row", row_id.to_string())]);
        Ok(ResponseState::with_status(200)
            .message("Edited Row")
            .id(row_id)
            .data(json!({ "id": row_id })))
    }

    pub fn delete_form(&self, caller: &Caller, id: DataSetId, row_id: RowId) -> Result<ResponseState> {
        let data_set = self.load_editable(caller, id)?;
        let row = self.existing_row(&data_set, row_id)?;
        Ok(ResponseState::render(
            DELETE_FORM_TEMPLATE,
            json!({ "dataSet": data_set, "row": row.to_json() }),
        ))
    }

    pub fn delete(&self, caller: &Caller, id: DataSetId, row_id: RowId) -> Result<ResponseState> {
        let _span = tracing::debug_span!("delete_row", data_set = %id, row = %row_id).entered();
        let data_set = self.load_editable(caller, id)?;
        self.existing_row(&data_set, row_id)?;
        self.rows.delete(&data_set, row_id)?;
        self.mark_modified(data_set)?;

        emit_span("row_deleted", &[("data_set", id.to_string()), ("row", row_id.to_string())]);
        Ok(ResponseState::with_status(204).message("Deleted Row").id(row_id))
    }
}
