//! dsrows CLI: dataset row data entry against the filesystem store.
//!
//! Every row command acts as `--user` and prints the controller's response
//! state as JSON. Failures print the same shape and exit non-zero.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use dsrows_core::prelude::{
    Collation, ColumnId, ColumnKind, ColumnSchema, DataSet, DataSetId, RowId, ServiceConfig,
    UserId, ValueKind,
};
use dsrows_exec::{Caller, ControllerError, ResponseState, RowController};
use dsrows_io::{DataSetCatalog, FsDataSetStore, SaveOptions};
use dsrows_operators::codec::param_key;
use dsrows_operators::RawParams;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "dsrows")]
#[command(about = "Add, edit, delete and list the rows of user-defined datasets", long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: ConfigOverrides,

    /// User id to act as
    #[arg(long, global = true, default_value_t = 1)]
    user: u64,

    /// Act as a super admin (bypasses ownership checks)
    #[arg(long, global = true)]
    super_admin: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Flags that take precedence over `DSROWS_*` environment variables.
#[derive(Args, Debug, Default)]
struct ConfigOverrides {
    /// Filesystem store root (overrides DSROWS_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Filter collation: ci or cs (overrides DSROWS_COLLATION)
    #[arg(long, global = true)]
    collation: Option<String>,

    /// Local timezone offset in minutes (overrides DSROWS_TZ_OFFSET_MINUTES)
    #[arg(long, global = true, allow_hyphen_values = true)]
    tz_offset_minutes: Option<i32>,

    /// Grid page size when --length is absent (overrides DSROWS_DEFAULT_PAGE_SIZE)
    #[arg(long, global = true)]
    default_page_size: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a dataset from a YAML definition
    CreateDataset {
        /// Path to the dataset YAML file
        #[arg(short, long)]
        definition: PathBuf,
    },

    /// Append a column to an existing dataset
    AddColumn {
        data_set: u64,
        heading: String,

        /// value, formula or remote
        #[arg(long, default_value = "value")]
        kind: String,

        /// string, number, date or image
        #[arg(long = "type", default_value = "string")]
        value_type: String,

        /// Comma separated allowed values
        #[arg(long)]
        list_content: Option<String>,
    },

    /// Register a media library item for image columns
    AddMedia {
        name: String,

        #[arg(long)]
        stored_as: Option<String>,
    },

    /// Render the data entry page shell
    Page { data_set: u64 },

    /// List rows with filter, sort and paging
    Grid {
        data_set: u64,

        /// Raw filter replacing the per-column filters
        #[arg(long)]
        filter: Option<String>,

        /// Sort order, e.g. "Price DESC, Dish"
        #[arg(long)]
        order: Option<String>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        length: Option<String>,

        /// Per-column filter as HEADING=TEXT (repeatable)
        #[arg(long = "where", value_parser = parse_assignment)]
        filters: Vec<(String, String)>,
    },

    /// Render the add row form
    AddForm { data_set: u64 },

    /// Add a row; fields are COLUMN_ID=VALUE
    Add {
        data_set: u64,

        #[arg(short, long = "field", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },

    /// Render the edit form for a row
    Show { data_set: u64, row: u64 },

    /// Edit a row; omitted fields keep their stored value
    Edit {
        data_set: u64,
        row: u64,

        #[arg(short, long = "field", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },

    /// Render the delete confirmation for a row
    DeleteForm { data_set: u64, row: u64 },

    /// Delete a row
    Delete { data_set: u64, row: u64 },
}

/// YAML shape accepted by `create-dataset`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataSetDefinition {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    editors: Vec<u64>,
    #[serde(default)]
    columns: Vec<ColumnDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnDefinition {
    heading: String,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default = "default_type", rename = "type")]
    value_type: String,
    #[serde(default)]
    list_content: Option<String>,
}

fn default_kind() -> String {
    "value".into()
}

fn default_type() -> String {
    "string".into()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let mut config = ServiceConfig::from_env();
    apply_overrides(&mut config, &cli.overrides)?;
    config.validate()?;

    let caller = if cli.super_admin {
        Caller::super_admin(UserId::new(cli.user))
    } else {
        Caller::user(UserId::new(cli.user))
    };

    let store = Arc::new(FsDataSetStore::from_config(&config));
    tracing::debug!(root = %store.root().display(), user = %caller.user_id, "opened store");

    let controller = RowController::with_backend(store.clone(), &config);

    let outcome = match cli.command {
        Commands::CreateDataset { definition } => {
            let data_set = create_data_set(&store, &definition, caller.user_id)?;
            return print_json(&data_set);
        }
        Commands::AddColumn {
            data_set,
            heading,
            kind,
            value_type,
            list_content,
        } => {
            let column = column_from_parts(heading, &kind, &value_type, list_content)?;
            let data_set = add_column(&store, DataSetId::new(data_set), column)?;
            return print_json(&data_set);
        }
        Commands::AddMedia { name, stored_as } => {
            let media = store.add_media(&name, stored_as)?;
            return print_json(&media);
        }
        Commands::Page { data_set } => controller.display_page(&caller, DataSetId::new(data_set)),
        Commands::Grid {
            data_set,
            filter,
            order,
            start,
            length,
            filters,
        } => {
            let mut params: RawParams = filters.into_iter().collect();
            for (key, value) in [("filter", filter), ("order", order), ("start", start)] {
                if let Some(v) = value {
                    params.insert(key.into(), v);
                }
            }
            match (length, config.default_page_size) {
                (Some(l), _) => {
                    params.insert("length".into(), l);
                }
                (None, Some(n)) => {
                    params.insert("length".into(), n.to_string());
                }
                (None, None) => {}
            }
            controller.grid(&caller, DataSetId::new(data_set), &params)
        }
        Commands::AddForm { data_set } => controller.add_form(&caller, DataSetId::new(data_set)),
        Commands::Add { data_set, fields } => {
            let params = field_params(fields)?;
            controller.add(&caller, DataSetId::new(data_set), &params)
        }
        Commands::Show { data_set, row } => {
            controller.edit_form(&caller, DataSetId::new(data_set), RowId::new(row))
        }
        Commands::Edit {
            data_set,
            row,
            fields,
        } => {
            let params = field_params(fields)?;
            controller.edit(&caller, DataSetId::new(data_set), RowId::new(row), &params)
        }
        Commands::DeleteForm { data_set, row } => {
            controller.delete_form(&caller, DataSetId::new(data_set), RowId::new(row))
        }
        Commands::Delete { data_set, row } => {
            controller.delete(&caller, DataSetId::new(data_set), RowId::new(row))
        }
    };

    respond(outcome)
}

fn respond(outcome: Result<ResponseState, ControllerError>) -> CliResult<()> {
    match outcome {
        Ok(state) => print_json(&state),
        Err(e) => {
            tracing::error!(status = e.http_status(), error = %e, "request failed");
            print_json(&ResponseState::from(&e))?;
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn apply_overrides(cfg: &mut ServiceConfig, o: &ConfigOverrides) -> CliResult<()> {
    if let Some(dir) = &o.data_dir {
        cfg.data_dir = dir.clone();
    }
    if let Some(c) = &o.collation {
        cfg.collation = Collation::parse(c)?;
    }
    if let Some(m) = o.tz_offset_minutes {
        cfg.tz_offset_minutes = Some(m);
    }
    if let Some(n) = o.default_page_size {
        cfg.default_page_size = Some(n);
    }
    Ok(())
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let k = k.trim();
    if k.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((k.to_string(), v.to_string()))
}

/// `1=Alice` becomes the request parameter for column 1.
fn field_params(fields: Vec<(String, String)>) -> CliResult<RawParams> {
    fields
        .into_iter()
        .map(|(id, value)| -> CliResult<(String, String)> {
            let column_id: ColumnId = id
                .parse()
                .map_err(|_| format!("field key '{id}' is not a column id"))?;
            Ok((param_key(column_id), value))
        })
        .collect()
}

fn column_from_parts(
    heading: String,
    kind: &str,
    value_type: &str,
    list_content: Option<String>,
) -> CliResult<ColumnSchema> {
    let column_kind =
        ColumnKind::parse(kind).ok_or_else(|| format!("unknown column kind '{kind}'"))?;
    let value_kind =
        ValueKind::parse(value_type).ok_or_else(|| format!("unknown value type '{value_type}'"))?;
    // Id is assigned when the column is added to a dataset.
    let mut column = ColumnSchema::new(ColumnId::new(0), heading, column_kind, value_kind);
    column.list_content = list_content;
    Ok(column)
}

fn data_set_from_definition(yaml: &str, id: DataSetId, owner: UserId) -> CliResult<DataSet> {
    let def: DataSetDefinition = serde_yaml::from_str(yaml)?;
    let mut data_set = DataSet::new(id, def.name, owner);
    data_set.description = def.description;
    data_set.editors = def.editors.into_iter().map(UserId::new).collect();
    for col in def.columns {
        let mut column = column_from_parts(col.heading, &col.kind, &col.value_type, col.list_content)?;
        column.column_id = data_set.next_column_id();
        data_set.add_column(column)?;
    }
    data_set.validate()?;
    Ok(data_set)
}

fn create_data_set(store: &FsDataSetStore, path: &PathBuf, owner: UserId) -> CliResult<DataSet> {
    let yaml = fs::read_to_string(path)?;
    // Validate the whole definition before anything is written.
    let mut data_set = data_set_from_definition(&yaml, DataSetId::new(0), owner)?;
    let created = store.create_data_set(&data_set.name, owner)?;
    data_set.data_set_id = created.data_set_id;
    store.save(&data_set, SaveOptions::full())?;
    tracing::info!(data_set = %data_set.data_set_id, name = %data_set.name, "dataset created");
    Ok(data_set)
}

fn add_column(store: &FsDataSetStore, id: DataSetId, mut column: ColumnSchema) -> CliResult<DataSet> {
    let mut data_set = store.get_by_id(id)?;
    column.column_id = data_set.next_column_id();
    data_set.add_column(column)?;
    store.save(&data_set, SaveOptions::full())?;
    Ok(data_set)
}
