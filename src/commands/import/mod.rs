use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use regex::Regex;
use rusqlite::{Connection, params, params_from_iter};
use tracing::{debug, info, warn};

use crate::backbone::{Backbone, DEFAULT_PAGE_SIZE, GbifClient, VernacularName};
use crate::cli::ImportArgs;
use crate::model::{ImportPaths, ImportRunManifest, ImportSummary, NameFailure};
use crate::taxonomy::{Rank, ResolvedTaxon, TreeRow, tree_columns};
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

pub(crate) const DB_SCHEMA_VERSION: &str = "1.0.0";
pub(crate) const DEFAULT_DB_FILENAME: &str = "taxonomy.sqlite";
pub(crate) const IMPORT_MANIFEST_PREFIX: &str = "import_run_";

/// Pollinator and flower taxa of interest that the audio classifier never
/// reports. Several resolve only to genus or family.
pub(crate) const CURATED_TAXA: [&str; 8] = [
    "Apis",
    "Andrenidae",
    "Bombus",
    "Syrphidae",
    "Muscidae",
    "Leucanthemum",
    "Daucus carota carota",
    "Centaurea",
];

mod db_setup;
mod driver;
mod labels;
mod run;
mod upsert;

pub use run::run;
pub(crate) use db_setup::{count_rows, read_metadata};

use db_setup::*;
use driver::*;
use labels::*;
use upsert::*;
