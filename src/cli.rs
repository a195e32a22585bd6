use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::backbone::{DEFAULT_BACKBONE_URL, DEFAULT_PAGE_SIZE};

#[derive(Parser, Debug)]
#[command(
    name = "taxonomy-import",
    version,
    about = "Resolve inferred species names into a stored taxonomy tree"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Import(ImportArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(long, default_value = ".cache/taxonomy")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value = "birdnet_results")]
    pub results_table: String,

    #[arg(long)]
    pub min_confidence: Option<f64>,

    #[arg(long = "taxon")]
    pub taxa: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub no_default_taxa: bool,

    #[arg(long, default_value = DEFAULT_BACKBONE_URL)]
    pub backbone_url: String,

    #[arg(long, default_value_t = 30_000)]
    pub timeout_ms: u64,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    #[arg(long, default_value = "deu")]
    pub primary_locale: String,

    #[arg(long, default_value = "eng")]
    pub secondary_locale: String,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/taxonomy")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
