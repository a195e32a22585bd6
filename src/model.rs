use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportCounts {
    pub inferred_names: usize,
    pub curated_names: usize,
    pub names_total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub failed: usize,
    pub labels_inserted: usize,
    pub tree_rows_inserted: usize,
    pub tree_rows_existing: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFailure {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub counts: ImportCounts,
    pub unresolved_names: Vec<String>,
    pub failures: Vec<NameFailure>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPaths {
    pub cache_root: String,
    pub manifest_dir: String,
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub backbone_url: String,
    pub locales: Vec<String>,
    pub dry_run: bool,
    pub paths: ImportPaths,
    pub counts: ImportCounts,
    pub unresolved_names: Vec<String>,
    pub failures: Vec<NameFailure>,
    pub warnings: Vec<String>,
}
