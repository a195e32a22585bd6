use std::fs;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::import::{
    DEFAULT_DB_FILENAME, IMPORT_MANIFEST_PREFIX, count_rows, read_metadata,
};
use crate::model::ImportRunManifest;
use crate::util::latest_file_with_prefix;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join(DEFAULT_DB_FILENAME));

    info!(cache_root = %args.cache_root.display(), "status requested");

    match latest_file_with_prefix(&manifest_dir, IMPORT_MANIFEST_PREFIX)? {
        Some(manifest_path) => {
            let raw = fs::read(&manifest_path)
                .with_context(|| format!("failed to read {}", manifest_path.display()))?;
            let manifest: ImportRunManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", manifest_path.display()))?;

            info!(
                path = %manifest_path.display(),
                run_id = %manifest.run_id,
                status = %manifest.status,
                started_at = %manifest.started_at,
                updated_at = %manifest.updated_at,
                dry_run = manifest.dry_run,
                names = manifest.counts.names_total,
                resolved = manifest.counts.resolved,
                unresolved = manifest.counts.unresolved,
                failed = manifest.counts.failed,
                labels_inserted = manifest.counts.labels_inserted,
                tree_rows_inserted = manifest.counts.tree_rows_inserted,
                "loaded latest import manifest"
            );
            for failure in &manifest.failures {
                warn!(name = %failure.name, reason = %failure.reason, "failed in last import");
            }
        }
        None => warn!(path = %manifest_dir.display(), "no import manifest found"),
    }

    if db_path.exists() {
        let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let labels_count = count_rows(&conn, "SELECT COUNT(*) FROM taxonomy_labels").unwrap_or(0);
        let tree_count = count_rows(&conn, "SELECT COUNT(*) FROM taxonomy_tree").unwrap_or(0);
        let schema_version = read_metadata(&conn, "db_schema_version")
            .ok()
            .flatten()
            .unwrap_or_default();
        let updated_at = read_metadata(&conn, "db_updated_at")
            .ok()
            .flatten()
            .unwrap_or_default();

        info!(
            path = %db_path.display(),
            labels = labels_count,
            tree_rows = tree_count,
            schema_version = %schema_version,
            updated_at = %updated_at,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}
