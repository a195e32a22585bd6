use super::*;

pub fn run(args: ImportArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("import-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "{IMPORT_MANIFEST_PREFIX}{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| cache_root.join(DEFAULT_DB_FILENAME));

    info!(
        db_path = %db_path.display(),
        backbone = %args.backbone_url,
        run_id = %run_id,
        "starting taxonomy import"
    );

    let mut connection = open_connection(&db_path)?;
    ensure_schema(&connection)?;

    let backbone = GbifClient::new(&args.backbone_url, Duration::from_millis(args.timeout_ms))?;
    let importer = TaxonomyImporter::new(ImportConfig::from_args(&args), &backbone)?;
    let summary = importer.run(&mut connection)?;

    if !args.dry_run {
        upsert_metadata(&connection, "last_import_run_id", &run_id)?;
        upsert_metadata(&connection, "db_updated_at", &now_utc_string())?;
    }

    let labels_total = count_rows(&connection, "SELECT COUNT(*) FROM taxonomy_labels")?;
    let tree_total = count_rows(&connection, "SELECT COUNT(*) FROM taxonomy_tree")?;

    let status = if summary.failures.is_empty() {
        "completed"
    } else {
        "completed_with_failures"
    };
    let settings = &importer.config().labels;
    let manifest = ImportRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_import_command(&args),
        backbone_url: args.backbone_url.clone(),
        locales: vec![
            settings.primary_locale.clone(),
            settings.secondary_locale.clone(),
        ],
        dry_run: args.dry_run,
        paths: ImportPaths {
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            db_path: db_path.display().to_string(),
        },
        counts: summary.counts,
        unresolved_names: summary.unresolved_names,
        failures: summary.failures,
        warnings: summary.warnings,
    };

    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote import run manifest");
    info!(
        labels = labels_total,
        tree_rows = tree_total,
        status = %status,
        "import completed"
    );

    Ok(())
}

pub(super) fn render_import_command(args: &ImportArgs) -> String {
    let mut command = vec![
        "taxonomy-import".to_string(),
        "import".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
    ];

    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }
    command.push("--results-table".to_string());
    command.push(args.results_table.clone());
    if let Some(threshold) = args.min_confidence {
        command.push("--min-confidence".to_string());
        command.push(threshold.to_string());
    }
    for taxon in &args.taxa {
        command.push("--taxon".to_string());
        command.push(format!("\"{taxon}\""));
    }
    if args.no_default_taxa {
        command.push("--no-default-taxa".to_string());
    }
    command.push("--backbone-url".to_string());
    command.push(args.backbone_url.clone());
    command.push("--page-size".to_string());
    command.push(args.page_size.to_string());
    command.push("--primary-locale".to_string());
    command.push(args.primary_locale.clone());
    command.push("--secondary-locale".to_string());
    command.push(args.secondary_locale.clone());
    if args.dry_run {
        command.push("--dry-run".to_string());
    }
    if args.fail_fast {
        command.push("--fail-fast".to_string());
    }

    command.join(" ")
}
