use super::*;

pub(super) fn open_connection(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    connection
        .busy_timeout(Duration::from_secs(5))
        .context("failed to set busy timeout")?;
    Ok(())
}

pub(super) fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS taxonomy_labels (
              label_id INTEGER PRIMARY KEY,
              label_sci TEXT NOT NULL,
              label_de TEXT,
              label_en TEXT
            );

            CREATE TABLE IF NOT EXISTS taxonomy_tree (
              species_id INTEGER,
              genus_id INTEGER,
              family_id INTEGER,
              class_id INTEGER,
              phylum_id INTEGER,
              kingdom_id INTEGER
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_taxonomy_tree_lineage ON taxonomy_tree(
              ifnull(species_id, -1),
              ifnull(genus_id, -1),
              ifnull(family_id, -1),
              ifnull(class_id, -1),
              ifnull(phylum_id, -1),
              ifnull(kingdom_id, -1)
            );
            CREATE INDEX IF NOT EXISTS idx_taxonomy_tree_species ON taxonomy_tree(species_id);
            CREATE INDEX IF NOT EXISTS idx_taxonomy_labels_sci ON taxonomy_labels(label_sci);
            ",
        )
        .context("failed to initialize taxonomy schema")?;

    upsert_metadata(connection, "db_schema_version", DB_SCHEMA_VERSION)?;
    Ok(())
}

pub(super) fn upsert_metadata(connection: &Connection, key: &str, value: &str) -> Result<()> {
    connection
        .execute(
            "INSERT INTO metadata(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )
        .with_context(|| format!("failed to write metadata key {key}"))?;
    Ok(())
}

pub(crate) fn read_metadata(connection: &Connection, key: &str) -> Result<Option<String>> {
    let mut statement = connection.prepare("SELECT value FROM metadata WHERE key = ?1")?;
    let mut rows = statement.query([key])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

pub(crate) fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

/// Accepts `table` or `schema.table`; the name is spliced into SQL.
pub(super) fn validate_table_identifier(name: &str) -> Result<()> {
    let pattern = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .context("failed to compile table identifier regex")?;
    if !pattern.is_match(name) {
        bail!("invalid results table name: {name}");
    }
    Ok(())
}

pub(super) fn table_exists(connection: &Connection, qualified_name: &str) -> Result<bool> {
    let (schema, table) = qualified_name
        .split_once('.')
        .unwrap_or(("main", qualified_name));

    let attached: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM pragma_database_list WHERE name = ?1",
            [schema],
            |row| row.get(0),
        )
        .context("failed to list attached databases")?;
    if attached == 0 {
        return Ok(false);
    }

    let sql = format!(
        "SELECT COUNT(*) FROM {schema}.sqlite_master WHERE type IN ('table', 'view') AND name = ?1"
    );
    let count: i64 = connection
        .query_row(&sql, [table], |row| row.get(0))
        .with_context(|| format!("failed to inspect {qualified_name}"))?;
    Ok(count > 0)
}

/// Distinct non-empty species names from the classifier results, sorted.
pub(super) fn load_inferred_names(
    connection: &Connection,
    results_table: &str,
    min_confidence: Option<f64>,
) -> Result<Vec<String>> {
    let filter = if min_confidence.is_some() {
        "AND confidence >= ?1"
    } else {
        ""
    };
    let sql = format!(
        "SELECT DISTINCT species FROM {results_table} WHERE species IS NOT NULL {filter} ORDER BY species"
    );

    let mut statement = connection
        .prepare(&sql)
        .with_context(|| format!("failed to query inferred species from {results_table}"))?;
    let raw_names = match min_confidence {
        Some(threshold) => statement
            .query_map([threshold], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?,
        None => statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?,
    };

    let mut seen = HashSet::<String>::new();
    let mut names = Vec::with_capacity(raw_names.len());
    for raw in raw_names {
        let name = raw.trim();
        if name.is_empty() || !seen.insert(name.to_string()) {
            continue;
        }
        names.push(name.to_string());
    }

    Ok(names)
}

pub(super) fn label_exists(connection: &Connection, label_id: i64) -> Result<bool> {
    let count: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM taxonomy_labels WHERE label_id = ?1",
            [label_id],
            |row| row.get(0),
        )
        .with_context(|| format!("failed to look up label {label_id}"))?;
    Ok(count > 0)
}

pub(super) fn insert_label(
    connection: &Connection,
    label_id: i64,
    scientific_name: &str,
    labels: &LocalizedLabels,
) -> Result<()> {
    connection
        .execute(
            "
            INSERT INTO taxonomy_labels(label_id, label_sci, label_de, label_en)
            VALUES(?1, ?2, ?3, ?4)
            ",
            params![
                label_id,
                scientific_name,
                labels.primary.as_deref(),
                labels.secondary.as_deref()
            ],
        )
        .with_context(|| {
            format!("failed to insert label {label_id} ({scientific_name}); another import running?")
        })?;
    Ok(())
}

/// Returns false when the same lineage is already stored.
pub(super) fn insert_tree_row(connection: &Connection, row: &TreeRow) -> Result<bool> {
    let columns = tree_columns().collect::<Vec<_>>();
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>();
    let sql = format!(
        "INSERT INTO taxonomy_tree({}) VALUES({}) ON CONFLICT DO NOTHING",
        columns.join(", "),
        placeholders.join(", ")
    );

    let changed = connection
        .execute(&sql, params_from_iter(row.ids.iter()))
        .context("failed to insert taxonomy tree row")?;
    Ok(changed > 0)
}
