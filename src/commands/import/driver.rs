use super::*;

#[derive(Debug, Clone)]
pub(crate) struct ImportConfig {
    pub(crate) results_table: String,
    pub(crate) min_confidence: Option<f64>,
    pub(crate) curated_taxa: Vec<String>,
    pub(crate) labels: LabelSettings,
    pub(crate) dry_run: bool,
    pub(crate) fail_fast: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            results_table: "birdnet_results".to_string(),
            min_confidence: None,
            curated_taxa: CURATED_TAXA.iter().map(|name| name.to_string()).collect(),
            labels: LabelSettings::default(),
            dry_run: false,
            fail_fast: false,
        }
    }
}

impl ImportConfig {
    pub(crate) fn from_args(args: &ImportArgs) -> Self {
        let mut curated_taxa = if args.no_default_taxa {
            Vec::new()
        } else {
            CURATED_TAXA.iter().map(|name| name.to_string()).collect()
        };
        curated_taxa.extend(args.taxa.iter().cloned());

        Self {
            results_table: args.results_table.trim().to_string(),
            min_confidence: args.min_confidence,
            curated_taxa,
            labels: LabelSettings {
                primary_locale: args.primary_locale.trim().to_string(),
                secondary_locale: args.secondary_locale.trim().to_string(),
                page_size: args.page_size,
            },
            dry_run: args.dry_run,
            fail_fast: args.fail_fast,
        }
    }
}

enum NameOutcome {
    Unresolved,
    Imported(Box<ResolvedTaxon>, UpsertOutcome),
}

/// Resolves every input name and writes its lineage, one transaction per name.
pub(crate) struct TaxonomyImporter<'a> {
    config: ImportConfig,
    backbone: &'a dyn Backbone,
}

impl<'a> TaxonomyImporter<'a> {
    pub(crate) fn new(config: ImportConfig, backbone: &'a dyn Backbone) -> Result<Self> {
        validate_table_identifier(&config.results_table)?;
        if config.labels.primary_locale.is_empty() || config.labels.secondary_locale.is_empty() {
            bail!("both label locales must be set");
        }

        Ok(Self { config, backbone })
    }

    pub(crate) fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub(crate) fn run(&self, connection: &mut Connection) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        let names = self.collect_names(connection, &mut summary)?;

        info!(
            inferred = summary.counts.inferred_names,
            curated = summary.counts.curated_names,
            dry_run = self.config.dry_run,
            "resolving taxonomy for input names"
        );

        for name in &names {
            match self.import_name(connection, name) {
                Ok(NameOutcome::Unresolved) => {
                    info!(name = %name, "no backbone match, skipping");
                    summary.counts.unresolved += 1;
                    summary.unresolved_names.push(name.clone());
                }
                Ok(NameOutcome::Imported(taxon, outcome)) => {
                    info!(
                        name = %name,
                        canonical = %taxon.canonical_name,
                        rank = %taxon.rank,
                        labels_inserted = outcome.labels_inserted,
                        stopped_at = %outcome.existing_label.map(Rank::as_str).unwrap_or("-"),
                        tree_row_inserted = outcome.tree_row_inserted,
                        "imported taxonomy"
                    );
                    summary.counts.resolved += 1;
                    summary.counts.labels_inserted += outcome.labels_inserted;
                    if outcome.tree_row_inserted {
                        summary.counts.tree_rows_inserted += 1;
                    } else {
                        summary.counts.tree_rows_existing += 1;
                    }
                }
                Err(err) => {
                    if self.config.fail_fast {
                        return Err(err.context(format!("import aborted at '{name}'")));
                    }
                    let reason = format!("{err:#}");
                    warn!(name = %name, error = %reason, "failed to import taxonomy");
                    summary.counts.failed += 1;
                    summary.failures.push(NameFailure {
                        name: name.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            resolved = summary.counts.resolved,
            unresolved = summary.counts.unresolved,
            failed = summary.counts.failed,
            labels_inserted = summary.counts.labels_inserted,
            tree_rows_inserted = summary.counts.tree_rows_inserted,
            "taxonomy import finished"
        );

        Ok(summary)
    }

    /// Inferred names first, then the curated list. Duplicates across the
    /// two lists are kept; the second pass finds its labels already stored.
    fn collect_names(
        &self,
        connection: &Connection,
        summary: &mut ImportSummary,
    ) -> Result<Vec<String>> {
        let mut names = if table_exists(connection, &self.config.results_table)? {
            load_inferred_names(
                connection,
                &self.config.results_table,
                self.config.min_confidence,
            )?
        } else {
            let warning = format!(
                "results table {} not found; importing curated taxa only",
                self.config.results_table
            );
            warn!("{warning}");
            summary.warnings.push(warning);
            Vec::new()
        };
        summary.counts.inferred_names = names.len();

        let curated = self
            .config
            .curated_taxa
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned)
            .collect::<Vec<_>>();
        summary.counts.curated_names = curated.len();
        names.extend(curated);

        summary.counts.names_total = names.len();
        Ok(names)
    }

    fn import_name(&self, connection: &mut Connection, name: &str) -> Result<NameOutcome> {
        let Some(taxon) = self
            .backbone
            .resolve_name(name)
            .with_context(|| format!("failed to resolve '{name}' against the backbone"))?
        else {
            return Ok(NameOutcome::Unresolved);
        };

        let tx = connection.transaction()?;
        let outcome = upsert_lineage(&tx, self.backbone, &taxon, &self.config.labels)?;
        if self.config.dry_run {
            tx.rollback()?;
        } else {
            tx.commit()
                .with_context(|| format!("failed to commit taxonomy for '{name}'"))?;
        }

        Ok(NameOutcome::Imported(Box::new(taxon), outcome))
    }
}
