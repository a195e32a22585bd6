use super::*;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct UpsertOutcome {
    pub(crate) labels_inserted: usize,
    /// Level at which the lineage walk found a stored label and stopped.
    pub(crate) existing_label: Option<Rank>,
    pub(crate) tree_row_inserted: bool,
}

/// Writes the missing labels and the tree row for one resolved taxon.
///
/// The caller owns the transaction; nothing here commits.
pub(crate) fn upsert_lineage(
    connection: &Connection,
    backbone: &dyn Backbone,
    taxon: &ResolvedTaxon,
    settings: &LabelSettings,
) -> Result<UpsertOutcome> {
    let mut outcome = UpsertOutcome::default();

    for (spec, level) in taxon.lineage() {
        if label_exists(connection, level.key)? {
            // ancestors were labelled in the same walk that wrote this one
            outcome.existing_label = Some(spec.rank);
            break;
        }

        let labels = fetch_labels(backbone, level.key, settings).with_context(|| {
            format!("failed to label {} {} ({})", spec.rank, level.label, level.key)
        })?;
        insert_label(connection, level.key, &level.label, &labels)?;
        outcome.labels_inserted += 1;

        debug!(
            rank = %spec.rank,
            label_id = level.key,
            label_sci = %level.label,
            "inserted taxonomy label"
        );
    }

    let row = taxon.tree_row();
    outcome.tree_row_inserted = insert_tree_row(connection, &row)?;

    debug!(
        name = %taxon.canonical_name,
        species_id = ?row.species_id(),
        inserted = outcome.tree_row_inserted,
        "wrote taxonomy tree row"
    );

    Ok(outcome)
}
