use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

use crate::backbone::BackboneMatch;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Rank {
    Subspecies,
    Species,
    Genus,
    Family,
    Class,
    Phylum,
    Kingdom,
}

impl Rank {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subspecies => "SUBSPECIES",
            Self::Species => "SPECIES",
            Self::Genus => "GENUS",
            Self::Family => "FAMILY",
            Self::Class => "CLASS",
            Self::Phylum => "PHYLUM",
            Self::Kingdom => "KINGDOM",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rank {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let rank = RANK_SPECS
            .iter()
            .map(|spec| spec.rank)
            .find(|rank| rank.as_str().eq_ignore_ascii_case(value.trim()));

        match rank {
            Some(rank) => Ok(rank),
            None => bail!("unsupported taxon rank: {value}"),
        }
    }
}

/// One level of the stored hierarchy and where the backbone reports it.
#[derive(Copy, Clone, Debug)]
pub struct RankSpec {
    pub rank: Rank,
    pub column: &'static str,
    pub key_field: &'static str,
    pub label_field: &'static str,
}

/// Hierarchy levels from most specific to most general.
///
/// Subspecies and species share `species_id`: when the backbone resolves a
/// subspecies its usage key takes the place of the species key.
pub static RANK_SPECS: [RankSpec; 7] = [
    RankSpec {
        rank: Rank::Subspecies,
        column: "species_id",
        key_field: "usageKey",
        label_field: "scientificName",
    },
    // synonyms share a speciesKey; the canonical name is the one that matched
    RankSpec {
        rank: Rank::Species,
        column: "species_id",
        key_field: "speciesKey",
        label_field: "canonicalName",
    },
    RankSpec {
        rank: Rank::Genus,
        column: "genus_id",
        key_field: "genusKey",
        label_field: "genus",
    },
    RankSpec {
        rank: Rank::Family,
        column: "family_id",
        key_field: "familyKey",
        label_field: "family",
    },
    RankSpec {
        rank: Rank::Class,
        column: "class_id",
        key_field: "classKey",
        label_field: "class",
    },
    RankSpec {
        rank: Rank::Phylum,
        column: "phylum_id",
        key_field: "phylumKey",
        label_field: "phylum",
    },
    RankSpec {
        rank: Rank::Kingdom,
        column: "kingdom_id",
        key_field: "kingdomKey",
        label_field: "kingdom",
    },
];

pub const TREE_COLUMN_COUNT: usize = 6;

pub fn tree_columns() -> impl Iterator<Item = &'static str> {
    RANK_SPECS[1..].iter().map(|spec| spec.column)
}

/// Index of the first hierarchy level that has to be checked for `rank`.
pub fn entry_point(rank: Rank) -> usize {
    RANK_SPECS
        .iter()
        .position(|spec| spec.rank == rank)
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonLevel {
    pub key: i64,
    pub label: String,
}

/// A backbone match narrowed to the levels the hierarchy stores.
#[derive(Debug, Clone)]
pub struct ResolvedTaxon {
    pub rank: Rank,
    pub canonical_name: String,
    levels: [Option<TaxonLevel>; 7],
}

impl ResolvedTaxon {
    /// Returns `Ok(None)` when the backbone found no usage for the name.
    pub fn from_match(name: &str, matched: &BackboneMatch) -> Result<Option<Self>> {
        let Some(usage_key) = matched.usage_key else {
            return Ok(None);
        };
        if matched
            .match_type
            .as_deref()
            .is_some_and(|value| value.eq_ignore_ascii_case("NONE"))
        {
            return Ok(None);
        }

        let rank = matched
            .rank
            .as_deref()
            .with_context(|| format!("backbone match for '{name}' ({usage_key}) has no rank"))?
            .parse::<Rank>()
            .with_context(|| format!("cannot place '{name}' ({usage_key}) in the hierarchy"))?;

        let entry = entry_point(rank);
        let mut levels: [Option<TaxonLevel>; 7] = Default::default();
        for (index, spec) in RANK_SPECS.iter().enumerate().skip(entry) {
            let key = matched.key_for(spec.rank).with_context(|| {
                format!("backbone match for '{name}' lacks {}", spec.key_field)
            })?;
            let label = matched.label_for(spec.rank, rank).with_context(|| {
                format!("backbone match for '{name}' lacks {}", spec.label_field)
            })?;
            levels[index] = Some(TaxonLevel {
                key,
                label: label.to_string(),
            });
        }

        let canonical_name = matched
            .canonical_name
            .clone()
            .or_else(|| matched.scientific_name.clone())
            .unwrap_or_else(|| name.to_string());

        Ok(Some(Self {
            rank,
            canonical_name,
            levels,
        }))
    }

    pub fn entry_point(&self) -> usize {
        entry_point(self.rank)
    }

    pub fn level(&self, index: usize) -> Option<&TaxonLevel> {
        self.levels.get(index).and_then(Option::as_ref)
    }

    /// Levels from the entry point up to the kingdom.
    pub fn lineage(&self) -> impl Iterator<Item = (&'static RankSpec, &TaxonLevel)> {
        RANK_SPECS
            .iter()
            .zip(self.levels.iter())
            .skip(self.entry_point())
            .filter_map(|(spec, level)| level.as_ref().map(|level| (spec, level)))
    }

    pub fn tree_row(&self) -> TreeRow {
        let entry = self.entry_point();
        let mut ids = [None; TREE_COLUMN_COUNT];

        for (column, id) in ids.iter_mut().enumerate() {
            let spec_index = column + 1;
            if spec_index < entry {
                continue;
            }
            *id = self.level(spec_index).map(|level| level.key);
        }

        if self.rank == Rank::Subspecies {
            ids[0] = self.level(0).map(|level| level.key);
        }

        TreeRow { ids }
    }
}

/// Six stored ids, species first, `None` where the lineage is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeRow {
    pub ids: [Option<i64>; TREE_COLUMN_COUNT],
}

impl TreeRow {
    pub fn species_id(&self) -> Option<i64> {
        self.ids[0]
    }
}
