use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::taxonomy::{Rank, ResolvedTaxon};

pub const DEFAULT_BACKBONE_URL: &str = "https://api.gbif.org/v1";
pub const DEFAULT_PAGE_SIZE: usize = 100;

const USER_AGENT: &str = concat!("taxonomy-import/", env!("CARGO_PKG_VERSION"));

/// Name resolution and vernacular-name lookups against a taxonomic backbone.
pub trait Backbone {
    fn resolve_name(&self, name: &str) -> Result<Option<ResolvedTaxon>>;

    fn vernacular_names(
        &self,
        taxon_id: i64,
        offset: usize,
        limit: usize,
    ) -> Result<VernacularPage>;
}

/// Body of `GET /species/match`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackboneMatch {
    pub usage_key: Option<i64>,
    pub scientific_name: Option<String>,
    pub canonical_name: Option<String>,
    pub rank: Option<String>,
    pub match_type: Option<String>,
    pub confidence: Option<i64>,
    pub species_key: Option<i64>,
    pub species: Option<String>,
    pub genus_key: Option<i64>,
    pub genus: Option<String>,
    pub family_key: Option<i64>,
    pub family: Option<String>,
    pub class_key: Option<i64>,
    pub class: Option<String>,
    pub phylum_key: Option<i64>,
    pub phylum: Option<String>,
    pub kingdom_key: Option<i64>,
    pub kingdom: Option<String>,
}

impl BackboneMatch {
    pub fn key_for(&self, level: Rank) -> Option<i64> {
        match level {
            Rank::Subspecies => self.usage_key,
            Rank::Species => self.species_key,
            Rank::Genus => self.genus_key,
            Rank::Family => self.family_key,
            Rank::Class => self.class_key,
            Rank::Phylum => self.phylum_key,
            Rank::Kingdom => self.kingdom_key,
        }
    }

    /// Display name for `level` of a match resolved at `resolved`.
    ///
    /// A species-level match keeps the canonical name it matched on, which
    /// may be a synonym of the accepted species name.
    pub fn label_for(&self, level: Rank, resolved: Rank) -> Option<&str> {
        let label = match level {
            Rank::Subspecies => self.scientific_name.as_ref(),
            Rank::Species if resolved == Rank::Species => self
                .canonical_name
                .as_ref()
                .or(self.species.as_ref()),
            Rank::Species => self.species.as_ref(),
            Rank::Genus => self.genus.as_ref(),
            Rank::Family => self.family.as_ref(),
            Rank::Class => self.class.as_ref(),
            Rank::Phylum => self.phylum.as_ref(),
            Rank::Kingdom => self.kingdom.as_ref(),
        };
        label.map(String::as_str)
    }
}

/// One page of `GET /species/{key}/vernacularNames`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VernacularPage {
    #[serde(default)]
    pub end_of_records: bool,
    #[serde(default)]
    pub results: Vec<VernacularName>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VernacularName {
    pub vernacular_name: String,
    #[serde(default)]
    pub language: Option<String>,
}

pub struct GbifClient {
    base_url: String,
    client: Client,
}

impl GbifClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build backbone HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, ?query, "backbone request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .with_context(|| format!("backbone request failed: {url}"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("backbone returned status {status} for {url}");
        }

        response
            .json::<T>()
            .with_context(|| format!("failed to parse backbone response from {url}"))
    }
}

impl Backbone for GbifClient {
    fn resolve_name(&self, name: &str) -> Result<Option<ResolvedTaxon>> {
        let matched: BackboneMatch =
            self.get_json("/species/match", &[("name", name.to_string())])?;
        debug!(
            name = %name,
            match_type = %matched.match_type.as_deref().unwrap_or_default(),
            confidence = matched.confidence.unwrap_or_default(),
            "backbone match"
        );

        ResolvedTaxon::from_match(name, &matched)
    }

    fn vernacular_names(
        &self,
        taxon_id: i64,
        offset: usize,
        limit: usize,
    ) -> Result<VernacularPage> {
        self.get_json(
            &format!("/species/{taxon_id}/vernacularNames"),
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_response_deserializes_from_backbone_json() {
        let raw = r#"
        {
          "usageKey": 1340278,
          "scientificName": "Apis Linnaeus, 1758",
          "canonicalName": "Apis",
          "rank": "GENUS",
          "status": "ACCEPTED",
          "confidence": 97,
          "matchType": "EXACT",
          "kingdom": "Animalia",
          "phylum": "Arthropoda",
          "order": "Hymenoptera",
          "family": "Apidae",
          "genus": "Apis",
          "kingdomKey": 1,
          "phylumKey": 54,
          "classKey": 216,
          "orderKey": 1457,
          "familyKey": 4334,
          "genusKey": 1340278,
          "synonym": false,
          "class": "Insecta"
        }
        "#;

        let matched: BackboneMatch = serde_json::from_str(raw).expect("match should parse");
        assert_eq!(matched.usage_key, Some(1340278));
        assert_eq!(matched.key_for(Rank::Class), Some(216));
        assert_eq!(matched.label_for(Rank::Class, Rank::Genus), Some("Insecta"));
        assert!(matched.key_for(Rank::Species).is_none());
    }

    #[test]
    fn vernacular_page_defaults_missing_fields() {
        let raw = r#"
        {
          "offset": 0,
          "limit": 100,
          "endOfRecords": true,
          "results": [
            {"vernacularName": "Honigbienen", "language": "deu", "source": "Catalogue of Life"},
            {"vernacularName": "honey bees"}
          ]
        }
        "#;

        let page: VernacularPage = serde_json::from_str(raw).expect("page should parse");
        assert!(page.end_of_records);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].language.as_deref(), Some("deu"));
        assert!(page.results[1].language.is_none());
    }

    #[test]
    fn species_label_prefers_matched_canonical_name_only_at_species_rank() {
        let matched = BackboneMatch {
            canonical_name: Some("Parus caeruleus".to_string()),
            species: Some("Cyanistes caeruleus".to_string()),
            ..BackboneMatch::default()
        };

        assert_eq!(
            matched.label_for(Rank::Species, Rank::Species),
            Some("Parus caeruleus")
        );
        assert_eq!(
            matched.label_for(Rank::Species, Rank::Subspecies),
            Some("Cyanistes caeruleus")
        );
    }
}
