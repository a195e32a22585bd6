use super::*;

/// Locales to capture vernacular names in and how to page through them.
///
/// Codes are compared against the backbone's ISO 639-2 language field. The
/// primary locale is stored in `label_de`, the secondary in `label_en`.
#[derive(Debug, Clone)]
pub(crate) struct LabelSettings {
    pub(crate) primary_locale: String,
    pub(crate) secondary_locale: String,
    pub(crate) page_size: usize,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            primary_locale: "deu".to_string(),
            secondary_locale: "eng".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LocalizedLabels {
    pub(crate) primary: Option<String>,
    pub(crate) secondary: Option<String>,
}

impl LocalizedLabels {
    fn is_complete(&self) -> bool {
        self.primary.is_some() && self.secondary.is_some()
    }
}

pub(super) fn fetch_labels(
    backbone: &dyn Backbone,
    taxon_id: i64,
    settings: &LabelSettings,
) -> Result<LocalizedLabels> {
    let page_size = settings.page_size.max(1);
    let mut labels = LocalizedLabels::default();
    let mut offset = 0;

    loop {
        let page = backbone
            .vernacular_names(taxon_id, offset, page_size)
            .with_context(|| {
                format!("failed to fetch vernacular names for {taxon_id} at offset {offset}")
            })?;

        if labels.primary.is_none() {
            labels.primary = first_in_locale(&page.results, &settings.primary_locale);
        }
        if labels.secondary.is_none() {
            labels.secondary = first_in_locale(&page.results, &settings.secondary_locale);
        }

        if labels.is_complete() || page.end_of_records || page.results.is_empty() {
            break;
        }
        offset += page_size;
    }

    debug!(
        taxon_id,
        pages = offset / page_size + 1,
        primary = %labels.primary.as_deref().unwrap_or_default(),
        secondary = %labels.secondary.as_deref().unwrap_or_default(),
        "fetched vernacular labels"
    );

    Ok(labels)
}

fn first_in_locale(names: &[VernacularName], locale: &str) -> Option<String> {
    names
        .iter()
        .find(|name| {
            name.language
                .as_deref()
                .is_some_and(|language| language.eq_ignore_ascii_case(locale))
        })
        .map(|name| name.vernacular_name.clone())
}
