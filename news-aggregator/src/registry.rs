use crate::types::{AggregatorError, CategoryFilter, Result, SourceDescriptor};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// Validated, immutable catalog of news sources.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<SourceDescriptor>) -> Result<Self> {
        let mut labels = HashSet::new();

        for source in &sources {
            if source.short_label.trim().is_empty() {
                return Err(AggregatorError::InvalidRegistry(format!(
                    "source '{}' has an empty short label",
                    source.display_name
                )));
            }
            if source.display_name.trim().is_empty() {
                return Err(AggregatorError::InvalidRegistry(format!(
                    "source {} has an empty display name",
                    source.short_label
                )));
            }

            let endpoint = Url::parse(&source.endpoint).map_err(|e| {
                AggregatorError::InvalidRegistry(format!(
                    "source {} has an invalid endpoint '{}': {}",
                    source.short_label, source.endpoint, e
                ))
            })?;
            if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
                return Err(AggregatorError::InvalidRegistry(format!(
                    "source {} endpoint must be http or https, got {}",
                    source.short_label,
                    endpoint.scheme()
                )));
            }

            if !labels.insert(source.short_label.as_str()) {
                return Err(AggregatorError::InvalidRegistry(format!(
                    "duplicate short label {}",
                    source.short_label
                )));
            }
        }

        debug!("Validated registry with {} sources", sources.len());
        Ok(Self { sources })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let sources: Vec<SourceDescriptor> = serde_json::from_str(content)?;
        Self::new(sources)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_json_str(&content)?;
        info!("Loaded {} sources from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// Default catalog of Italian and international outlets.
    pub fn builtin() -> Self {
        let sources = vec![
            SourceDescriptor::feed("ANSA", "https://www.ansa.it/sito/ansait_rss.xml", "ANSA", &["Italia", "Generale"]),
            SourceDescriptor::feed(
                "la Repubblica",
                "https://www.repubblica.it/rss/homepage/rss2.0.xml",
                "REP",
                &["Italia", "Generale"],
            ),
            SourceDescriptor::feed(
                "Corriere della Sera",
                "https://xml2.corriereobjects.it/rss/homepage.xml",
                "CORRIERE",
                &["Italia", "Generale"],
            ),
            SourceDescriptor::feed(
                "Il Sole 24 Ore",
                "https://www.ilsole24ore.com/rss/italia.xml",
                "SOLE24",
                &["Italia", "Economia"],
            ),
            SourceDescriptor::feed(
                "Milano Finanza",
                "https://www.milanofinanza.it/rss/news",
                "MF",
                &["Economia", "Mercati"],
            ),
            SourceDescriptor::feed("BBC World", "https://feeds.bbci.co.uk/news/world/rss.xml", "BBC", &["Esteri"]),
            SourceDescriptor::feed(
                "The Guardian World",
                "https://www.theguardian.com/world/rss",
                "GUARDIAN",
                &["Esteri"],
            ),
            SourceDescriptor::feed(
                "CNBC Top News",
                "https://search.cnbc.com/rs/search/combinedcms/view.xml?partnerId=wrss01&id=100003114",
                "CNBC",
                &["Economia", "Mercati", "Esteri"],
            ),
            SourceDescriptor::feed("Gazzetta dello Sport", "https://www.gazzetta.it/rss/home.xml", "GAZZETTA", &["Sport"])
                .disabled(),
            SourceDescriptor::feed("Hacker News", "https://hnrss.org/frontpage", "HN", &["Tecnologia"]).disabled(),
        ];

        Self { sources }
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| s.short_label == label)
    }

    pub fn labels(&self) -> BTreeSet<String> {
        self.sources.iter().map(|s| s.short_label.clone()).collect()
    }

    /// Sorted union of every category tag in the catalog.
    pub fn categories(&self) -> BTreeSet<String> {
        self.sources.iter().flat_map(|s| s.categories.iter().cloned()).collect()
    }

    pub fn default_active_labels(&self) -> BTreeSet<String> {
        self.sources
            .iter()
            .filter(|s| s.default_enabled)
            .map(|s| s.short_label.clone())
            .collect()
    }

    /// Sources shown under a category filter. Visibility only; says nothing
    /// about whether a source is active.
    pub fn labels_in_category(&self, filter: &CategoryFilter) -> Vec<String> {
        self.sources
            .iter()
            .filter(|s| s.in_category(filter))
            .map(|s| s.short_label.clone())
            .collect()
    }
}
