//! Per-interaction filtering of the merged item set.

use crate::registry::SourceRegistry;
use crate::seen::SeenSet;
use crate::types::{AggregatorError, CategoryFilter, NewsItem, Result};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub active_sources: BTreeSet<String>,
    pub category: CategoryFilter,
    pub search: String,
}

impl Query {
    /// Every source, every category, no search.
    pub fn all(registry: &SourceRegistry) -> Self {
        Self {
            active_sources: registry.labels(),
            ..Self::default()
        }
    }

    /// Sources enabled by default, every category, no search.
    pub fn defaults(registry: &SourceRegistry) -> Self {
        Self {
            active_sources: registry.default_active_labels(),
            ..Self::default()
        }
    }

    /// Exactly the named sources. Every label must exist in `registry`.
    pub fn for_sources<I, S>(registry: &SourceRegistry, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let active_sources: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        let unknown: Vec<&str> = active_sources
            .iter()
            .map(String::as_str)
            .filter(|label| registry.get(label).is_none())
            .collect();
        if !unknown.is_empty() {
            return Err(AggregatorError::UnknownSources(unknown.join(", ")));
        }

        Ok(Self {
            active_sources,
            ..Self::default()
        })
    }

    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }
}

/// Filtered items, unseen first. The first `unseen_count` entries are new.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    items: Vec<NewsItem>,
    unseen_count: usize,
}

impl QueryResult {
    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    pub fn unseen(&self) -> &[NewsItem] {
        &self.items[..self.unseen_count]
    }

    pub fn seen(&self) -> &[NewsItem] {
        &self.items[self.unseen_count..]
    }

    pub fn unseen_count(&self) -> usize {
        self.unseen_count
    }

    pub fn is_new(&self, index: usize) -> bool {
        index < self.unseen_count
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.link.as_str())
    }
}

/// Select items matching `query` and rank unseen links ahead of seen ones.
///
/// Relative order inside each group is the input order.
pub fn query(items: &[NewsItem], query: &Query, seen: &SeenSet) -> QueryResult {
    let needle = query.search.trim().to_lowercase();

    let (unseen, seen_items): (Vec<NewsItem>, Vec<NewsItem>) = items
        .iter()
        .filter(|item| query.active_sources.contains(&item.source_label))
        .filter(|item| query.category.matches(&item.categories))
        .filter(|item| needle.is_empty() || item.title.to_lowercase().contains(&needle))
        .cloned()
        .partition(|item| !seen.is_seen(&item.link));

    let unseen_count = unseen.len();
    let mut ordered = unseen;
    ordered.extend(seen_items);

    QueryResult {
        items: ordered,
        unseen_count,
    }
}

/// What the presentation layer should render.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// No source produced anything this cycle.
    NoData,
    /// Items exist but the filters removed all of them.
    NoMatches,
    Items(QueryResult),
}

pub fn view(items: &[NewsItem], q: &Query, seen: &SeenSet) -> View {
    if items.is_empty() {
        return View::NoData;
    }
    let result = query(items, q, seen);
    if result.is_empty() {
        View::NoMatches
    } else {
        View::Items(result)
    }
}

/// Checkbox state for the source list.
///
/// Whether a source is active and whether it is visible under the current
/// category are independent: hiding a source does not deactivate it.
#[derive(Debug, Clone)]
pub struct SourceSelection {
    active: BTreeSet<String>,
}

impl SourceSelection {
    pub fn new(registry: &SourceRegistry) -> Self {
        Self {
            active: registry.default_active_labels(),
        }
    }

    pub fn active(&self) -> &BTreeSet<String> {
        &self.active
    }

    pub fn is_active(&self, label: &str) -> bool {
        self.active.contains(label)
    }

    pub fn set_active(&mut self, label: &str, active: bool) {
        if active {
            self.active.insert(label.to_string());
        } else {
            self.active.remove(label);
        }
    }

    /// Flip one source, returning its new state.
    pub fn toggle(&mut self, label: &str) -> bool {
        let now_active = !self.is_active(label);
        self.set_active(label, now_active);
        now_active
    }

    /// Activate every source visible under `category`.
    pub fn select_visible(&mut self, registry: &SourceRegistry, category: &CategoryFilter) {
        self.active.extend(registry.labels_in_category(category));
    }

    /// Deactivate every source visible under `category`; hidden ones keep their state.
    pub fn clear_visible(&mut self, registry: &SourceRegistry, category: &CategoryFilter) {
        for label in registry.labels_in_category(category) {
            self.active.remove(&label);
        }
    }

    /// Visible sources with their checkbox state, in registry order.
    pub fn visible(&self, registry: &SourceRegistry, category: &CategoryFilter) -> Vec<(String, bool)> {
        registry
            .labels_in_category(category)
            .into_iter()
            .map(|label| {
                let active = self.is_active(&label);
                (label, active)
            })
            .collect()
    }

    pub fn to_query(&self, category: CategoryFilter, search: &str) -> Query {
        Query {
            active_sources: self.active.clone(),
            category,
            search: search.to_string(),
        }
    }
}
