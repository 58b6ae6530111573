use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Category value that disables category filtering.
pub const ALL_CATEGORIES: &str = "ALL";

/// Link used when an upstream entry has none.
pub const MISSING_LINK: &str = "#";

/// How a source publishes its items.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    /// RSS or Atom syndication document.
    #[default]
    Feed,
    /// HTML page with a table of `timestamp | link` rows.
    HtmlTable {
        /// CSS selector matching the table rows.
        row_selector: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub display_name: String,
    pub endpoint: String,
    pub short_label: String,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default = "default_enabled")]
    pub default_enabled: bool,
    #[serde(default)]
    pub kind: SourceKind,
}

fn default_enabled() -> bool {
    true
}

impl SourceDescriptor {
    pub fn feed(display_name: &str, endpoint: &str, short_label: &str, categories: &[&str]) -> Self {
        Self {
            display_name: display_name.to_string(),
            endpoint: endpoint.to_string(),
            short_label: short_label.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            default_enabled: true,
            kind: SourceKind::Feed,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.default_enabled = false;
        self
    }

    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn in_category(&self, filter: &CategoryFilter) -> bool {
        match filter {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => self.categories.contains(name),
        }
    }
}

/// A normalized news item. Immutable once produced by a fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub published_at: DateTime<Utc>,
    pub source_label: String,
    pub title: String,
    pub link: String,
    pub categories: BTreeSet<String>,
}

impl NewsItem {
    /// Dedup identity: title and link, each cut to `prefix_chars` characters.
    pub fn identity_key(&self, prefix_chars: usize) -> IdentityKey {
        IdentityKey {
            title: self.title.chars().take(prefix_chars).collect(),
            link: self.link.chars().take(prefix_chars).collect(),
        }
    }

    pub fn has_link(&self) -> bool {
        self.link != MISSING_LINK
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub title: String,
    pub link: String,
}

/// Active category of a query: everything, or one named tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Named(value.to_string())
        }
    }

    pub fn matches(&self, categories: &BTreeSet<String>) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => categories.contains(name),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL_CATEGORIES),
            CategoryFilter::Named(name) => f.write_str(name),
        }
    }
}
