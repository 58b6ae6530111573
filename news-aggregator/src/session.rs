use crate::aggregator::Aggregator;
use crate::query::{self, Query, QueryResult, View};
use crate::seen::SeenSet;
use crate::types::NewsItem;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Per-user view over a shared aggregator.
///
/// Owns the seen-set; the merged item cache belongs to the aggregator and
/// is shared by every session built on it.
pub struct Session {
    aggregator: Arc<Aggregator>,
    seen: RwLock<SeenSet>,
    seeded: RwLock<bool>,
    // Last merged set handed out by `items`
    shown: RwLock<Option<Arc<Vec<NewsItem>>>>,
}

impl Session {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self {
            aggregator,
            seen: RwLock::new(SeenSet::new()),
            seeded: RwLock::new(false),
            shown: RwLock::new(None),
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Current merged items. The first call of a session marks all of them
    /// as seen before returning, so the first screen has nothing "new".
    pub async fn items(&self) -> Arc<Vec<NewsItem>> {
        let items = self.aggregator.aggregate().await;

        let mut seeded = self.seeded.write().await;
        if !*seeded {
            let added = self
                .seen
                .write()
                .await
                .mark_all_seen(items.iter().map(|item| item.link.clone()));
            *seeded = true;
            info!("Seeded session seen-set with {} links", added);
        }
        drop(seeded);

        *self.shown.write().await = Some(Arc::clone(&items));
        items
    }

    pub async fn query(&self, q: &Query) -> QueryResult {
        let items = self.items().await;
        let seen = self.seen.read().await;
        query::query(&items, q, &seen)
    }

    pub async fn view(&self, q: &Query) -> View {
        let items = self.items().await;
        let seen = self.seen.read().await;
        query::view(&items, q, &seen)
    }

    /// Acknowledge every link in the set last returned by `items`, `query`
    /// or `view`. Never re-aggregates: links the user has not been shown
    /// stay new.
    pub async fn mark_all_seen(&self) -> usize {
        let Some(items) = self.shown.read().await.clone() else {
            return 0;
        };
        let added = self
            .seen
            .write()
            .await
            .mark_all_seen(items.iter().map(|item| item.link.clone()));
        debug!("Marked {} new links as seen", added);
        added
    }

    pub async fn mark_seen<I, S>(&self, links: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seen.write().await.mark_all_seen(links)
    }

    pub async fn is_seen(&self, link: &str) -> bool {
        self.seen.read().await.is_seen(link)
    }

    pub async fn seen_count(&self) -> usize {
        self.seen.read().await.len()
    }

    /// Invalidate the shared cache and re-aggregate now.
    pub async fn refresh(&self) -> Arc<Vec<NewsItem>> {
        self.aggregator.invalidate().await;
        self.items().await
    }
}
