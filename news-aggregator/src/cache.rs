use crate::types::{AggregateReport, NewsItem};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct CachedAggregate {
    items: Arc<Vec<NewsItem>>,
    report: AggregateReport,
    stored_at: Instant,
    stale: bool,
}

/// Memoized merge result. One entry, no key: every query reads the same set.
pub struct AggregateCache {
    ttl: Duration,
    epoch: u64,
    entry: Option<CachedAggregate>,
}

impl AggregateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            epoch: 0,
            entry: None,
        }
    }

    /// Items still inside the TTL and not invalidated.
    pub fn fresh(&self, now: Instant) -> Option<Arc<Vec<NewsItem>>> {
        let entry = self.entry.as_ref()?;
        if entry.stale || now.saturating_duration_since(entry.stored_at) >= self.ttl {
            return None;
        }
        Some(Arc::clone(&entry.items))
    }

    /// Replace the cached set and open a new epoch.
    pub fn store(&mut self, items: Arc<Vec<NewsItem>>, mut report: AggregateReport, now: Instant) -> u64 {
        self.epoch += 1;
        report.epoch = self.epoch;
        self.entry = Some(CachedAggregate {
            items,
            report,
            stored_at: now,
            stale: false,
        });
        self.epoch
    }

    pub fn invalidate(&mut self) {
        if let Some(entry) = self.entry.as_mut() {
            entry.stale = true;
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn report(&self) -> Option<&AggregateReport> {
        self.entry.as_ref().map(|e| &e.report)
    }
}
