#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use news_aggregator::{
    Aggregator, AggregatorConfig, AggregatorError, NewsItem, Result, SourceDescriptor, SourceFetcher,
    SourceRegistry,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Scripted behaviour for one source.
#[derive(Clone)]
pub enum MockResponse {
    Items(Vec<NewsItem>),
    Fail,
    Hang,
    Panic,
}

/// In-memory fetcher that counts calls and tracks peak concurrency.
pub struct MockFetcher {
    responses: Mutex<HashMap<String, MockResponse>>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn respond(self, label: &str, response: MockResponse) -> Self {
        self.set(label, response);
        self
    }

    pub fn set(&self, label: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(label.to_string(), response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for MockFetcher {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<NewsItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .get(&source.short_label)
            .cloned()
            .unwrap_or(MockResponse::Items(Vec::new()));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match response {
            MockResponse::Items(items) => Ok(items),
            MockResponse::Fail => Err(AggregatorError::Parse(format!(
                "{} returned garbage",
                source.short_label
            ))),
            MockResponse::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
            MockResponse::Panic => panic!("fetcher for {} blew up", source.short_label),
        }
    }
}

pub fn at(text: &str) -> DateTime<Utc> {
    let naive = chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M").unwrap();
    Utc.from_utc_datetime(&naive)
}

pub fn item(label: &str, title: &str, when: &str, link: &str) -> NewsItem {
    NewsItem {
        published_at: at(when),
        source_label: label.to_string(),
        title: title.to_string(),
        link: link.to_string(),
        categories: Default::default(),
    }
}

pub fn registry(labels: &[&str]) -> Arc<SourceRegistry> {
    let sources = labels
        .iter()
        .map(|label| {
            SourceDescriptor::feed(
                label,
                &format!("https://{}.example.com/rss", label.to_lowercase()),
                label,
                &["Generale"],
            )
        })
        .collect();
    Arc::new(SourceRegistry::new(sources).unwrap())
}

pub fn aggregator(labels: &[&str], fetcher: Arc<MockFetcher>, config: AggregatorConfig) -> Aggregator {
    Aggregator::new(registry(labels), fetcher, config)
}
