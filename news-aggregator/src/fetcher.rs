use crate::types::{AggregatorError, FetchConfig, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

/// HTTP transport shared by every source. One client, one user agent,
/// one timeout; a failed request is reported once and never retried.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// GET `url` and return the body as text.
    pub async fn fetch_document(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        debug!("Fetching document: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(content_length) = response.content_length() {
            let size_mb = content_length as usize / (1024 * 1024);
            if size_mb > self.config.max_feed_size_mb {
                return Err(AggregatorError::FeedTooLarge { size_mb });
            }
        }

        let content = response.text().await?;
        // Chunked responses carry no length header
        let size_mb = content.len() / (1024 * 1024);
        if size_mb > self.config.max_feed_size_mb {
            return Err(AggregatorError::FeedTooLarge { size_mb });
        }

        debug!(
            "Fetched {} ({} bytes in {}ms)",
            url,
            content.len(),
            start_time.elapsed().as_millis()
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_default_config() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        assert_eq!(fetcher.config().max_entries_per_source, 20);
        assert_eq!(fetcher.config().recency_window_hours, 24);
        assert!(fetcher.config().user_agent.starts_with("Mozilla/5.0"));
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let config = FetchConfig {
            timeout_seconds: 2,
            ..FetchConfig::default()
        };
        let fetcher = Fetcher::new(config).unwrap();
        // Port 9 on loopback is discard; nothing listens there in CI
        let result = fetcher.fetch_document("http://127.0.0.1:9/rss.xml").await;
        assert!(result.is_err());
    }
}
