//! Scraper for pages that list news as table rows.
//!
//! Each row is expected to hold a timestamp in its first cell and an
//! anchor somewhere after it. Rows that do not fit are skipped, so a
//! redesign upstream degrades this source to zero items.

use crate::dates::parse_lenient;
use crate::fetcher::Fetcher;
use crate::types::{AggregatorError, RawEntry, Result, SourceDescriptor};
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

pub async fn fetch_entries(
    fetcher: &Fetcher,
    source: &SourceDescriptor,
    row_selector: &str,
    now: DateTime<Utc>,
) -> Result<Vec<RawEntry>> {
    let base_url = Url::parse(&source.endpoint)?;
    let html = fetcher.fetch_document(&source.endpoint).await?;
    parse_table(&html, &base_url, row_selector, now)
}

pub fn parse_table(html: &str, base_url: &Url, row_selector: &str, now: DateTime<Utc>) -> Result<Vec<RawEntry>> {
    let rows = selector(row_selector)?;
    let cells = selector("td")?;
    let anchors = selector("a[href]")?;

    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    for row in document.select(&rows) {
        let mut row_cells = row.select(&cells);
        let Some(time_cell) = row_cells.next() else {
            continue;
        };
        let timestamp = time_cell.text().collect::<String>();

        let Some(anchor) = row_cells.find_map(|cell| cell.select(&anchors).next()) else {
            continue;
        };
        let title = anchor.text().collect::<Vec<_>>().join(" ");
        let link = anchor
            .value()
            .attr("href")
            .and_then(|href| base_url.join(href).ok())
            .map(|url| url.to_string());

        entries.push(RawEntry {
            title: title.split_whitespace().collect::<Vec<_>>().join(" "),
            link,
            published_at: parse_lenient(&timestamp, now),
        });
    }

    debug!("Scraped {} table rows from {}", entries.len(), base_url);
    Ok(entries)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AggregatorError::Parse(format!("Invalid selector '{}': {}", css, e)))
}
