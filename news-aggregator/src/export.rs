//! One-way plain-text reports of a query result.

use crate::query::QueryResult;
use crate::types::{CategoryFilter, NewsItem, Result};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

const NEW_MARKER: &str = "NUOVA";
const READ_MARKER: &str = "letta";

fn header<Tz: TimeZone>(category: &CategoryFilter, generated_at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!(
        "Notizie esportate il {} - categoria: {}",
        generated_at.format("%Y-%m-%d %H:%M"),
        category
    )
}

fn item_line<Tz: TimeZone>(item: &NewsItem, zone: &Tz) -> String
where
    Tz::Offset: Display,
{
    format!(
        "[{}] {}: {}",
        item.published_at.with_timezone(zone).format("%H:%M"),
        item.source_label,
        item.title
    )
}

/// Header plus one `[HH:MM] LABEL: TITLE` line per item. Times are shown
/// in the zone of `generated_at`.
pub fn export_plain<Tz: TimeZone>(result: &QueryResult, category: &CategoryFilter, generated_at: DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let zone = generated_at.timezone();
    let mut out = header(category, &generated_at);
    out.push('\n');
    for item in result.items() {
        out.push_str(&item_line(item, &zone));
        out.push('\n');
    }
    out
}

/// Header, then one block per item with its link and read status.
pub fn export_detailed<Tz: TimeZone>(
    result: &QueryResult,
    category: &CategoryFilter,
    generated_at: DateTime<Tz>,
) -> String
where
    Tz::Offset: Display,
{
    let zone = generated_at.timezone();
    let mut out = header(category, &generated_at);
    out.push('\n');
    for (index, item) in result.items().iter().enumerate() {
        let marker = if result.is_new(index) { NEW_MARKER } else { READ_MARKER };
        // writing into a String cannot fail
        let _ = write!(out, "\n{}\n{}\n{}\n", item_line(item, &zone), item.link, marker);
    }
    out
}

pub fn write_report(path: impl AsRef<Path>, report: &str) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, report)?;
    info!("Wrote report to {} ({} bytes)", path.display(), report.len());
    Ok(())
}
