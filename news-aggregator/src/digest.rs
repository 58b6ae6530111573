//! Reader for the daily digest files.
//!
//! A digest is a sequence of blocks separated by blank lines. Each block is
//! a title line, an image URL line, one or more body lines and a final
//! `YYYY-MM-DD HH:MM:SS` timestamp. Blocks that do not fit are skipped whole.

use crate::types::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DIGEST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const SUMMARY_CHARS: usize = 280;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestEntry {
    pub title: String,
    pub image_url: String,
    pub body: String,
    pub updated_at: NaiveDateTime,
}

/// Outcome of loading a digest file. A missing file and a file with no
/// valid blocks are rendered differently, so they stay distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestLoad {
    Missing,
    Invalid,
    Entries(Vec<DigestEntry>),
}

/// Parse digest text, newest entry first.
pub fn parse_digest(text: &str) -> Vec<DigestEntry> {
    let mut entries = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut skipped = 0usize;

    for line in text.lines().map(str::trim).chain(std::iter::once("")) {
        if !line.is_empty() {
            block.push(line);
            continue;
        }
        if block.is_empty() {
            continue;
        }
        match parse_block(&block) {
            Some(entry) => entries.push(entry),
            None => skipped += 1,
        }
        block.clear();
    }

    if skipped > 0 {
        debug!("Skipped {} malformed digest blocks", skipped);
    }
    entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    entries
}

fn parse_block(lines: &[&str]) -> Option<DigestEntry> {
    let (title, rest) = lines.split_first()?;
    let (image_url, rest) = rest.split_first()?;
    let (timestamp, body) = rest.split_last()?;
    if body.is_empty() {
        return None;
    }
    if !image_url.starts_with("http://") && !image_url.starts_with("https://") {
        return None;
    }
    let updated_at = NaiveDateTime::parse_from_str(timestamp, DIGEST_TIME_FORMAT).ok()?;

    Some(DigestEntry {
        title: title.to_string(),
        image_url: image_url.to_string(),
        body: body.join(" "),
        updated_at,
    })
}

pub fn load_digest(path: impl AsRef<Path>) -> Result<DigestLoad> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No digest file at {}", path.display());
        return Ok(DigestLoad::Missing);
    }

    let bytes = std::fs::read(path)?;
    let Ok(text) = String::from_utf8(bytes) else {
        warn!("Digest {} is not valid UTF-8", path.display());
        return Ok(DigestLoad::Invalid);
    };
    let entries = parse_digest(&text);
    if entries.is_empty() {
        info!("Digest {} has no valid blocks", path.display());
        return Ok(DigestLoad::Invalid);
    }

    info!("Loaded {} digest entries from {}", entries.len(), path.display());
    Ok(DigestLoad::Entries(entries))
}

/// Layout of digest files on disk: today's file at the root, past days
/// under `archive/YYYYMMDD.txt`.
#[derive(Debug, Clone)]
pub struct DigestArchive {
    root: PathBuf,
}

impl DigestArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, date: NaiveDate, today: NaiveDate) -> PathBuf {
        if date == today {
            self.root.join("news.txt")
        } else {
            self.root
                .join("archive")
                .join(format!("{}.txt", date.format("%Y%m%d")))
        }
    }

    pub fn load(&self, date: NaiveDate, today: NaiveDate) -> Result<DigestLoad> {
        load_digest(self.path_for(date, today))
    }
}

pub fn latest_update(entries: &[DigestEntry]) -> Option<NaiveDateTime> {
    entries.iter().map(|e| e.updated_at).max()
}

/// Card text: the body cut to `max_chars` characters, with an ellipsis when cut.
pub fn summary(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "\
Titolo uno
https://img.example.com/1.jpg
Prima riga del testo.
Seconda riga.
2024-01-08 12:30:00


Titolo due
https://img.example.com/2.jpg
Testo due
2024-01-08 14:00:00
";

    #[test]
    fn parses_blocks_newest_first() {
        let entries = parse_digest(DIGEST);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Titolo due");
        assert_eq!(entries[1].body, "Prima riga del testo. Seconda riga.");
        assert_eq!(
            latest_update(&entries),
            NaiveDateTime::parse_from_str("2024-01-08 14:00:00", DIGEST_TIME_FORMAT).ok()
        );
    }

    #[test]
    fn skips_block_without_date() {
        let text = "\
Buona
https://img.example.com/ok.jpg
Corpo
2024-01-08 09:00:00

Senza data
https://img.example.com/no-date.jpg
Corpo senza data
";
        let entries = parse_digest(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Buona");
    }

    #[test]
    fn skips_invalid_image_scheme_and_missing_body() {
        let text = "\
Immagine locale
/img/local.jpg
Corpo
2024-01-08 09:00:00

Senza corpo
https://img.example.com/x.jpg
2024-01-08 10:00:00
";
        assert!(parse_digest(text).is_empty());
    }

    #[test]
    fn load_distinguishes_missing_from_invalid() {
        let dir = tempfile::tempdir().unwrap();

        let missing = load_digest(dir.path().join("nope.txt")).unwrap();
        assert_eq!(missing, DigestLoad::Missing);

        let bad = dir.path().join("bad.txt");
        std::fs::write(&bad, "solo una riga\n").unwrap();
        assert_eq!(load_digest(&bad).unwrap(), DigestLoad::Invalid);

        let good = dir.path().join("good.txt");
        std::fs::write(&good, DIGEST).unwrap();
        assert!(matches!(load_digest(&good).unwrap(), DigestLoad::Entries(e) if e.len() == 2));
    }

    #[test]
    fn non_utf8_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let latin1 = dir.path().join("latin1.txt");
        // "Città" in ISO-8859-1
        std::fs::write(&latin1, b"Citt\xe0\nhttps://img.example.com/x.jpg\ncorpo\n2024-01-08 09:00:00\n").unwrap();

        assert_eq!(load_digest(&latin1).unwrap(), DigestLoad::Invalid);
    }

    #[test]
    fn archive_paths() {
        let archive = DigestArchive::new("/data");
        let today = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let past = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(archive.path_for(today, today), PathBuf::from("/data/news.txt"));
        assert_eq!(archive.path_for(past, today), PathBuf::from("/data/archive/20240103.txt"));
    }

    #[test]
    fn summary_truncates_by_chars() {
        assert_eq!(summary("breve", SUMMARY_CHARS), "breve");
        assert_eq!(summary("àèìòù e altro", 5), "àèìòù...");
    }
}
