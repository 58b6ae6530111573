pub mod types;
pub mod registry;
pub mod fetcher;
pub mod parser;
pub mod dates;
pub mod traits;
pub mod sources;
pub mod cache;
pub mod aggregator;
pub mod seen;
pub mod query;
pub mod session;
pub mod export;
pub mod digest;

pub use types::*;
pub use registry::SourceRegistry;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use traits::SourceFetcher;
pub use sources::{normalize_entries, HttpSourceFetcher};
pub use aggregator::{merge_items, Aggregator};
pub use seen::SeenSet;
pub use query::{query, view, Query, QueryResult, SourceSelection, View};
pub use session::Session;
pub use digest::{load_digest, parse_digest, DigestArchive, DigestEntry, DigestLoad};
