//! Fetch pages of raw book records from a bibliographic API.
//!
//! The `BookSource` trait abstracts one paginated search endpoint. The
//! ingestion loop asks for a page at a given offset and receives raw records
//! plus an optional total hit count, then hands each record back to the
//! source for normalisation.
//!
//! Fetching is synchronous; HTTP implementations in `booktrend-data` block on
//! an owned runtime internally.

mod error;
mod provider;

pub use error::FetchError;
pub use provider::{BookSource, PageRequest, SourcePage};
