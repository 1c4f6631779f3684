//! Open Library subject search.
//!
//! [`OpenLibrarySource`] queries `search.json` by subject and keeps records
//! whose subject tags mention the genre as a whole word. Authors are optional
//! for this source.

mod response;
mod source;

pub use response::{SearchDoc, SearchResponse};
pub use source::{
    DEFAULT_OPEN_LIBRARY_URL, OPEN_LIBRARY_PAGE_CEILING, OpenLibraryConfig, OpenLibrarySource,
};
