//! Google Books volume search.
//!
//! [`GoogleBooksSource`] queries `volumes?q=subject:<genre>`. Results are
//! relevant by construction, so no subject matching is applied; the first
//! category, when present, is recorded as the matched subject. Every record
//! must name at least one author.

mod response;
mod source;

pub use response::{Volume, VolumeInfo, VolumesResponse};
pub use source::{
    DEFAULT_GOOGLE_BOOKS_URL, GOOGLE_BOOKS_PAGE_CEILING, GoogleBooksConfig, GoogleBooksSource,
};
