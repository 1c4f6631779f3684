//! HTTP book sources for the Booktrend ingestion engine.
//!
//! Each source implements [`booktrend_core::BookSource`] over a public
//! bibliographic API:
//!
//! - [`openlibrary::OpenLibrarySource`] queries Open Library's subject search
//!   and filters records by whole-word subject matches;
//! - [`googlebooks::GoogleBooksSource`] queries Google Books with a
//!   `subject:` filter and requires authors.
//!
//! Requests block on an internal Tokio runtime with a bounded timeout. A
//! failed request surfaces as [`booktrend_core::FetchError`] and ends the run
//! without retrying.

#![forbid(unsafe_code)]

pub mod googlebooks;
mod http;
pub mod openlibrary;

pub use googlebooks::{GoogleBooksConfig, GoogleBooksSource};
pub use http::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, HttpSettings, SourceBuildError};
pub use openlibrary::{OpenLibraryConfig, OpenLibrarySource};
