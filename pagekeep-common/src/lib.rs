//! Common types and utilities shared across pagekeep crates.
//!
//! This crate defines the record handed back to callers of the extraction
//! pipeline, the request shape that drives it, observability helpers, and the
//! shared error type. It is intentionally lightweight so that every crate in
//! the workspace can depend on it without pulling in HTML or HTTP stacks.
//!
//! # Overview
//!
//! - [`PageContent`]: the merged result of one extraction request
//! - [`ExtractionMethod`]: provenance tag recording which stages succeeded
//! - [`ExtractRequest`] and [`CaptureMode`]: the single inbound request shape
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`PagekeepError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! Building the baseline record a failed extraction still yields:
//!
//! ```rust
//! use pagekeep_common::{ExtractionMethod, PageContent};
//!
//! let page = PageContent::new("https://example.com/post");
//! assert_eq!(page.extraction_method, ExtractionMethod::ServerSide);
//! assert!(page.html_content.is_none());
//! ```

pub mod observability;
mod page;

pub use page::{CaptureMode, Completeness, ExtractRequest, ExtractionMethod, PageContent};

/// Error types surfaced to callers of the extraction pipeline.
///
/// Only these are fatal: every other stage failure degrades the returned
/// [`PageContent`] instead of failing the request.
#[derive(thiserror::Error, Debug)]
pub enum PagekeepError {
    /// The link is not an absolute http(s) URL the pipeline can capture.
    #[error("invalid link: {0}")]
    InvalidLink(String),

    /// The link points at a host the deployment refuses to capture.
    #[error("refusing to capture excluded host: {0}")]
    ExcludedHost(String),

    /// Server-side fetching failed; `status` is an HTTP code or a short tag
    /// such as `timeout` or `network`.
    #[error("fetch failed ({status}): {cause}")]
    Fetch { status: String, cause: String },

    /// The caller cancelled the request before it finished.
    #[error("extraction cancelled")]
    Cancelled,

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A worker task failed in a way no stage could absorb.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`PagekeepError`].
pub type Result<T> = std::result::Result<T, PagekeepError>;
