//! Content extraction for pagekeep.
//!
//! Three pieces, usable on their own or through [`Extractor`]:
//!
//! - [`ReadabilityExtractor`]: structured article fields from a pluggable
//!   [`ReadabilityEngine`] (default [`DomSmoothieEngine`]).
//! - [`Normalizer`]: bounded, whitelisted HTML.
//! - [`Extractor`]: fetches or accepts HTML, runs both stages concurrently
//!   and merges the results into a [`pagekeep_common::PageContent`].
//!
//! ```no_run
//! use pagekeep_common::ExtractRequest;
//! use pagekeep_config::PagekeepConfig;
//! use pagekeep_extract::Extractor;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> pagekeep_common::Result<()> {
//! let extractor = Extractor::from_config(&PagekeepConfig::default())?;
//! let page = extractor
//!     .extract(
//!         ExtractRequest::server_side("https://example.com/post"),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//! println!("{}", page.extraction_method);
//! # Ok(())
//! # }
//! ```
mod dates;
mod dom;
mod error;
mod meta;
pub mod normalize;
mod orchestrator;
pub mod readability;
mod text;

pub use dates::parse_published_time;
pub use error::{ExtractionError, MalformedInputError};
pub use meta::PageMeta;
pub use normalize::{CleanedHtml, Isolation, Normalizer};
pub use orchestrator::Extractor;
pub use readability::{
    ArticleRecord, DomSmoothieEngine, ParsedArticle, ReadabilityEngine, ReadabilityExtractor,
    ReadabilityOutcome,
};
pub use text::clean_text;
