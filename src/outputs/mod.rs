//! Output generation for feeds and raw records.
//!
//! # Submodules
//!
//! - [`rss`]: assembles a channel and its articles into an RSS 2.0 document
//! - [`json`]: writes channel and article records as JSON for inspection

pub mod json;
pub mod rss;
