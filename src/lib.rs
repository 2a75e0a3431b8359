//! The library code for the `almanac` static site generator. The
//! architecture can be generally broken down into three distinct steps:
//!
//! 1. Loading posts from source files on disk ([`crate::post`])
//! 2. Aggregating cross-post state ([`crate::aggregate`]): chronological
//!    order, tag indexes, the archive calendar, and absolute URLs
//! 3. Rendering the aggregated state into output files on disk
//!    ([`crate::write`])
//!
//! Of the three, the last is the most involved. It is itself composed of
//! four independent passes, each reading the same aggregated state:
//!
//! 1. Rendering root pages from the content directory
//! 2. Rendering post pages with prev/next chronological links
//! 3. Rendering the archive calendar (one page per year, one per month)
//! 4. Rendering tag pages, for public and hidden tags alike
//!
//! Everything is sequential and single-shot: posts load once, aggregation
//! runs exactly once over the full collection, and the rendering passes
//! treat its result as read-only.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod aggregate;
pub mod build;
pub mod config;
pub mod date;
pub mod filters;
pub mod markdown;
pub mod post;
pub mod slug;
pub mod write;
