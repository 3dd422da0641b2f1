//! The library code for the `almanac` content server. The architecture can be
//! broken down into two parts:
//!
//! 1. Building the post catalog from source files on disk
//!    ([`crate::repository`])
//! 2. Serving pages rendered from the catalog ([`crate::server`])
//!
//! Of the two, the first is the more involved. Posts live under
//! `{posts}/{year}/{month}/{slug}.md`. A build walks that tree
//! ([`crate::walk`]), parses each file's header ([`crate::header`]),
//! normalizes its date ([`crate::date`]) and derives its URL
//! ([`crate::locator`]). Posts that fail any step are left out of the catalog
//! and recorded as diagnostics rather than failing the build. The finished
//! [`crate::catalog::Catalog`] is sorted newest first and swapped in whole, so
//! a rebuild never exposes a partial catalog.
//!
//! The second part is a thin layer: handlers look posts up in the published
//! catalog, convert bodies from markdown ([`crate::markdown`]) and apply the
//! theme's templates ([`crate::render`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod catalog;
pub mod config;
pub mod date;
pub mod fs;
pub mod header;
pub mod locator;
pub mod markdown;
pub mod post;
pub mod render;
pub mod repository;
pub mod server;
pub mod walk;
