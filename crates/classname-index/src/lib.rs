//! Stylesheet class selector indexing for typed-classnames.
//!
//! This crate discovers every class selector reachable from a set of entry
//! stylesheets:
//! - Parsing stylesheets into a small rule model ([`stylesheet`])
//! - Extracting bare class names and `@import` targets ([`extract`])
//! - Following imports breadth-first across files ([`indexer`])
//! - Caching the result per configuration and rebuilding on change ([`cache`], [`watch`])
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8PathBuf;
//! use classname_index::{IndexCache, StylesheetIndexer};
//!
//! let cache = IndexCache::new(StylesheetIndexer::default());
//! let entries = vec![Utf8PathBuf::from("src/styles/main.css")];
//! let index = cache.get_or_build(&entries);
//!
//! if !index.contains("btn-primary") {
//!     println!("btn-primary is not defined");
//! }
//! ```

pub mod cache;
pub mod extract;
mod index;
pub mod indexer;
mod paths;
pub mod resolve;
pub mod stylesheet;
pub mod watch;

pub use cache::IndexCache;
pub use extract::{extract, extract_all, Extraction, ImportTarget, StylesheetClasses};
pub use index::Index;
pub use indexer::{IndexError, IndexReport, SkippedFile, StylesheetIndexer};
pub use resolve::{ModuleResolver, NodeModulesResolver, ResolveError};
pub use stylesheet::{
    LightningCssParser, ParsedStylesheet, Rule, StylesheetParser, StylesheetSyntaxError,
};
pub use watch::{IndexWatcher, PathWatcher, WatchError, WatchOptions, WatchRegistry};
