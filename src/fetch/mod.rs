//! Paginated feature fetching.
//!
//! Provides the page source abstraction, the `reqwest` backed HTTP source,
//! and traversal of `next`-linked pages as a callback loop or a stream.

pub mod pager;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use pager::{features, pages, traverse};
pub use source::{
    collection_items_url, resolve_href, FeatureQuery, HttpPageSource, PageSource,
};
