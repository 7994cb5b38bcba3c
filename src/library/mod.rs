//! Topic catalog.
//!
//! Discovery builds a registry of topic sources, [`Catalog::load`] reads and
//! validates them once, and [`LazyCatalog`] defers that load to first use.

pub mod catalog;
pub mod lazy;

pub use catalog::{
    normalize_slug, Catalog, CatalogError, CatalogPolicy, DuplicatePolicy, InvalidPolicy, Lookup,
    Neighbors, TopicDocument,
};
pub use lazy::LazyCatalog;
