//! Load-once catalog handle.
//!
//! Owns what is needed to build a [`Catalog`] and builds it on first use.
//! Callers hold the handle (or an `Arc` of it) instead of reaching for a
//! global.

use std::path::Path;

use anyhow::Result;
use tokio::sync::OnceCell;

use super::catalog::{Catalog, CatalogError, CatalogPolicy};
use crate::content::Registry;

/// Catalog that loads on first access and is reused afterwards
#[derive(Debug)]
pub struct LazyCatalog {
    registry: Registry,
    policy: CatalogPolicy,
    cell: OnceCell<Catalog>,
}

impl LazyCatalog {
    pub fn new(registry: Registry, policy: CatalogPolicy) -> Self {
        Self {
            registry,
            policy,
            cell: OnceCell::new(),
        }
    }

    /// Discover the content directory now, load topics on first access
    pub fn discover(content_dir: &Path, policy: CatalogPolicy) -> Result<Self> {
        let registry = Registry::discover(content_dir)?;
        Ok(Self::new(registry, policy))
    }

    /// The catalog, loading it if this is the first call.
    ///
    /// A failed load is not cached: the next call tries again.
    pub async fn get(&self) -> Result<&Catalog, CatalogError> {
        self.cell
            .get_or_try_init(|| Catalog::load(&self.registry, &self.policy))
            .await
    }

    /// Whether the catalog has been loaded
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}
