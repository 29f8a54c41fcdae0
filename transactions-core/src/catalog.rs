//! Operation type catalog
//!
//! The catalog is seeded once at startup and only read afterwards. Reads go
//! through `CachedCatalog`, which keeps hits in a TTL cache and never caches
//! an unknown ID.

use crate::cache::TtlCache;
use crate::storage::Storage;
use crate::store::OperationCatalog;
use crate::types::OperationType;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Built-in operation types
pub fn default_operation_types() -> Vec<OperationType> {
    vec![
        OperationType::new(1, "Normal Purchase", -1),
        OperationType::new(2, "Purchase with installments", -1),
        OperationType::new(3, "Withdrawal", -1),
        OperationType::new(4, "Credit Voucher", 1),
    ]
}

/// Write the built-in operation types, replacing entries with the same ID
pub fn seed(storage: &Storage) -> Result<usize> {
    let operation_types = default_operation_types();
    for operation_type in &operation_types {
        storage.put_operation_type(operation_type)?;
    }

    tracing::info!(count = operation_types.len(), "Operation type catalog seeded");
    Ok(operation_types.len())
}

/// Catalog reader with a TTL cache in front
pub struct CachedCatalog {
    inner: Arc<dyn OperationCatalog>,
    cache: Option<TtlCache<i32, OperationType>>,
}

impl CachedCatalog {
    /// Cache entries for `ttl`
    pub fn new(inner: Arc<dyn OperationCatalog>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Some(TtlCache::new(ttl)),
        }
    }

    /// Pass every read through
    pub fn uncached(inner: Arc<dyn OperationCatalog>) -> Self {
        Self { inner, cache: None }
    }

    /// Lookup cache, `None` when disabled
    pub fn cache(&self) -> Option<&TtlCache<i32, OperationType>> {
        self.cache.as_ref()
    }
}

#[async_trait]
impl OperationCatalog for CachedCatalog {
    async fn get_by_id(&self, operation_type_id: i32) -> Result<Option<OperationType>> {
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&operation_type_id)) {
            return Ok(Some(cached));
        }

        let found = self.inner.get_by_id(operation_type_id).await?;

        if let (Some(cache), Some(operation_type)) = (&self.cache, &found) {
            cache.insert(operation_type_id, operation_type.clone());
        }

        Ok(found)
    }
}
