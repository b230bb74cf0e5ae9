use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{Product, ProductFields, ProductFilter};

/// Repository trait for Product persistence
///
/// Update and delete are single atomic operations returning the affected
/// document, or `None` when no product has the id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new product built from validated fields
    async fn create(&self, fields: ProductFields) -> ProductResult<Product>;

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// One page of matching products, newest first
    async fn list(&self, filter: ProductFilter, skip: u64, limit: u64) -> ProductResult<Vec<Product>>;

    async fn count(&self, filter: ProductFilter) -> ProductResult<u64>;

    /// Overwrite the fields of an existing product and return the stored result
    async fn update(&self, id: Uuid, fields: ProductFields) -> ProductResult<Option<Product>>;

    /// Remove a product and return what was removed
    async fn delete(&self, id: Uuid) -> ProductResult<Option<Product>>;
}
