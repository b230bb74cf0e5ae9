//! Product Service - Business logic layer

use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::assets::{AssetStore, PRODUCTS_FOLDER, is_embedded_payload, storage_id_from_url};
use crate::error::{ProductError, ProductResult};
use crate::models::{
    ImageChange, ListQuery, Pagination, Product, ProductFields, ProductInput, ProductPage,
};
use crate::repository::ProductRepository;

/// Product service providing business logic operations
///
/// Validates request bodies, moves embedded images to the asset store and
/// delegates persistence to the repository.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
    assets: Arc<dyn AssetStore>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R, assets: Arc<dyn AssetStore>) -> Self {
        Self {
            repository: Arc::new(repository),
            assets,
        }
    }

    /// Create a product from a raw JSON body
    #[instrument(skip(self, body))]
    pub async fn create_product(&self, body: Value) -> ProductResult<Product> {
        let fields = Self::validate(body)?;
        let (fields, _) = self.resolve_image(fields).await?;

        self.repository.create(fields).await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &str) -> ProductResult<Product> {
        let uuid = Self::parse_id(id)?;

        self.repository
            .get_by_id(uuid)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    /// One page of products, newest first
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ListQuery) -> ProductResult<ProductPage> {
        let filter = query.filter();
        let (page, limit) = (query.page(), query.limit());
        let skip = Pagination::new(page, limit, 0).skip();

        let (total, products) = futures_util::try_join!(
            self.repository.count(filter.clone()),
            self.repository.list(filter, skip, limit),
        )?;

        Ok(ProductPage {
            products,
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// Replace every field of an existing product. Last write wins.
    #[instrument(skip(self, body))]
    pub async fn update_product(&self, id: &str, body: Value) -> ProductResult<Product> {
        let fields = Self::validate(body)?;
        let uuid = Self::parse_id(id)?;
        let (fields, uploaded) = self.resolve_image(fields).await?;

        match self.repository.update(uuid, fields).await? {
            Some(product) => Ok(product),
            None => {
                if let Some(public_id) = uploaded {
                    self.discard_asset(&public_id).await;
                }
                Err(ProductError::NotFound(id.to_string()))
            }
        }
    }

    /// Delete a product, then its hosted image on a best-effort basis
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> ProductResult<Product> {
        let uuid = Self::parse_id(id)?;

        let removed = self
            .repository
            .delete(uuid)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))?;

        if let Some(storage_id) = removed.image.as_deref().and_then(storage_id_from_url) {
            self.discard_asset(storage_id).await;
        }

        Ok(removed)
    }

    fn validate(body: Value) -> ProductResult<ProductFields> {
        ProductInput::from_value(&body)
            .into_fields()
            .map_err(|missing| ProductError::Validation {
                missing,
                received: body,
            })
    }

    /// Ids that are not UUIDs cannot exist, so they are reported as not found.
    fn parse_id(id: &str) -> ProductResult<Uuid> {
        Uuid::parse_str(id).map_err(|_| ProductError::NotFound(id.to_string()))
    }

    /// Upload an embedded image and swap in its hosted URL.
    /// Returns the storage id of the new asset when an upload happened.
    async fn resolve_image(
        &self,
        mut fields: ProductFields,
    ) -> ProductResult<(ProductFields, Option<String>)> {
        let Some(payload) = fields.image.as_set().filter(|i| is_embedded_payload(i)) else {
            return Ok((fields, None));
        };

        let uploaded = self.assets.upload(payload, PRODUCTS_FOLDER).await?;
        let storage_id = storage_id_from_url(&uploaded.secure_url).map(str::to_string);
        fields.image = ImageChange::Set(uploaded.secure_url);

        Ok((fields, storage_id))
    }

    async fn discard_asset(&self, storage_id: &str) {
        if let Err(e) = self.assets.delete(storage_id, PRODUCTS_FOLDER).await {
            tracing::warn!(storage_id, error = %e, "Failed to delete product image");
        }
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            assets: Arc::clone(&self.assets),
        }
    }
}
