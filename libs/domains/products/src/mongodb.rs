//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use chrono::Utc;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Bson, Document, doc},
    error::ErrorKind,
    options::{FindOptions, IndexOptions, ReturnDocument},
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{
    ImageChange, Product, ProductFields, ProductFilter, REQUIRED_FIELDS, timestamp,
};
use crate::repository::ProductRepository;

pub const COLLECTION: &str = "products";

const NAMESPACE_NOT_FOUND: i32 = 26;
const UNAUTHORIZED: i32 = 13;
/// Atlas shared tiers report missing privileges with their own code.
const ATLAS_ERROR: i32 = 8000;

/// Server error code of a failed command, if it was one.
fn command_code(err: &mongodb::error::Error) -> Option<i32> {
    match *err.kind {
        ErrorKind::Command(ref command) => Some(command.code),
        _ => None,
    }
}

/// Codes meaning the user lacks the privilege to change collection options.
fn is_permission_denied(code: i32) -> bool {
    matches!(code, UNAUTHORIZED | ATLAS_ERROR)
}

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    database: Database,
    collection: Collection<Product>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, COLLECTION)
    }

    /// Use a custom collection name (tests run against throwaway collections)
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            database: db.clone(),
            collection: db.collection::<Product>(collection_name),
        }
    }

    /// Create the indexes used by list filters and ordering
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "category": 1, "createdAt": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_category_created".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "brand": 1, "createdAt": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_brand_created".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "createdAt": -1, "_id": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_created".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    /// Install the `$jsonSchema` validator, creating the collection if needed.
    ///
    /// Users without the privilege to change collection options (plain
    /// `readWrite`) get a warning and run without the validator.
    pub async fn init_schema(&self) -> ProductResult<()> {
        let name = self.collection.name();

        match self.install_validator().await {
            Ok(()) => {
                tracing::info!(collection = name, "Product schema validator installed");
                Ok(())
            }
            Err(e) if command_code(&e).is_some_and(is_permission_denied) => {
                tracing::warn!(
                    collection = name,
                    error = %e,
                    "Not allowed to install the product schema validator, continuing without it"
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn install_validator(&self) -> mongodb::error::Result<()> {
        let name = self.collection.name();
        let validator = doc! { "$jsonSchema": Self::json_schema() };

        let modified = self
            .database
            .run_command(doc! { "collMod": name, "validator": validator.clone() })
            .await;

        match modified {
            Ok(_) => Ok(()),
            Err(e) if command_code(&e) == Some(NAMESPACE_NOT_FOUND) => {
                self.database
                    .create_collection(name)
                    .validator(validator)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    /// Document validator mirroring the request validation rules.
    fn json_schema() -> Document {
        let number = doc! { "bsonType": ["double", "int", "long", "decimal"] };
        let text = doc! { "bsonType": "string", "minLength": 1 };

        let mut properties = doc! {
            "_id": { "bsonType": "string" },
            "image": { "bsonType": "string" },
            "createdAt": { "bsonType": "string" },
            "updatedAt": { "bsonType": "string" },
        };
        for field in REQUIRED_FIELDS {
            let rule = match field {
                "price" | "discount" => number.clone(),
                _ => text.clone(),
            };
            properties.insert(field, rule);
        }

        doc! {
            "bsonType": "object",
            "required": REQUIRED_FIELDS.to_vec(),
            "properties": properties,
        }
    }

    fn id_filter(id: Uuid) -> Document {
        doc! { "_id": id.hyphenated().to_string() }
    }

    /// Build a MongoDB filter document from ProductFilter
    fn build_filter(filter: &ProductFilter) -> Document {
        let mut doc = doc! {};

        if let Some(ref category) = filter.category {
            doc.insert("category", category);
        }

        if let Some(ref brand) = filter.brand {
            doc.insert("brand", brand);
        }

        doc
    }

    fn build_update(fields: ProductFields) -> Document {
        let mut update = doc! {};
        let mut set = doc! {
            "title": fields.title,
            "price": fields.price,
            "description": fields.description,
            "brand": fields.brand,
            "model": fields.model,
            "color": fields.color,
            "category": fields.category,
            "discount": fields.discount,
            "updatedAt": timestamp::format(&Utc::now()),
        };

        match fields.image {
            ImageChange::Keep => {}
            ImageChange::Clear => {
                update.insert("$unset", doc! { "image": "" });
            }
            ImageChange::Set(image) => {
                set.insert("image", Bson::String(image));
            }
        }

        update.insert("$set", set);
        update
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, fields), fields(title = %fields.title))]
    async fn create(&self, fields: ProductFields) -> ProductResult<Product> {
        let product = Product::new(fields);

        self.collection.insert_one(&product).await?;

        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let product = self.collection.find_one(Self::id_filter(id)).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: ProductFilter, skip: u64, limit: u64) -> ProductResult<Vec<Product>> {
        use futures_util::TryStreamExt;

        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .skip(skip)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();

        let cursor = self
            .collection
            .find(Self::build_filter(&filter))
            .with_options(options)
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: ProductFilter) -> ProductResult<u64> {
        let count = self
            .collection
            .count_documents(Self::build_filter(&filter))
            .await?;
        Ok(count)
    }

    #[instrument(skip(self, fields))]
    async fn update(&self, id: Uuid, fields: ProductFields) -> ProductResult<Option<Product>> {
        let updated = self
            .collection
            .find_one_and_update(Self::id_filter(id), Self::build_update(fields))
            .return_document(ReturnDocument::After)
            .await?;

        if updated.is_some() {
            tracing::info!(product_id = %id, "Product updated successfully");
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let removed = self
            .collection
            .find_one_and_delete(Self::id_filter(id))
            .await?;

        if removed.is_some() {
            tracing::info!(product_id = %id, "Product deleted successfully");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ProductFields {
        ProductFields {
            title: "Desk lamp".to_string(),
            image: ImageChange::Keep,
            price: 25.0,
            description: "LED".to_string(),
            brand: "Acme".to_string(),
            model: "L1".to_string(),
            color: "black".to_string(),
            category: "lighting".to_string(),
            discount: 5.0,
        }
    }

    #[test]
    fn test_build_filter_empty() {
        let doc = MongoProductRepository::build_filter(&ProductFilter::default());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_build_filter_with_category_and_brand() {
        let filter = ProductFilter {
            category: Some("A".to_string()),
            brand: Some("Acme".to_string()),
        };
        let doc = MongoProductRepository::build_filter(&filter);
        assert_eq!(doc, doc! { "category": "A", "brand": "Acme" });
    }

    #[test]
    fn test_build_update_without_image_leaves_it_alone() {
        let update = MongoProductRepository::build_update(fields());
        let set = update.get_document("$set").unwrap();

        assert!(!set.contains_key("image"));
        assert!(!update.contains_key("$unset"));
        assert_eq!(set.get_str("title").unwrap(), "Desk lamp");
        assert_eq!(set.get_f64("discount").unwrap(), 5.0);
        assert!(set.contains_key("updatedAt"));
        assert!(!set.contains_key("createdAt"));
    }

    #[test]
    fn test_build_update_sets_image() {
        let mut fields = fields();
        fields.image = ImageChange::Set("https://cdn.example.com/products/a.png".to_string());

        let update = MongoProductRepository::build_update(fields);

        assert_eq!(
            update.get_document("$set").unwrap().get_str("image").unwrap(),
            "https://cdn.example.com/products/a.png"
        );
    }

    #[test]
    fn test_build_update_clear_unsets_image() {
        let mut fields = fields();
        fields.image = ImageChange::Clear;

        let update = MongoProductRepository::build_update(fields);

        assert_eq!(update.get_document("$unset").unwrap(), &doc! { "image": "" });
        assert!(!update.get_document("$set").unwrap().contains_key("image"));
    }

    #[test]
    fn test_permission_errors_skip_the_validator() {
        assert!(is_permission_denied(UNAUTHORIZED));
        assert!(is_permission_denied(ATLAS_ERROR));
        assert!(!is_permission_denied(NAMESPACE_NOT_FOUND));
        assert!(!is_permission_denied(2));
    }

    #[test]
    fn test_command_code_ignores_non_command_errors() {
        let err = mongodb::error::Error::custom("not a command failure");
        assert_eq!(command_code(&err), None);
    }

    #[test]
    fn test_json_schema_requires_all_fields() {
        let schema = MongoProductRepository::json_schema();

        let required: Vec<&str> = schema
            .get_array("required")
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required, REQUIRED_FIELDS.to_vec());

        let properties = schema.get_document("properties").unwrap();
        assert_eq!(
            properties.get_document("title").unwrap().get_i32("minLength").unwrap(),
            1
        );
        assert!(properties.get_document("price").unwrap().get_array("bsonType").is_ok());
    }

    #[test]
    fn test_id_filter_matches_stored_representation() {
        let product = Product::new(fields());
        let stored = mongodb::bson::to_document(&product).unwrap();

        let filter = MongoProductRepository::id_filter(product.id);

        assert_eq!(filter.get("_id"), stored.get("_id"));
        assert_eq!(stored.get_str("_id").unwrap(), product.id.to_string());
    }

    /// Requires a running MongoDB at `MONGODB_URL` (default `mongodb://localhost:27017`).
    #[tokio::test]
    #[ignore]
    async fn test_crud_against_mongodb() {
        let url = std::env::var("MONGODB_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let client = mongodb::Client::with_uri_str(&url).await.unwrap();
        let db = client.database("products_repository_test");
        let repo = MongoProductRepository::with_collection(&db, &format!("products_{}", Uuid::now_v7()));
        repo.init_schema().await.unwrap();
        repo.init_indexes().await.unwrap();

        let created = repo.create(fields()).await.unwrap();
        assert_eq!(repo.get_by_id(created.id).await.unwrap().unwrap().title, "Desk lamp");

        let mut changed = fields();
        changed.title = "Floor lamp".to_string();
        changed.image = ImageChange::Set("https://cdn.example.com/products/a.png".to_string());
        let updated = repo.update(created.id, changed).await.unwrap().unwrap();
        assert_eq!(updated.title, "Floor lamp");
        assert_eq!(updated.id, created.id);
        assert!(updated.image.is_some());

        let mut cleared = fields();
        cleared.image = ImageChange::Clear;
        let updated = repo.update(created.id, cleared).await.unwrap().unwrap();
        assert_eq!(updated.image, None);

        let filter = ProductFilter {
            category: Some("lighting".to_string()),
            brand: None,
        };
        assert_eq!(repo.count(filter.clone()).await.unwrap(), 1);
        assert_eq!(repo.list(filter, 0, 10).await.unwrap().len(), 1);

        assert!(repo.delete(created.id).await.unwrap().is_some());
        assert!(repo.delete(created.id).await.unwrap().is_none());
        assert!(repo.update(created.id, fields()).await.unwrap().is_none());

        repo.collection.drop().await.unwrap();
    }
}
