//! Products Domain
//!
//! Product catalog backed by MongoDB, with product images hosted by an
//! external asset store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌─────────────┐
//! │   Service   │ ──▶ │ Asset Store │  ← Image upload/delete (Cloudinary)
//! └──────┬──────┘     └─────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, request/response bodies
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_products::{
//!     assets::{CloudinaryAssetStore, CloudinaryConfig},
//!     handlers,
//!     mongodb::MongoProductRepository,
//!     service::ProductService,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("ecommerce");
//!
//! let repository = MongoProductRepository::new(&db);
//! let assets = CloudinaryAssetStore::new(CloudinaryConfig::new("demo", "key", "secret"));
//! let service = ProductService::new(repository, Arc::new(assets));
//!
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use assets::{AssetError, AssetStore, CloudinaryAssetStore, CloudinaryConfig, UploadedAsset};
pub use error::{Operation, ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use models::{
    ImageChange, ListQuery, Pagination, Product, ProductFields, ProductFilter, ProductInput,
    ProductPage,
};
pub use mongodb::MongoProductRepository;
pub use repository::ProductRepository;
pub use service::ProductService;
