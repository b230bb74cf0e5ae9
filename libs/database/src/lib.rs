//! Database connectors and utilities.
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB client, configuration and health checks
//! - `config` - `core_config::FromEnv` support for the connector configs
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb;
//!
//! let config = mongodb::MongoConfig::with_database("mongodb://localhost:27017", "shop");
//! let client = mongodb::connect_from_config_with_retry(&config, None).await?;
//! let db = client.database(config.database());
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
