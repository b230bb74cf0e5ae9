//! MongoDB connector and utilities

mod config;
mod connector;
mod health;

pub use config::{DEFAULT_DATABASE, MongoConfig};
pub use connector::{connect_from_config, connect_from_config_with_retry, resolve_database};
pub use health::{HealthStatus, check_health_detailed};

pub use mongodb::{Client, Collection, Database};
