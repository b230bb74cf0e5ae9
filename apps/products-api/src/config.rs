//! Configuration for Products API

use core_config::{app_info, server::ServerConfig, AppInfo, FromEnv};
use database::mongodb::MongoConfig;
use domain_products::CloudinaryConfig;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    /// `None` when `CLOUDINARY_CLOUD_NAME` is unset; embedded images are then rejected
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let mongodb = MongoConfig::from_env()?;
        let server = ServerConfig::from_env()?;

        let cloudinary = match std::env::var("CLOUDINARY_CLOUD_NAME") {
            Ok(_) => Some(CloudinaryConfig::from_env()?),
            Err(_) => None,
        };

        Ok(Self {
            app: app_info!(),
            mongodb,
            server,
            environment,
            cloudinary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_without_cloudinary() {
        temp_env::with_vars(
            [
                ("MONGO_URI", Some("mongodb://localhost:27017/shop")),
                ("MONGODB_URL", None),
                ("MONGO_URL", None),
                ("CLOUDINARY_CLOUD_NAME", None),
                ("PORT", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.mongodb.url(), "mongodb://localhost:27017/shop");
                assert_eq!(config.server.port, 5000);
                assert!(config.cloudinary.is_none());
                assert_eq!(config.app.name, "products_api");
            },
        );
    }

    #[test]
    fn test_config_with_cloudinary() {
        temp_env::with_vars(
            [
                ("MONGO_URI", Some("mongodb://localhost:27017")),
                ("CLOUDINARY_CLOUD_NAME", Some("demo")),
                ("CLOUDINARY_API_KEY", Some("key")),
                ("CLOUDINARY_API_SECRET", Some("secret")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.cloudinary.unwrap().cloud_name, "demo");
            },
        );
    }

    #[test]
    fn test_config_partial_cloudinary_is_an_error() {
        temp_env::with_vars(
            [
                ("MONGO_URI", Some("mongodb://localhost:27017")),
                ("CLOUDINARY_CLOUD_NAME", Some("demo")),
                ("CLOUDINARY_API_KEY", None),
            ],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }

    #[test]
    fn test_config_requires_mongo_url() {
        temp_env::with_vars_unset(["MONGODB_URL", "MONGO_URL", "MONGO_URI"], || {
            assert!(Config::from_env().is_err());
        });
    }
}
