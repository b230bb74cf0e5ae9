//! Products API - product catalog REST server

use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::assets::{AssetStore, CloudinaryAssetStore, UnconfiguredAssetStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    // A missing .env file is not an error
    let dotenv = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    info!("Connecting to MongoDB at {}", config.mongodb.redacted_url());

    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
    let db = database::mongodb::resolve_database(&mongo_client, &config.mongodb);

    info!("Successfully connected to MongoDB database: {}", db.name());

    let assets: Arc<dyn AssetStore> = match config.cloudinary.clone() {
        Some(cloudinary) => {
            info!(
                cloud_name = %cloudinary.cloud_name,
                signature = ?cloudinary.signature_algorithm,
                "Image uploads go to Cloudinary"
            );
            Arc::new(CloudinaryAssetStore::new(cloudinary))
        }
        None => {
            warn!("CLOUDINARY_CLOUD_NAME not set, embedded image uploads will fail");
            Arc::new(UnconfiguredAssetStore)
        }
    };

    let state = AppState {
        config: config.clone(),
        mongo_client,
        db,
        assets,
    };

    api::init_collections(&state).await?;

    let api_routes = api::routes(&state);
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes, &state.config.server)?;
    let app = router.merge(health_router(state.config.app));

    info!(
        "Starting {} v{} on port {}",
        state.config.app.name, state.config.app.version, state.config.server.port
    );

    let server = state.config.server.clone();
    let mongo_client = state.mongo_client.clone();
    drop(state);

    create_production_app(app, &server, Duration::from_secs(30), async move {
        info!("Shutting down: closing MongoDB connections");
        mongo_client.shutdown().await;
        info!("MongoDB connection closed");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Products API shutdown complete");
    Ok(())
}
