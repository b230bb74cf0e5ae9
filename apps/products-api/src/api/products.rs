//! Products API routes

use axum::Router;
use domain_products::{handlers, MongoProductRepository, ProductService};

use crate::state::AppState;

/// Create products router
pub fn router(state: &AppState) -> Router {
    let repository = MongoProductRepository::new(&state.db);
    let service = ProductService::new(repository, state.assets.clone());
    handlers::router(service)
}

/// Install the products schema validator and indexes
pub async fn init_collection(state: &AppState) -> eyre::Result<()> {
    let repository = MongoProductRepository::new(&state.db);
    repository.init_schema().await?;
    repository.init_indexes().await?;
    Ok(())
}
