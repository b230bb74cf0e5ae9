//! API routes module

pub mod health;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Create all API routes
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .nest("/products", products::router(state))
        .merge(health::router(state.clone()))
}

/// Install the collection validator and indexes
pub async fn init_collections(state: &AppState) -> eyre::Result<()> {
    products::init_collection(state).await
}
