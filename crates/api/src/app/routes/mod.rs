use axum::Router;

pub mod assemblies;
pub mod batches;
pub mod stock;
pub mod system;

/// Router for all domain endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/assemblies", assemblies::router())
        .nest("/batches", batches::router())
        .merge(stock::router())
}
