use std::sync::Arc;

use axum::{extract::Extension, routing::post, Json, Router};

use bomledger_production::{BatchReport, BatchRequest};

use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/", post(run_batch))
}

/// Row failures are reported in the body; the request itself always succeeds.
pub async fn run_batch(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<BatchRequest>,
) -> Json<BatchReport> {
    Json(services.executor().execute(&body))
}
