use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

const DEFAULT_HISTORY_LIMIT: usize = 50;

pub fn router() -> Router {
    Router::new()
        .route("/stock/summary", get(stock_summary))
        .route("/items/:id/stock", get(get_stock))
        .route("/items/:id/transactions", get(get_history))
        .route("/items/:id/adjust", post(adjust_stock))
}

pub async fn stock_summary(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.stock().summary() {
        Ok(lines) => Json(lines).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id = match errors::parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.stock().stock_level(item_id) {
        Ok(level) => Json(dto::StockResponse {
            item_id,
            current_stock: level.on_hand,
            ledger_version: level.version,
        })
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_history(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<dto::HistoryQuery>,
) -> axum::response::Response {
    let item_id = match errors::parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    match services.stock().history(item_id, limit) {
        Ok(transactions) => Json(dto::HistoryResponse { item_id, transactions }).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustRequest>,
) -> axum::response::Response {
    let item_id = match errors::parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.stock().adjust_to(item_id, body.target, body.note) {
        Ok(transaction) => Json(dto::AdjustResponse {
            item_id,
            current_stock: body.target,
            transaction,
        })
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
