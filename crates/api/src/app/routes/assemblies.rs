use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:id/revisions", post(create_revision).get(list_revisions))
        .route("/:id/revisions/:rev_no", delete(delete_revision))
        .route("/:id/revisions/:rev_no/restore", post(restore_revision))
        .route("/:id/bom", get(get_bom))
}

pub async fn create_revision(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::CreateRevisionRequest>,
) -> axum::response::Response {
    let assembly_id = match errors::parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.bom().create_revision(assembly_id, body.lines) {
        Ok(rev_no) => (
            StatusCode::CREATED,
            Json(dto::RevisionCreatedResponse { assembly_id, rev_no }),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_revisions(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let assembly_id = match errors::parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.bom().list_revisions(assembly_id) {
        Ok(revisions) => Json(dto::RevisionListResponse {
            assembly_id,
            revisions,
        })
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Current revision by default; `?rev_no=` selects a historical one.
pub async fn get_bom(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<dto::BomQuery>,
) -> axum::response::Response {
    let assembly_id = match errors::parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.bom().view(assembly_id, query.rev_no) {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_revision(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, rev_no)): Path<(String, u32)>,
) -> axum::response::Response {
    let assembly_id = match errors::parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.bom().delete_revision(assembly_id, rev_no) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn restore_revision(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, rev_no)): Path<(String, u32)>,
) -> axum::response::Response {
    let assembly_id = match errors::parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.bom().restore_revision(assembly_id, rev_no) {
        Ok(rev_no) => (
            StatusCode::CREATED,
            Json(dto::RevisionCreatedResponse { assembly_id, rev_no }),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
