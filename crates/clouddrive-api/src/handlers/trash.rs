//! Trash page handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use clouddrive_core::types::id::ResourceId;
use clouddrive_entity::resource::Resource;
use clouddrive_service::TrashListing;

use crate::dto::response::{AffectedResponse, ApiResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// GET /api/files/trash
pub async fn list_trash(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<ApiResponse<TrashListing>>> {
    let listing = state
        .services
        .trash
        .list_trash(&auth, params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(listing)))
}

/// DELETE /api/files/trash
pub async fn empty_trash(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<AffectedResponse>>> {
    let affected = state.services.trash.empty_trash(&auth).await?;
    Ok(Json(ApiResponse::ok(AffectedResponse { affected })))
}

/// POST /api/files/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ResourceId>,
) -> ApiResult<Json<ApiResponse<Resource>>> {
    let restored = state.services.trash.restore(&auth, id).await?;
    Ok(Json(ApiResponse::ok(restored)))
}

/// DELETE /api/files/{id}/permanent
pub async fn permanent_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ResourceId>,
) -> ApiResult<Json<ApiResponse<AffectedResponse>>> {
    let purged = state.services.trash.permanent_delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(AffectedResponse {
        affected: purged.len() as u64,
    })))
}
