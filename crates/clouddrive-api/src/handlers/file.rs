//! File record handlers.
//!
//! Content transfer happens elsewhere; these endpoints manage the tree
//! entries that describe files.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use clouddrive_core::types::id::ResourceId;
use clouddrive_entity::resource::{Resource, ResourceKind};
use clouddrive_service::{NewFile, ResourceView};

use crate::dto::request::{InitFileRequest, UpdateResourceRequest};
use crate::dto::response::{AffectedResponse, ApiResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, Caller};
use crate::handlers::{expect_kind, update_resource};
use crate::state::AppState;

/// POST /api/files/init
pub async fn init_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<InitFileRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Resource>>)> {
    let file = state
        .services
        .resources
        .create_file(
            &auth,
            NewFile {
                name: req.name,
                folder_id: req.folder_id.map(ResourceId::from_uuid),
                size_bytes: req.size_bytes,
                mime_type: req.mime_type,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(file))))
}

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
) -> ApiResult<Json<ApiResponse<ResourceView>>> {
    let view = state.services.resources.get(&caller, id).await?;
    expect_kind(&view.resource, ResourceKind::File)?;
    Ok(Json(ApiResponse::ok(view)))
}

/// PATCH /api/files/{id}
pub async fn update_file(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
    Json(req): Json<UpdateResourceRequest>,
) -> ApiResult<Json<ApiResponse<Resource>>> {
    let file = update_resource(&state, &caller, id, ResourceKind::File, req).await?;
    Ok(Json(ApiResponse::ok(file)))
}

/// DELETE /api/files/{id}
///
/// Moves the item (file or folder) and its subtree to the trash.
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ResourceId>,
) -> ApiResult<Json<ApiResponse<AffectedResponse>>> {
    let marked = state.services.trash.soft_delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(AffectedResponse {
        affected: marked.len() as u64,
    })))
}
