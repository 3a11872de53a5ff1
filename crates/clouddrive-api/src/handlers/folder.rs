//! Folder CRUD and tree handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use clouddrive_core::types::id::ResourceId;
use clouddrive_entity::resource::{Resource, ResourceKind};
use clouddrive_service::ResourceView;

use crate::dto::request::{CreateFolderRequest, UpdateResourceRequest};
use crate::dto::response::{AffectedResponse, ApiResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, Caller};
use crate::handlers::{expect_kind, update_resource};
use crate::state::AppState;

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFolderRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Resource>>)> {
    let folder = state
        .services
        .resources
        .create_folder(&auth, &req.name, req.parent_id.map(ResourceId::from_uuid))
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(folder))))
}

/// GET /api/folders/root
pub async fn list_root(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<Resource>>>> {
    let items = state.services.resources.list_roots(&auth).await?;
    Ok(Json(ApiResponse::ok(items)))
}

/// GET /api/folders/{id}
pub async fn get_folder(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
) -> ApiResult<Json<ApiResponse<ResourceView>>> {
    let view = state.services.resources.get(&caller, id).await?;
    expect_kind(&view.resource, ResourceKind::Folder)?;
    Ok(Json(ApiResponse::ok(view)))
}

/// GET /api/folders/{id}/children
pub async fn list_children(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
) -> ApiResult<Json<ApiResponse<Vec<Resource>>>> {
    let children = state.services.resources.list_children(&caller, id).await?;
    Ok(Json(ApiResponse::ok(children)))
}

/// GET /api/folders/{id}/breadcrumb
pub async fn breadcrumb(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
) -> ApiResult<Json<ApiResponse<Vec<Resource>>>> {
    let trail = state.services.resources.breadcrumb(&caller, id).await?;
    Ok(Json(ApiResponse::ok(trail)))
}

/// PATCH /api/folders/{id}
pub async fn update_folder(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ResourceId>,
    Json(req): Json<UpdateResourceRequest>,
) -> ApiResult<Json<ApiResponse<Resource>>> {
    let folder = update_resource(&state, &caller, id, ResourceKind::Folder, req).await?;
    Ok(Json(ApiResponse::ok(folder)))
}

/// DELETE /api/folders/{id}
pub async fn delete_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ResourceId>,
) -> ApiResult<Json<ApiResponse<AffectedResponse>>> {
    let marked = state.services.trash.soft_delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(AffectedResponse {
        affected: marked.len() as u64,
    })))
}
