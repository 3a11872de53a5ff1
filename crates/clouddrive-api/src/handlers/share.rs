//! Direct grant and link share handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use clouddrive_core::types::id::{GrantId, LinkShareId, ResourceId, UserId};
use clouddrive_entity::permission::Action;
use clouddrive_entity::resource::ResourceKind;
use clouddrive_entity::share::Grant;
use clouddrive_service::NewLink;

use crate::dto::request::{
    CreateGrantRequest, CreateLinkRequest, ResolveLinkQuery, UpdateGrantRequest,
};
use crate::dto::response::{
    AccessEntry, ApiResponse, LinkResponse, ResolvedLinkResponse, SharesResponse,
};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, Caller};
use crate::handlers::expect_kind;
use crate::state::AppState;

/// POST /api/shares
pub async fn create_grant(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateGrantRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Grant>>)> {
    let resource_id = ResourceId::from_uuid(req.resource_id);
    let view = state.services.resources.get(&auth, resource_id).await?;
    expect_kind(&view.resource, req.resource_type)?;

    let grant = state
        .services
        .grants
        .grant(
            &auth,
            resource_id,
            UserId::from_uuid(req.grantee_user_id),
            req.role,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(grant))))
}

/// GET /api/shares/{type}/{id}
///
/// Owner row first, then direct grants. Links are included only for callers
/// allowed to share the resource.
pub async fn list_shares(
    State(state): State<AppState>,
    caller: Caller,
    Path((kind, id)): Path<(ResourceKind, ResourceId)>,
) -> ApiResult<Json<ApiResponse<SharesResponse>>> {
    let services = &state.services;
    let view = services.resources.get(&caller, id).await?;
    expect_kind(&view.resource, kind)?;

    let mut entries = vec![AccessEntry::owner(&view.resource)];
    entries.extend(
        services
            .grants
            .list_for_resource(&caller, id)
            .await?
            .into_iter()
            .map(AccessEntry::from),
    );

    let links = if services.access.decide(&caller, id, Action::Grant).await?.is_allowed() {
        services
            .links
            .list_for_resource(&caller, id)
            .await?
            .into_iter()
            .map(LinkResponse::from)
            .collect()
    } else {
        Vec::new()
    };

    Ok(Json(ApiResponse::ok(SharesResponse {
        resource_id: id,
        entries,
        links,
    })))
}

/// PATCH /api/shares/{id}
pub async fn update_grant(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<GrantId>,
    Json(req): Json<UpdateGrantRequest>,
) -> ApiResult<Json<ApiResponse<Grant>>> {
    let grant = state
        .services
        .grants
        .change_role_by_id(&auth, id, req.role)
        .await?;
    Ok(Json(ApiResponse::ok(grant)))
}

/// DELETE /api/shares/{id}
pub async fn revoke_grant(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<GrantId>,
) -> ApiResult<StatusCode> {
    state.services.grants.revoke_by_id(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/shares/links
pub async fn create_link(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateLinkRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<LinkResponse>>)> {
    let resource_id = ResourceId::from_uuid(req.resource_id);
    let view = state.services.resources.get(&auth, resource_id).await?;
    expect_kind(&view.resource, req.resource_type)?;

    let link = state
        .services
        .links
        .create(
            &auth,
            NewLink {
                resource_id,
                role: req.role,
                expires_at: req.expires_at,
                password: req.password,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(LinkResponse::from(link))),
    ))
}

/// GET /api/shares/links/{token}?password=...
pub async fn resolve_link(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(query): Query<ResolveLinkQuery>,
) -> ApiResult<Json<ApiResponse<ResolvedLinkResponse>>> {
    let resolved = state
        .services
        .links
        .resolve(&token, query.password.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok(ResolvedLinkResponse {
        role: resolved.link.role,
        expires_at: resolved.link.expires_at,
        resource: resolved.resource,
    })))
}

/// DELETE /api/shares/links/{id}
pub async fn revoke_link(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<LinkShareId>,
) -> ApiResult<Json<ApiResponse<LinkResponse>>> {
    let link = state.services.links.revoke(&auth, id).await?;
    Ok(Json(ApiResponse::ok(LinkResponse::from(link))))
}
