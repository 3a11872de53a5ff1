//! End-to-end tests driving the router over the in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use clouddrive_api::{AppState, build_router};
use clouddrive_auth::{JwtDecoder, JwtEncoder};
use clouddrive_core::config::AppConfig;
use clouddrive_core::traits::SystemClock;
use clouddrive_core::types::id::UserId;
use clouddrive_database::{MemoryStore, Stores};
use clouddrive_service::Services;

struct TestApp {
    router: Router,
    encoder: JwtEncoder,
}

impl TestApp {
    fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-secret".to_string();
        config.auth.argon2_memory_kib = 1024;
        config.auth.argon2_iterations = 1;

        let stores = Stores::from_single(Arc::new(MemoryStore::new()));
        let services = Services::build(stores, &config, Arc::new(SystemClock)).unwrap();
        let encoder = JwtEncoder::new(&config.auth);
        let decoder = Arc::new(JwtDecoder::new(&config.auth));
        let state = AppState::new(Arc::new(config), decoder, services);

        Self {
            router: build_router(state),
            encoder,
        }
    }

    fn token(&self, user: UserId) -> String {
        self.encoder.issue(user, chrono::Duration::hours(1)).unwrap()
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_folder(&self, token: &str, name: &str, parent: Option<&str>) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/folders",
                Some(token),
                &[],
                Some(json!({ "name": name, "parentId": parent })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn create_file(&self, token: &str, name: &str, folder: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/files/init",
                Some(token),
                &[],
                Some(json!({
                    "name": name,
                    "folderId": folder,
                    "sizeBytes": 1024,
                    "mimeType": "text/plain"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/health", None, &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], true);
}

#[tokio::test]
async fn test_requires_bearer() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/folders",
            None,
            &[],
            Some(json!({ "name": "Docs" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHENTICATED");

    let (status, _) = app
        .send(Method::GET, "/api/folders/root", Some("not-a-jwt"), &[], None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forbidden_looks_like_missing() {
    let app = TestApp::new();
    let owner = app.token(UserId::new());
    let stranger = app.token(UserId::new());
    let folder = app.create_folder(&owner, "Private", None).await;
    let file = app.create_file(&owner, "secret.txt", &folder).await;

    let (hidden_status, hidden) = app
        .send(Method::GET, &format!("/api/files/{file}"), Some(&stranger), &[], None)
        .await;
    let missing_id = uuid::Uuid::new_v4();
    let (missing_status, missing) = app
        .send(
            Method::GET,
            &format!("/api/files/{missing_id}"),
            Some(&stranger),
            &[],
            None,
        )
        .await;

    assert_eq!(hidden_status, StatusCode::NOT_FOUND);
    assert_eq!(hidden_status, missing_status);
    assert_eq!(hidden, missing);
}

#[tokio::test]
async fn test_closest_grant_wins() {
    let app = TestApp::new();
    let owner_id = UserId::new();
    let user_id = UserId::new();
    let owner = app.token(owner_id);
    let user = app.token(user_id);

    let folder = app.create_folder(&owner, "Team", None).await;
    let report = app.create_file(&owner, "report.txt", &folder).await;
    let notes = app.create_file(&owner, "notes.txt", &folder).await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/shares",
            Some(&owner),
            &[],
            Some(json!({
                "resourceType": "folder",
                "resourceId": folder,
                "granteeUserId": user_id,
                "role": "viewer"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(Method::GET, &format!("/api/files/{report}"), Some(&user), &[], None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "viewer");

    let rename = json!({ "name": "renamed.txt" });
    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/files/{report}"),
            Some(&user),
            &[],
            Some(rename.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/shares",
            Some(&owner),
            &[],
            Some(json!({
                "resourceType": "file",
                "resourceId": report,
                "granteeUserId": user_id,
                "role": "editor"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/files/{report}"),
            Some(&user),
            &[],
            Some(rename.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "renamed.txt");

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/files/{notes}"),
            Some(&user),
            &[],
            Some(rename),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_role_cannot_be_granted() {
    let app = TestApp::new();
    let owner = app.token(UserId::new());
    let folder = app.create_folder(&owner, "Team", None).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/shares",
            Some(&owner),
            &[],
            Some(json!({
                "resourceType": "folder",
                "resourceId": folder,
                "granteeUserId": UserId::new(),
                "role": "owner"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_shares_panel_lists_owner_first() {
    let app = TestApp::new();
    let owner_id = UserId::new();
    let owner = app.token(owner_id);
    let folder = app.create_folder(&owner, "Team", None).await;

    app.send(
        Method::POST,
        "/api/shares",
        Some(&owner),
        &[],
        Some(json!({
            "resourceType": "folder",
            "resourceId": folder,
            "granteeUserId": UserId::new(),
            "role": "editor"
        })),
    )
    .await;
    app.send(
        Method::POST,
        "/api/shares/links",
        Some(&owner),
        &[],
        Some(json!({ "resourceType": "folder", "resourceId": folder })),
    )
    .await;

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/shares/folder/{folder}"),
            Some(&owner),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["role"], "owner");
    assert_eq!(entries[0]["userId"], owner_id.to_string());
    assert_eq!(entries[1]["role"], "editor");
    assert_eq!(body["data"]["links"].as_array().unwrap().len(), 1);
    assert!(body["data"]["links"][0].get("passwordHash").is_none());

    let grant_id = entries[1]["id"].as_str().unwrap().to_string();
    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/shares/{grant_id}"),
            Some(&owner),
            &[],
            Some(json!({ "role": "viewer" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "viewer");

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/shares/{grant_id}"),
            Some(&owner),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_trash_restore_order() {
    let app = TestApp::new();
    let owner = app.token(UserId::new());
    let folder = app.create_folder(&owner, "Projects", None).await;
    let child = app.create_file(&owner, "plan.txt", &folder).await;

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/folders/{folder}"),
            Some(&owner),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["affected"], 2);

    let (status, body) = app
        .send(Method::GET, "/api/files/trash", Some(&owner), &[], None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let listing = &body["data"];
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["retentionDays"], 30);
    assert_eq!(listing["totalSizeBytes"], 1024);
    assert_eq!(listing["items"][0]["id"], folder.as_str());
    assert_eq!(listing["items"][0]["daysRemaining"], 30);
    assert_eq!(listing["items"][0]["originalLocation"], "/");
    assert!(listing["items"][0]["deletedAt"].is_string());

    let (status, _) = app
        .send(Method::GET, &format!("/api/files/{child}"), Some(&owner), &[], None)
        .await;
    assert_eq!(status, StatusCode::GONE);

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/files/{child}/restore"),
            Some(&owner),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ANCESTOR_DELETED");

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/files/{folder}/restore"),
            Some(&owner),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["deletedAt"].is_null());

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/files/{child}/restore"),
            Some(&owner),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/folders/{folder}/children"),
            Some(&owner),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_permanent_delete_and_empty_trash() {
    let app = TestApp::new();
    let owner = app.token(UserId::new());
    let a = app.create_folder(&owner, "A", None).await;
    let b = app.create_folder(&owner, "B", None).await;

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/files/{a}/permanent"),
            Some(&owner),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    for id in [&a, &b] {
        app.send(
            Method::DELETE,
            &format!("/api/folders/{id}"),
            Some(&owner),
            &[],
            None,
        )
        .await;
    }

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/files/{a}/permanent"),
            Some(&owner),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["affected"], 1);

    let (status, body) = app
        .send(Method::DELETE, "/api/files/trash", Some(&owner), &[], None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["affected"], 1);

    let (_, body) = app
        .send(Method::GET, "/api/files/trash", Some(&owner), &[], None)
        .await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_password_link_lifecycle() {
    let app = TestApp::new();
    let owner = app.token(UserId::new());
    let folder = app.create_folder(&owner, "Shared", None).await;
    let file = app.create_file(&owner, "photo.jpg", &folder).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/shares/links",
            Some(&owner),
            &[],
            Some(json!({
                "resourceType": "folder",
                "resourceId": folder,
                "role": "viewer",
                "password": "x1"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["hasPassword"], true);
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let link_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/shares/links/{token}?password=wrong"),
            None,
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "WRONG_PASSWORD");

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/shares/links/{token}?password=x1"),
            None,
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "viewer");
    assert_eq!(body["data"]["resource"]["id"], folder.as_str());

    let link_headers = [("x-share-token", token.as_str()), ("x-share-password", "x1")];
    let (status, body) = app
        .send(Method::GET, &format!("/api/files/{file}"), None, &link_headers, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "viewer");

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/files/{file}"),
            None,
            &link_headers,
            Some(json!({ "name": "nope.jpg" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/shares/links/{link_id}"),
            Some(&owner),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["revokedAt"].is_string());

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/shares/links/{token}?password=x1"),
            None,
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "LINK_UNAVAILABLE");
}

#[tokio::test]
async fn test_move_and_breadcrumb() {
    let app = TestApp::new();
    let owner = app.token(UserId::new());
    let a = app.create_folder(&owner, "A", None).await;
    let b = app.create_folder(&owner, "B", Some(&a)).await;
    let c = app.create_folder(&owner, "C", None).await;

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/folders/{a}"),
            Some(&owner),
            &[],
            Some(json!({ "parentId": b })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CYCLE_DETECTED");

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/folders/{c}"),
            Some(&owner),
            &[],
            Some(json!({ "parentId": b })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/folders/{c}/breadcrumb"),
            Some(&owner),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["A", "B", "C"]);

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/folders/{c}"),
            Some(&owner),
            &[],
            Some(json!({ "parentId": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["parentId"].is_null());

    let (_, body) = app
        .send(Method::GET, "/api/folders/root", Some(&owner), &[], None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_move_leaves_name_unchanged() {
    let app = TestApp::new();
    let owner = app.token(UserId::new());
    let a = app.create_folder(&owner, "A", None).await;
    let b = app.create_folder(&owner, "B", Some(&a)).await;

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/folders/{a}"),
            Some(&owner),
            &[],
            Some(json!({ "name": "Renamed", "parentId": b })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CYCLE_DETECTED");

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/folders/{a}"),
            Some(&owner),
            &[],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "A");
    assert!(body["data"]["parentId"].is_null());

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/folders/{b}"),
            Some(&owner),
            &[],
            Some(json!({ "name": "B2", "parentId": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "B2");
    assert!(body["data"]["parentId"].is_null());
}
