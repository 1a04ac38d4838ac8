use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use discos_api::{AppState, config::DEFAULT_PORT, router};
use discos_application::{DiscoRepository, DiscoService};
use discos_infrastructure::{InMemoryDiscoRepository, SqliteDiscoRepository};
use http_body_util::BodyExt;
use rstest::rstest;
use serde_json::{Value, json};
use tower::ServiceExt;

#[derive(Debug, Clone, Copy)]
enum Backend {
    Memory,
    Sqlite,
}

fn repository(backend: Backend) -> Arc<dyn DiscoRepository> {
    match backend {
        Backend::Memory => Arc::new(InMemoryDiscoRepository::new()),
        Backend::Sqlite => Arc::new(SqliteDiscoRepository::in_memory().expect("sqlite store")),
    }
}

fn app(backend: Backend) -> Router {
    router(AppState::new(repository(backend), DEFAULT_PORT))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, created) = send(app, "POST", "/discos", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {created}");
    created
}

fn id_of(disco: &Value) -> String {
    disco["id"].as_str().expect("string id").to_string()
}

/// An id that is well formed for the backend but no longer resolves.
async fn deleted_id(app: &Router) -> String {
    let disco = create(app, json!({"name": "Ghost", "quantity": 1})).await;
    let id = id_of(&disco);
    let (status, _) = send(app, "DELETE", &format!("/discos/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    id
}

#[rstest]
#[tokio::test]
async fn list_starts_empty(#[values(Backend::Memory, Backend::Sqlite)] backend: Backend) {
    let app = app(backend);
    let (status, body) = send(&app, "GET", "/discos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[rstest]
#[tokio::test]
async fn abbey_road_lifecycle(#[values(Backend::Memory, Backend::Sqlite)] backend: Backend) {
    let app = app(backend);

    let created = create(&app, json!({"name": "Abbey Road", "quantity": 17})).await;
    assert_eq!(created["name"], "Abbey Road");
    assert_eq!(created["quantity"], 17);
    let id = id_of(&created);
    let uri = format!("/discos/{id}");

    let (status, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, patched) = send(&app, "PATCH", &uri, Some(json!({"quantity": 18}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched, json!({"id": id, "name": "Abbey Road", "quantity": 18}));

    let (status, deleted) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!({"message": "Deleted Disco"}));

    let (status, missing) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing, json!({"message": "Cannot find disco"}));

    let (_, list) = send(&app, "GET", "/discos", None).await;
    assert_eq!(list, json!([]));
}

#[rstest]
#[tokio::test]
async fn create_with_missing_field_is_rejected(
    #[values(Backend::Memory, Backend::Sqlite)] backend: Backend,
) {
    let app = app(backend);
    let (status, body) = send(&app, "POST", "/discos", Some(json!({"name": "Help!"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"].as_str().unwrap().contains("quantity"),
        "unexpected message: {body}"
    );

    let (_, list) = send(&app, "GET", "/discos", None).await;
    assert_eq!(list, json!([]));
}

#[rstest]
#[tokio::test]
async fn create_with_wrong_type_is_rejected(
    #[values(Backend::Memory, Backend::Sqlite)] backend: Backend,
) {
    let app = app(backend);
    let (status, body) = send(
        &app,
        "POST",
        "/discos",
        Some(json!({"name": "Help!", "quantity": "fourteen"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("quantity"));
}

#[rstest]
#[tokio::test]
async fn create_ignores_client_id_and_unknown_fields(
    #[values(Backend::Memory, Backend::Sqlite)] backend: Backend,
) {
    let app = app(backend);
    let created = create(
        &app,
        json!({"id": "forged", "name": "Revolver", "quantity": 14, "discoTime": "35:01"}),
    )
    .await;
    assert_ne!(created["id"], "forged");
    assert!(created.get("discoTime").is_none());
}

#[rstest]
#[tokio::test]
async fn malformed_bodies_are_client_errors(
    #[values(Backend::Memory, Backend::Sqlite)] backend: Backend,
) {
    let app = app(backend);

    let request = Request::builder()
        .method("POST")
        .uri("/discos")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/discos", Some(json!(["Abbey Road", 17]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/discos")
        .body(Body::from(r#"{"name":"Abbey Road","quantity":17}"#))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test]
async fn patch_only_touches_present_fields(
    #[values(Backend::Memory, Backend::Sqlite)] backend: Backend,
) {
    let app = app(backend);
    let created = create(&app, json!({"name": "Let It Be", "quantity": 12})).await;
    let uri = format!("/discos/{}", id_of(&created));

    let (status, renamed) = send(
        &app,
        "PATCH",
        &uri,
        Some(json!({"name": "Let It Be... Naked"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Let It Be... Naked");
    assert_eq!(renamed["quantity"], 12);

    // null and unknown fields are a no-op
    let (status, unchanged) = send(
        &app,
        "PATCH",
        &uri,
        Some(json!({"name": null, "colour": "white"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged, renamed);

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({"quantity": 1.5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(fetched, renamed);
}

#[rstest]
#[tokio::test]
async fn put_replaces_the_whole_record(
    #[values(Backend::Memory, Backend::Sqlite)] backend: Backend,
) {
    let app = app(backend);
    let created = create(&app, json!({"name": "Help!", "quantity": 14})).await;
    let id = id_of(&created);
    let uri = format!("/discos/{id}");

    let (status, replaced) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({"name": "Rubber Soul", "quantity": 14})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced, json!({"id": id, "name": "Rubber Soul", "quantity": 14}));

    let (status, _) = send(&app, "PUT", &uri, Some(json!({"name": "Partial"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(fetched, replaced);
}

#[rstest]
#[tokio::test]
async fn unknown_ids_are_not_found(#[values(Backend::Memory, Backend::Sqlite)] backend: Backend) {
    let app = app(backend);
    let uri = format!("/discos/{}", deleted_id(&app).await);
    let full = json!({"name": "Abbey Road", "quantity": 17});

    for (method, body) in [
        ("GET", None),
        ("PUT", Some(full.clone())),
        ("PATCH", Some(json!({"quantity": 18}))),
        ("DELETE", None),
    ] {
        let (status, message) = send(&app, method, &uri, body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(message, json!({"message": "Cannot find disco"}));
    }

    // The PUT above must not have created anything.
    let (_, list) = send(&app, "GET", "/discos", None).await;
    assert_eq!(list, json!([]));
}

#[rstest]
#[tokio::test]
async fn malformed_ids_are_server_errors(
    #[values(Backend::Memory, Backend::Sqlite)] backend: Backend,
) {
    let app = app(backend);
    let (status, body) = send(&app, "GET", "/discos/not-an-id", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("not-an-id"));
}

#[rstest]
#[tokio::test]
async fn patches_from_stale_lookups_both_survive(
    #[values(Backend::Memory, Backend::Sqlite)] backend: Backend,
) {
    let service = DiscoService::new(repository(backend));
    let body = json!({"name": "Abbey Road", "quantity": 17});
    let created = service
        .create_disco(body.as_object().expect("object"))
        .await
        .expect("create");

    // Both requests resolved the record before either wrote.
    let first = service.find_disco(created.id().as_str()).await.expect("find");
    let second = service.find_disco(created.id().as_str()).await.expect("find");

    let rename = json!({"name": "Let It Be"});
    service
        .update_disco(&first, rename.as_object().expect("object"))
        .await
        .expect("rename");
    let requantify = json!({"quantity": 18});
    service
        .update_disco(&second, requantify.as_object().expect("object"))
        .await
        .expect("requantify");

    let stored = service.find_disco(created.id().as_str()).await.expect("find");
    assert_eq!(stored.name(), "Let It Be");
    assert_eq!(stored.quantity(), 18);
}

#[rstest]
#[tokio::test]
async fn quantities_beyond_i64_are_rejected(
    #[values(Backend::Memory, Backend::Sqlite)] backend: Backend,
) {
    let app = app(backend);
    let request = Request::builder()
        .method("POST")
        .uri("/discos")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"X","quantity":9223372036854775808}"#))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (_, list) = send(&app, "GET", "/discos", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn memory_ids_have_one_spelling() {
    let app = app(Backend::Memory);
    create(&app, json!({"name": "Help!", "quantity": 14})).await;

    for alias in ["/discos/01", "/discos/+1", "/discos/001"] {
        let (status, body) = send(&app, "GET", alias, None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{alias}");
        assert!(body["message"].as_str().unwrap().contains("Malformed"));
    }
    let (status, _) = send(&app, "GET", "/discos/1", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[rstest]
#[tokio::test]
async fn framework_errors_have_json_bodies(
    #[values(Backend::Memory, Backend::Sqlite)] backend: Backend,
) {
    let app = app(backend);

    let (status, body) = send(&app, "GET", "/discos/%FF", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "unexpected body: {body}");

    let (status, body) = send(&app, "GET", "/records", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Route not found"}));

    let (status, body) = send(&app, "DELETE", "/discos", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"message": "Method Not Allowed"}));

    let request = Request::builder()
        .method("POST")
        .uri("/discos")
        .header(CONTENT_TYPE, "text/plain")
        .body(Body::from("Abbey Road"))
        .expect("request");
    let (status, body) = {
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        (status, serde_json::from_slice::<Value>(&bytes).expect("json body"))
    };
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn browsers_get_swagger_ui_at_api_docs() {
    let app = app(Backend::Memory);
    let request = Request::builder()
        .uri("/api-docs")
        .header("accept", "text/html,application/xhtml+xml")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"), "{content_type}");
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    assert!(String::from_utf8_lossy(&bytes).contains("swagger-ui"));

    let (status, spec) = send(&app, "GET", "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(spec.pointer("/info/title"), Some(&json!("Discos CRUD API")));
}

#[tokio::test]
async fn memory_ids_survive_deletes() {
    let app = app(Backend::Memory);
    let first = create(&app, json!({"name": "Please Please Me", "quantity": 14})).await;
    let second = create(&app, json!({"name": "With the Beatles", "quantity": 14})).await;
    assert_eq!(first["id"], "1");
    assert_eq!(second["id"], "2");

    let (status, _) = send(&app, "DELETE", "/discos/1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, fetched) = send(&app, "GET", "/discos/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, second);

    let third = create(&app, json!({"name": "A Hard Day's Night", "quantity": 13})).await;
    assert_eq!(third["id"], "3");

    let (_, list) = send(&app, "GET", "/discos", None).await;
    assert_eq!(list, json!([second, third]));
}

#[tokio::test]
async fn api_docs_describe_the_surface() {
    let app = app(Backend::Memory);
    let (status, spec) = send(&app, "GET", "/api-docs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(spec.pointer("/paths/~1discos").is_some());
    assert!(spec.pointer("/paths/~1discos~1{id}/patch").is_some());
    assert_eq!(spec.pointer("/info/title"), Some(&json!("Discos CRUD API")));
}

#[tokio::test]
async fn health_check_responds_ok() {
    let app = app(Backend::Memory);
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}
