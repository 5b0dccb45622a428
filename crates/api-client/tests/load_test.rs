mod common;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use common::{closed_port, spawn_backend, test_client};
use cv_types::LogStatus;
use serde_json::json;
use std::collections::HashMap;

#[tokio::test]
async fn test_missing_scenes_are_empty_and_logged_as_success() {
    let router = Router::new().route("/load-scenes", get(|| async { StatusCode::NOT_FOUND }));
    let (client, logs) = test_client(&spawn_backend(router).await);

    let scenes = client.load_scenes("/data/work", "harbor").await;

    assert!(scenes.is_empty());
    let entry = &logs.entries()[0];
    assert_eq!(entry.endpoint, "/load-scenes");
    assert_eq!(entry.method, "GET");
    assert_eq!(entry.status, LogStatus::Success);
    assert_eq!(entry.message.as_deref(), Some("No scenes found"));
}

#[tokio::test]
async fn test_server_failure_is_empty_and_logged_as_error() {
    let router = Router::new().route(
        "/load-cuts",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let (client, logs) = test_client(&spawn_backend(router).await);

    assert!(client.load_cuts("/w", "s").await.is_empty());
    let entry = &logs.entries()[0];
    assert_eq!(entry.status, LogStatus::Error);
    assert_eq!(entry.error.as_deref(), Some("HTTP error! status: 500"));
}

#[tokio::test]
async fn test_unreachable_backend_yields_defaults() {
    let (client, logs) = test_client(&closed_port().await);

    assert!(client.load_entity_list("/w", "s").await.is_empty());
    assert_eq!(client.load_synopsis_text("/w", "s").await, "");
    let story = client.load_story_text("/w", "s").await;
    assert_eq!(story.text, "");
    assert_eq!(story.source, "none");
    assert!(client.list_projects("/w").await.is_empty());

    assert_eq!(logs.len(), 4);
    assert!(logs.entries().iter().all(|e| e.status == LogStatus::Error));
}

async fn echo_entities(Query(query): Query<HashMap<String, String>>) -> Response {
    if query.get("work_dir").map(String::as_str) != Some("/data/my work")
        || query.get("entity_set_name").map(String::as_str) != Some("harbor & sea")
    {
        return StatusCode::BAD_REQUEST.into_response();
    }
    Json(json!({
        "entity_list": [
            ["character", "Mara", "Keeper of the northern light", "entities/mara.png"],
            ["location", "Lighthouse", "White tower on a cliff", null]
        ]
    }))
    .into_response()
}

#[tokio::test]
async fn test_load_entity_list_sends_encoded_query() {
    let router = Router::new().route("/load-entity-list", get(echo_entities));
    let (client, logs) = test_client(&spawn_backend(router).await);

    let entities = client.load_entity_list("/data/my work", "harbor & sea").await;

    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0].name(), "Mara");
    assert_eq!(entities[1].image_path(), None);
    assert_eq!(
        logs.entries()[0].message.as_deref(),
        Some("Entity list loaded successfully")
    );
}

#[tokio::test]
async fn test_listing_payloads() {
    let router = Router::new()
        .route(
            "/load-story-text",
            get(|| async { Json(json!({"text": "Once there was a lamp", "source": "story.txt"})) }),
        )
        .route(
            "/load-synopsis-text",
            get(|| async { Json(json!({"text": null})) }),
        )
        .route(
            "/list-projects",
            get(|| async { Json(json!({"projects": ["harbor", "desert"]})) }),
        )
        .route(
            "/load-cut-images",
            get(|| async {
                Json(json!({"images": [
                    {"scene_num": 1, "cut_num": 2, "filename": "S0001-C0002.png", "path": "cut_images/S0001-C0002.png"}
                ]}))
            }),
        )
        .route("/load-cut-videos", get(|| async { Json(json!({})) }));
    let (client, _logs) = test_client(&spawn_backend(router).await);

    let story = client.load_story_text("/w", "s").await;
    assert_eq!(story.text, "Once there was a lamp");
    assert_eq!(story.source, "story.txt");

    assert_eq!(client.load_synopsis_text("/w", "s").await, "");
    assert_eq!(client.list_projects("/w").await, vec!["harbor", "desert"]);

    let images = client.load_cut_images("/w", "s").await;
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].cut_num, 2);

    assert!(client.load_cut_videos("/w", "s").await.is_empty());
}

#[tokio::test]
async fn test_health_check() {
    let router = Router::new().route("/health", get(|| async { Json(json!({"status": "ok"})) }));
    let (client, _) = test_client(&spawn_backend(router).await);
    assert!(client.check_health().await);

    let router = Router::new().route("/health", get(|| async { StatusCode::BAD_GATEWAY }));
    let (client, _) = test_client(&spawn_backend(router).await);
    assert!(!client.check_health().await);

    let (client, logs) = test_client(&closed_port().await);
    assert!(!client.check_health().await);
    // health checks are not part of the ledger
    assert!(logs.is_empty());
}
