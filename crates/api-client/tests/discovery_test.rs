mod common;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use common::{closed_port, spawn_backend, spawn_backend_on_all_interfaces, unused_port};
use cv_api_client::{ApiClient, ClientConfig, StudioContext};
use cv_state::LogStore;
use serde_json::json;
use std::time::Duration;

fn discovering(base_url: &str) -> ClientConfig {
    ClientConfig::new()
        .with_api_url(base_url)
        .with_discovery_timeout(Duration::from_millis(500))
}

fn healthy() -> Router {
    Router::new().route("/health", get(|| async { Json(json!({"status": "ok"})) }))
}

fn advertising(api_url: String) -> Router {
    Router::new().route(
        "/server-info",
        get(move || {
            let api_url = api_url.clone();
            async move { Json(json!({ "api_url": api_url })) }
        }),
    )
}

#[tokio::test]
async fn test_advertised_backend_is_adopted() {
    let lan = spawn_backend(healthy()).await;
    let default = spawn_backend(advertising(lan.clone())).await;

    let client = ApiClient::new(discovering(&default), LogStore::new()).unwrap();
    client.ready().await;

    assert_eq!(client.base_url(), lan);
    assert!(client.image_url("w", "s", "a.png").starts_with(&lan));

    let info = client.debug_info();
    assert_eq!(info.base_url, default);
    assert_eq!(info.dynamic_base_url.as_deref(), Some(lan.as_str()));
    assert_eq!(info.current_url, lan);
}

#[tokio::test]
async fn test_unhealthy_advertised_backend_is_ignored() {
    let sick = spawn_backend(Router::new().route(
        "/health",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    ))
    .await;
    let default = spawn_backend(advertising(sick)).await;

    let client = ApiClient::new(discovering(&default), LogStore::new()).unwrap();
    client.ready().await;

    assert_eq!(client.base_url(), default);
    assert_eq!(client.debug_info().dynamic_base_url, None);
}

#[tokio::test]
async fn test_unreachable_default_keeps_static_url() {
    let default = closed_port().await;

    let client = ApiClient::new(discovering(&default), LogStore::new()).unwrap();
    client.ready().await;

    assert_eq!(client.base_url(), default);
}

#[tokio::test]
async fn test_page_host_backend_is_adopted() {
    let port = spawn_backend_on_all_interfaces(healthy()).await;
    let config = discovering(&closed_port().await)
        .with_page_host("0.0.0.0")
        .with_discovery_port(port);

    let client = ApiClient::new(config, LogStore::new()).unwrap();
    client.ready().await;

    let page_backend = format!("http://0.0.0.0:{}", port);
    assert_eq!(client.base_url(), page_backend);
    assert_eq!(
        client.debug_info().dynamic_base_url.as_deref(),
        Some(page_backend.as_str())
    );
}

#[tokio::test]
async fn test_failed_page_host_falls_through_to_server_info() {
    let lan = spawn_backend(healthy()).await;
    let default = spawn_backend(advertising(lan.clone())).await;
    let config = discovering(&default)
        .with_page_host("0.0.0.0")
        .with_discovery_port(unused_port().await);

    let client = ApiClient::new(config, LogStore::new()).unwrap();
    client.ready().await;

    let info = client.debug_info();
    assert_eq!(info.dynamic_base_url.as_deref(), Some(lan.as_str()));
    assert_eq!(info.page_host.as_deref(), Some("0.0.0.0"));
}

#[tokio::test]
async fn test_loopback_page_host_is_not_probed() {
    let default = spawn_backend(healthy()).await;
    let config = discovering(&default)
        .with_page_host("127.0.0.1")
        .with_discovery_port(1);

    let client = ApiClient::new(config, LogStore::new()).unwrap();
    client.ready().await;

    // server-info is missing on the default backend, so nothing changes
    assert_eq!(client.base_url(), default);
    assert_eq!(client.debug_info().page_host.as_deref(), Some("127.0.0.1"));
}

#[tokio::test]
async fn test_context_loads_project_into_ui_state() {
    let router = Router::new()
        .route(
            "/load-scenes",
            get(|| async {
                Json(json!({"scenes": [{"scene_number": 1, "description": "Storm rolls in"}]}))
            }),
        )
        .route(
            "/load-cut-videos",
            get(|| async {
                Json(json!({"videos": [
                    {"scene_num": 1, "cut_num": 1, "filename": "S0001-C0001.mp4", "path": "videos/S0001-C0001.mp4"}
                ]}))
            }),
        );
    let base_url = spawn_backend(router).await;

    let ctx = StudioContext::in_memory(common::test_config(&base_url)).unwrap();
    ctx.project
        .update(|state| cv_types::ProjectState {
            work_dir: "/w".to_string(),
            entity_set_name: "storm".to_string(),
            ..state
        })
        .unwrap();

    ctx.load_project().await;

    assert_eq!(ctx.ui.scenes.get().len(), 1);
    assert!(ctx.ui.entity_list.get().is_empty());
    assert_eq!(
        ctx.ui.cut_videos.get().get("S0001-C0001").map(String::as_str),
        Some("videos/S0001-C0001.mp4")
    );
    assert!(!ctx.ui.is_loading.get());
    // five listings, each settled
    assert_eq!(ctx.logs.len(), 5);
    assert!(ctx.logs.entries().iter().all(|e| e.status != cv_types::LogStatus::Pending));
}
