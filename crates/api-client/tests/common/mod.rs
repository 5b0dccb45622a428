#![allow(dead_code)]

use axum::Router;
use cv_api_client::{ApiClient, ClientConfig, RetryPolicy};
use cv_state::LogStore;
use std::time::Duration;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_backend(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Serve `router` on every interface; returns the port
pub async fn spawn_backend_on_all_interfaces(router: Router) -> u16 {
    let listener = TcpListener::bind("0.0.0.0:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    port
}

/// A port nothing listens on
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("0.0.0.0:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Base URL of a port nothing listens on
pub async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Config pointing at `base_url` with discovery off and short retry delays
pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig::new()
        .with_api_url(base_url)
        .with_discovery(false)
        .with_retry(RetryPolicy::new(2, Duration::from_millis(10)))
}

pub fn test_client(base_url: &str) -> (ApiClient, LogStore) {
    let logs = LogStore::new();
    let client = ApiClient::new(test_config(base_url), logs.clone()).unwrap();
    (client, logs)
}
