use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::models::config::{Endpoint, Target, METRICS_PATH};
use crate::models::film_request::FilmRequest;

// status bodies can be whole error pages
const MAX_ERROR_BODY: usize = 256;

/// The three calls the load driver makes against a server under test.
///
/// Implementations report every failure as a `ClientError` value and never
/// panic.
#[async_trait]
pub trait LoadClient: Send + Sync {
    /// GET /api/planets
    async fn fetch_resource(&self, target: &str) -> ClientResult<Value>;

    /// PUT /api/film
    async fn create_resource(&self, target: &str, film: &FilmRequest) -> ClientResult<Value>;

    /// GET /api/metrics
    async fn fetch_runtime_metrics(&self, host: &str, port: u16) -> ClientResult<Map<String, Value>>;
}

/// reqwest-backed facade. Holds one connection pool for its whole lifetime;
/// the pool goes away in `close` or on drop, whichever comes first.
pub struct HttpClient {
    client: Client,
    targets: Vec<Target>,
}

fn user_agent() -> String {
    let info = os_info::get();
    format!(
        "{} {} ({}; {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        info.os_type(),
        info.version()
    )
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if !status.is_success() {
        let body: String = String::from_utf8_lossy(&bytes)
            .chars()
            .take(MAX_ERROR_BODY)
            .collect();
        return Err(ClientError::Status { status, body });
    }
    Ok(serde_json::from_slice(&bytes)?)
}

impl HttpClient {
    pub fn new(targets: Vec<Target>, timeout: Duration) -> anyhow::Result<Self> {
        let mut builder = Client::builder().user_agent(user_agent());
        // zero means no timeout
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build http client")?;
        Ok(HttpClient { client, targets })
    }

    fn resolve(&self, target: &str) -> ClientResult<&Target> {
        self.targets
            .iter()
            .find(|t| t.name == target)
            .ok_or_else(|| ClientError::UnknownTarget(target.to_string()))
    }

    fn url(&self, target: &str, endpoint: Endpoint) -> ClientResult<String> {
        let target = self.resolve(target)?;
        Ok(format!("{}{}", target.base_url(), endpoint.path()))
    }

    /// Releases the connection pool.
    pub fn close(self) {
        debug!(targets = self.targets.len(), "closing http client");
        drop(self.client);
    }
}

#[async_trait]
impl LoadClient for HttpClient {
    async fn fetch_resource(&self, target: &str) -> ClientResult<Value> {
        let url = self.url(target, Endpoint::Planets)?;
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    async fn create_resource(&self, target: &str, film: &FilmRequest) -> ClientResult<Value> {
        let url = self.url(target, Endpoint::Film)?;
        let response = self.client.put(url).json(film).send().await?;
        read_json(response).await
    }

    async fn fetch_runtime_metrics(&self, host: &str, port: u16) -> ClientResult<Map<String, Value>> {
        let url = format!("http://{}:{}{}", host, port, METRICS_PATH);
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::http::StatusCode;
    use axum::routing::{get, put};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn healthy_server() -> SocketAddr {
        let app = Router::new()
            .route("/api/planets", get(|| async { Json(json!({"count": 60, "results": []})) }))
            .route(
                "/api/film",
                put(|Json(body): Json<Value>| async move {
                    Json(json!({"id": "f-1", "title": body["title"]}))
                }),
            )
            .route(
                "/api/metrics",
                get(|| async {
                    Json(json!({
                        "rps": 0, "avg_latency_ms": 0, "p95_latency_ms": 0, "memory_mb": 12,
                        "cpu_percent": 1.5, "threads": 17, "total_requests": 0, "elapsed_seconds": 3
                    }))
                }),
            );
        serve(app).await
    }

    fn client_for(addr: SocketAddr) -> HttpClient {
        let targets = vec![Target::new("netty", addr.ip().to_string(), addr.port())];
        HttpClient::new(targets, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_three_operations() {
        let addr = healthy_server().await;
        let client = client_for(addr);

        let planets = client.fetch_resource("netty").await.unwrap();
        assert_eq!(planets["count"], 60);

        let film = FilmRequest::random();
        let created = client.create_resource("netty", &film).await.unwrap();
        assert_eq!(created["id"], "f-1");
        assert_eq!(created["title"], film.title.as_str());

        let metrics = client
            .fetch_runtime_metrics(&addr.ip().to_string(), addr.port())
            .await
            .unwrap();
        assert_eq!(metrics.get("threads").and_then(Value::as_u64), Some(17));
        client.close();
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let addr = healthy_server().await;
        let client = client_for(addr);
        let err = client.fetch_resource("undertow").await.unwrap_err();
        assert!(matches!(err, ClientError::UnknownTarget(name) if name == "undertow"));
    }

    #[tokio::test]
    async fn test_non_2xx_is_status_error() {
        let app = Router::new().route(
            "/api/planets",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
        );
        let client = client_for(serve(app).await);
        match client.fetch_resource("netty").await {
            Err(ClientError::Status { status, body }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_json_is_deserialization_error() {
        let app = Router::new().route("/api/planets", get(|| async { "definitely not json" }));
        let client = client_for(serve(app).await);
        let err = client.fetch_resource("netty").await.unwrap_err();
        assert!(matches!(err, ClientError::Deserialization(_)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(addr);
        let err = client.fetch_resource("netty").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
