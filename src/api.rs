//! The HTTP query API.
//!
//! A small hyper server exposing the query service to the polling
//! dashboard:
//!
//! - `GET /api/latest` - latest reading per room
//! - `GET /api/stats` - rolling statistics per room
//! - `GET /api/readings?limit=N` - recent history, newest first
//! - `GET /api/alerts?limit=N` - recent threshold violations
//! - `GET /health` - liveness probe
//!
//! All state lives in memory, so every response is bounded and fast no
//! matter how busy ingestion is. A transient [`QueryError::Unavailable`]
//! becomes an explicit 503 error body - the dashboard must be able to tell
//! "something broke" apart from the empty `200 []` of "no data yet".

use std::convert::Infallible;
use std::net::SocketAddr;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::query::{QueryError, QueryService};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Address to listen on.
    pub listen_addr: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Serve the query API until shutdown is signalled.
pub async fn serve(
    queries: QueryService,
    settings: ApiSettings,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = settings.listen_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "query API listening");

    loop {
        tokio::select! {
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    debug!("query API shutting down");
                    return Ok(());
                }
            }
            accepted = listener.accept() => {
                let (stream, _) = accepted?;
                let io = TokioIo::new(stream);
                let queries = queries.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let queries = queries.clone();
                        async move { Ok::<_, Infallible>(handle_request(req, &queries)) }
                    });

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        debug!(error = %e, "connection error");
                    }
                });
            }
        }
    }
}

/// Route one request. Generic over the body type - no endpoint reads one.
fn handle_request<B>(req: Request<B>, queries: &QueryService) -> Response<Full<Bytes>> {
    if req.method() != Method::GET {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "only GET is supported");
    }

    let limit = query_limit(req.uri().query());

    match req.uri().path() {
        "/api/latest" => json_response(queries.latest()),
        "/api/stats" => json_response(queries.stats()),
        "/api/readings" => json_response(queries.recent(limit)),
        "/api/alerts" => json_response(queries.alerts(limit)),
        "/health" | "/healthz" => Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "text/plain")
            .body(Full::new(Bytes::from("OK")))
            .unwrap(),
        _ => error_response(StatusCode::NOT_FOUND, "not found"),
    }
}

/// Extract a `limit=N` query parameter, ignoring anything unparseable.
fn query_limit(query: Option<&str>) -> Option<usize> {
    query?
        .split('&')
        .find_map(|pair| pair.strip_prefix("limit="))
        .and_then(|value| value.parse().ok())
}

fn json_response<T: Serialize>(result: Result<Vec<T>, QueryError>) -> Response<Full<Bytes>> {
    match result {
        Ok(items) => match serde_json::to_vec(&items) {
            Ok(body) => Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(body)))
                .unwrap(),
            Err(e) => {
                tracing::error!(error = %e, "response serialization failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "serialization failed")
            }
        },
        Err(QueryError::Unavailable) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, "state snapshot unavailable")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Thresholds;
    use crate::ingest::Hub;
    use crate::store::Retention;
    use http_body_util::BodyExt;
    use roomsense_types::{AirStatus, ComfortStatus, Reading, Room};
    use time::macros::datetime;

    fn service_with_hub() -> (QueryService, Hub) {
        let hub = Hub::new(Thresholds::new(), Retention::default(), 128);
        (QueryService::new(&hub), hub)
    }

    fn get(path_and_query: &str) -> Request<()> {
        Request::builder()
            .method(Method::GET)
            .uri(path_and_query)
            .body(())
            .unwrap()
    }

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn reading(room: Room, temperature: f64) -> Reading {
        Reading {
            room,
            device_id: "sensor".to_string(),
            timestamp: datetime!(2024-06-01 12:00:00 UTC),
            temperature,
            humidity: 50.0,
            air_quality: 40.0,
            light_level: 300.0,
            temp_status: ComfortStatus::Normal,
            humidity_status: Some(ComfortStatus::Normal),
            air_status: AirStatus::Normal,
        }
    }

    #[tokio::test]
    async fn latest_with_no_data_is_an_empty_array_not_an_error() {
        let (queries, _hub) = service_with_hub();

        let response = handle_request(get("/api/latest"), &queries);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["Content-Type"],
            "application/json"
        );
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn latest_serves_one_entry_per_room() {
        let (queries, hub) = service_with_hub();
        hub.store.append(reading(Room::Kitchen, 24.0)).unwrap();
        hub.store.append(reading(Room::Bedroom, 18.5)).unwrap();

        let body = body_json(handle_request(get("/api/latest"), &queries)).await;
        let rooms: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["room"].as_str().unwrap())
            .collect();
        assert_eq!(rooms, vec!["kitchen", "bedroom"]);
    }

    #[tokio::test]
    async fn readings_honours_the_limit_parameter() {
        let (queries, hub) = service_with_hub();
        for i in 0..30 {
            hub.store.append(reading(Room::Kitchen, i as f64)).unwrap();
        }

        let body = body_json(handle_request(get("/api/readings?limit=5"), &queries)).await;
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 5);
        // Newest first.
        assert_eq!(items[0]["temperature"], 29.0);
    }

    #[tokio::test]
    async fn stats_serves_aggregates() {
        let (queries, hub) = service_with_hub();
        hub.stats.update(&reading(Room::Kitchen, 20.0));
        hub.stats.update(&reading(Room::Kitchen, 30.0));

        let body = body_json(handle_request(get("/api/stats"), &queries)).await;
        let entry = &body.as_array().unwrap()[0];
        assert_eq!(entry["room"], "kitchen");
        assert_eq!(entry["total_readings"], 2);
        assert_eq!(entry["avg_temp"], 25.0);
    }

    #[tokio::test]
    async fn unknown_path_is_a_json_404() {
        let (queries, _hub) = service_with_hub();

        let response = handle_request(get("/api/everything"), &queries);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "not found");
    }

    #[tokio::test]
    async fn non_get_methods_are_rejected() {
        let (queries, _hub) = service_with_hub();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/latest")
            .body(())
            .unwrap();

        let response = handle_request(request, &queries);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn health_endpoint_answers_plainly() {
        let (queries, _hub) = service_with_hub();
        let response = handle_request(get("/health"), &queries);
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn limit_parsing_is_lenient() {
        assert_eq!(query_limit(Some("limit=20")), Some(20));
        assert_eq!(query_limit(Some("foo=1&limit=9")), Some(9));
        assert_eq!(query_limit(Some("limit=banana")), None);
        assert_eq!(query_limit(Some("foo=1")), None);
        assert_eq!(query_limit(None), None);
    }
}
