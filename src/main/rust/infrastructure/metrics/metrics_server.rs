use std::convert::Infallible;

use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use super::PrometheusReporter;
use crate::application::services::CoordinatorHandle;

const SERVICE: &str = "jvs-streamer";

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_id: Option<i64>,
}

impl HealthResponse {
    fn new(status: &'static str) -> Self {
        Self {
            status,
            service: SERVICE,
            version: env!("CARGO_PKG_VERSION"),
            session_state: None,
            stream_id: None,
        }
    }
}

fn with_handle(
    handle: CoordinatorHandle,
) -> impl Filter<Extract = (CoordinatorHandle,), Error = Infallible> + Clone {
    warp::any().map(move || handle.clone())
}

/// Session state and stream id, 503 once the session runtime has exited
async fn health(handle: CoordinatorHandle) -> Result<impl Reply, Infallible> {
    let (body, code) = match handle.snapshot().await {
        Ok(snapshot) => {
            let mut body = HealthResponse::new("healthy");
            body.session_state = Some(snapshot.state.to_string());
            body.stream_id = snapshot.stream_id;
            (body, StatusCode::OK)
        }
        Err(_) => (HealthResponse::new("coordinator-down"), StatusCode::SERVICE_UNAVAILABLE),
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), code))
}

async fn readiness(handle: CoordinatorHandle) -> Result<impl Reply, Infallible> {
    let (body, code) = if handle.snapshot().await.is_ok() {
        (HealthResponse::new("ready"), StatusCode::OK)
    } else {
        (HealthResponse::new("not-ready"), StatusCode::SERVICE_UNAVAILABLE)
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), code))
}

pub fn routes(
    handle: CoordinatorHandle,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let metrics_route = warp::path!("metrics").map(|| {
        warp::reply::with_header(
            PrometheusReporter::gather_metrics(),
            "content-type",
            "text/plain; version=0.0.4; charset=utf-8",
        )
    });

    let health_route = warp::path!("health")
        .and(with_handle(handle.clone()))
        .and_then(health);

    let liveness_route =
        warp::path!("livez").map(|| warp::reply::with_status("OK", StatusCode::OK));

    let readiness_route = warp::path!("readyz")
        .and(with_handle(handle))
        .and_then(readiness);

    warp::get().and(
        metrics_route
            .or(health_route)
            .or(liveness_route)
            .or(readiness_route),
    )
}

pub async fn serve_metrics(port: u16, handle: CoordinatorHandle) {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "OPTIONS"])
        .allow_headers(vec!["Content-Type"]);

    tracing::info!("Metrics server starting on port {}", port);

    warp::serve(routes(handle).with(cors))
        .run(([0, 0, 0, 0], port))
        .await;
}
