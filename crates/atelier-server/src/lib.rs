//! Atelier Server - HTTP surface
//!
//! - `GET  /api/health`: liveness probe
//! - `POST /api/generate`: multipart `front`/`back` images in, server-sent
//!   progress events out, one JSON [`ProgressEvent`] per message
//!
//! [`ProgressEvent`]: atelier_core::ProgressEvent

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod form;
pub mod rejection;
pub mod services;
pub mod telemetry;

pub use config::{ConfigError, ServiceConfig};
pub use rejection::{handle_rejection, ApiError};
pub use services::{build_pipeline, StartupError};
pub use telemetry::{init_tracing, LogFormat};

use atelier_core::{Pipeline, ProgressStream};
use futures::StreamExt;
use serde::Serialize;
use warp::http::header::CACHE_CONTROL;
use warp::multipart::FormData;
use warp::sse::Event;
use warp::{Filter, Rejection, Reply};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
}

/// All routes with rejection recovery and CORS for `allowed_origin`
///
/// `allowed_origin` must already be validated; `*` allows any origin.
pub fn routes(
    pipeline: Pipeline,
    allowed_origin: &str,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    api(pipeline)
        .recover(handle_rejection)
        .with(cors(allowed_origin))
        .with(warp::trace::request())
}

/// Routes without CORS or recovery
pub fn api(pipeline: Pipeline) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    health().or(generate(pipeline))
}

fn health() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "health").and(warp::get()).map(|| {
        warp::reply::json(&Health {
            status: "ok",
            service: "atelier",
            version: VERSION,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    })
}

fn generate(pipeline: Pipeline) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "generate")
        .and(warp::post())
        .and(warp::body::content_length_limit(form::MAX_FORM_BYTES))
        .and(warp::multipart::form().max_length(form::MAX_FORM_BYTES))
        .and(warp::any().map(move || pipeline.clone()))
        .and_then(start_generation)
}

async fn start_generation(form: FormData, pipeline: Pipeline) -> Result<impl Reply, Rejection> {
    let request = form::read_request(form).await.map_err(warp::reject::custom)?;
    tracing::info!(
        front = request.front.is_some(),
        back = request.back.is_some(),
        "Generation requested"
    );
    Ok(event_stream(pipeline.spawn(request)))
}

/// Frame progress events as SSE `data:` messages
fn event_stream(events: ProgressStream) -> impl Reply {
    let stream = events.map(|event| Event::default().json_data(&event));
    let reply = warp::sse::reply(warp::sse::keep_alive().stream(stream));
    let reply = warp::reply::with_header(reply, CACHE_CONTROL, "no-cache");
    warp::reply::with_header(reply, "X-Accel-Buffering", "no")
}

fn cors(allowed_origin: &str) -> warp::cors::Builder {
    let cors = warp::cors()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type"]);
    if allowed_origin == "*" {
        cors.allow_any_origin()
    } else {
        cors.allow_origin(allowed_origin)
    }
}
