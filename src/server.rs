use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::analysis::{run_analysis, AnalysisRequest};
use crate::db::DocumentStore;
use crate::error::AppError;
use crate::llm::LanguageModel;

type HttpBody = Full<Bytes>;

pub const LIVENESS_MESSAGE: &str = "Burnout Detector API is running!";

/// Shared handles injected into every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub llm: Arc<dyn LanguageModel>,
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<HttpBody> {
    let (status, body) = match serde_json::to_vec(value) {
        Ok(body) => (status, body),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{{\"error\":\"serialization failed: {}\"}}", e).into_bytes(),
        ),
    };
    let mut response = Response::new(Full::from(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}

fn text_response(status: StatusCode, text: &'static str) -> Response<HttpBody> {
    let mut response = Response::new(Full::from(Bytes::from_static(text.as_bytes())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn error_response(err: &AppError) -> Response<HttpBody> {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!("request failed: {}", err);
    } else {
        warn!("request rejected: {}", err);
    }
    json_response(status, &serde_json::json!({ "error": err.to_string() }))
}

fn decode_segment(segment: &str) -> Result<String, AppError> {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .map_err(|e| AppError::Validation(format!("invalid path segment: {}", e)))
}

async fn route<B>(state: &AppState, req: Request<B>) -> Result<Response<HttpBody>, AppError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (&method, segments.as_slice()) {
        (&Method::GET, [""]) => Ok(text_response(StatusCode::OK, LIVENESS_MESSAGE)),
        (&Method::GET, ["api", "ping"]) => {
            state.store.ping().await?;
            Ok(text_response(StatusCode::OK, "pong"))
        }
        (&Method::GET, ["api", "user", email]) => {
            let email = decode_segment(email)?;
            match state.store.find_user(&email).await? {
                Some(user) => Ok(json_response(StatusCode::OK, &user)),
                None => Err(AppError::NotFound("User not found".to_string())),
            }
        }
        (&Method::GET, ["api", "assignments", email]) => {
            let email = decode_segment(email)?;
            let assignments = state.store.find_assignments(&email).await?;
            Ok(json_response(StatusCode::OK, &assignments))
        }
        (&Method::POST, ["api", "burnout-analysis"]) => {
            let body = req
                .into_body()
                .collect()
                .await
                .map_err(|e| AppError::Validation(format!("unreadable body: {}", e)))?
                .to_bytes();
            let request: AnalysisRequest = serde_json::from_slice(&body)?;
            let result = run_analysis(state.store.as_ref(), state.llm.as_ref(), &request).await?;
            Ok(json_response(StatusCode::OK, &result))
        }
        _ => Err(AppError::NotFound("Not found".to_string())),
    }
}

pub async fn handle_request<B>(
    state: AppState,
    req: Request<B>,
) -> Result<Response<HttpBody>, Infallible>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match route(&state, req).await {
        Ok(response) => response,
        Err(err) => error_response(&err),
    };

    info!(%method, %path, status = response.status().as_u16(), "request handled");
    Ok(response)
}

/// Accepts connections forever; each one is served on its own task.
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("burnout-detector listening on http://{}", addr);

    loop {
        let (stream, peer) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(state.clone(), req));
            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                warn!(%peer, "connection error: {:?}", e);
            }
        });
    }
}
