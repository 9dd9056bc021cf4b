use crate::config::Config;
use crate::error::ServiceError;
use crate::preprocessing::{Pipeline, PipelineParameters, PreprocessingResult};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use image::{ImageFormat, RgbImage};
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            pipeline: Pipeline::new(),
            config: Arc::new(config),
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub max_file_size_bytes: usize,
    pub output_format: String,
    pub parameters: PipelineParameters,
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/preprocess", post(handle_preprocess))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let app = build_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle preprocessing requests
async fn handle_preprocess(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ServiceError> {
    let start = Instant::now();

    let mut file_data: Option<Bytes> = None;

    // Parse multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        if field.name() == Some("file") {
            file_data = Some(field.bytes().await.map_err(|e| {
                ServiceError::InvalidRequest(format!("Failed to read file data: {}", e))
            })?);
        }
    }

    // Validate file was provided
    let data = file_data.ok_or(ServiceError::MissingFile)?;

    // Check file size
    if data.len() > state.config.max_file_size {
        return Err(ServiceError::ImageTooLarge {
            size: data.len(),
            max: state.config.max_file_size,
        });
    }

    // The pipeline is CPU-bound; keep it off the async workers
    let pipeline = state.pipeline;
    let (result, png) = tokio::task::spawn_blocking(move || -> Result<_, ServiceError> {
        let result = pipeline.process(&data)?;
        let png = encode_png(&result.image)?;
        Ok((result, png))
    })
    .await
    .map_err(|e| ServiceError::Internal(format!("Preprocessing task failed: {}", e)))??;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Preprocessed {} -> {} in {}ms ({})",
        format_dimensions(result.original_dimensions),
        format_dimensions(result.output_dimensions),
        processing_time_ms,
        step_summary(&result)
    );

    let headers = [
        ("content-type", "image/png".to_string()),
        ("x-processing-time-ms", processing_time_ms.to_string()),
        (
            "x-original-dimensions",
            format_dimensions(result.original_dimensions),
        ),
        (
            "x-output-dimensions",
            format_dimensions(result.output_dimensions),
        ),
    ];

    Ok((headers, png).into_response())
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        max_file_size_bytes: state.config.max_file_size,
        output_format: "image/png".to_string(),
        parameters: state.pipeline.parameters(),
    })
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ServiceError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| ServiceError::Internal(format!("Failed to encode PNG: {}", e)))?;
    Ok(buffer.into_inner())
}

fn format_dimensions((width, height): (u32, u32)) -> String {
    format!("{}x{}", width, height)
}

fn step_summary(result: &PreprocessingResult) -> String {
    result
        .steps
        .iter()
        .map(|step| format!("{}={}ms", step.name, step.time_ms))
        .collect::<Vec<_>>()
        .join(", ")
}
