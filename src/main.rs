//! CNIC Extractor - identity-document OCR extraction server.

mod error;
mod extract;
mod ocr;
mod rules;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::Json,
    routing::{get, post},
    Router,
};
use error::ApiError;
use extract::{extract_fields, Fields};
use ocr::tesseract::TesseractEngine;
use ocr::{joined_text, OcrEngine};
use rules::{CompiledRules, ExtractionRules};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    engine: Arc<dyn OcrEngine>,
    rules: Arc<CompiledRules>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cnic_extractor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load extraction rules
    let rules = match std::env::var("RULES_PATH") {
        Ok(path) => ExtractionRules::load(Path::new(&path))?,
        Err(_) => ExtractionRules::default(),
    };
    let rules = Arc::new(CompiledRules::compile(&rules)?);
    info!("Extraction rules compiled");

    // Initialize the OCR engine once; it is shared by all requests
    let engine = TesseractEngine::from_env()?;
    info!("OCR engine initialized: {}", engine.name());

    // Build application state
    let state = AppState {
        engine: Arc::new(engine),
        rules,
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/extract", post(extract_document))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Run server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Upload a document image and extract the holder's name and CNIC.
async fn extract_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Fields>, ApiError> {
    // Read the uploaded file
    let mut filename = String::new();
    let mut content_type = String::new();
    let mut file_data = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidUpload(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().unwrap_or("document").to_string();
            content_type = field.content_type().unwrap_or("unknown").to_string();
            file_data = field
                .bytes()
                .await
                .map_err(|e| ApiError::InvalidUpload(format!("Failed to read file: {}", e)))?
                .to_vec();
            break;
        }
    }

    if file_data.is_empty() {
        return Err(ApiError::InvalidUpload("No file uploaded".to_string()));
    }

    info!(
        "Received file: {} ({}, {} bytes)",
        filename,
        content_type,
        file_data.len()
    );

    if image::guess_format(&file_data).is_err() {
        return Err(ApiError::InvalidUpload(format!(
            "Unsupported or corrupt image: {}",
            filename
        )));
    }

    // Recognize text lines and join them into the blob the extractor consumes
    let lines = state.engine.recognize(&file_data).await?;
    let text = joined_text(&lines);
    debug!("OCR text ({} lines):\n{}", lines.len(), text);

    let fields = extract_fields(&text, &state.rules);
    info!(
        "Extraction complete: name={:?} cnic={:?}",
        fields.name, fields.cnic
    );

    Ok(Json(fields))
}
