//! HTTP gateway.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /api/generate` | multipart `file` + `type` → `{"latex", "type"}` |
//! | `GET /api/health` | liveness, always `{"status": "healthy"}` |
//! | `GET /api/openapi.json` | OpenAPI 3 description of the two routes above |
//! | `GET /` | plain-text banner |
//!
//! Every error leaves as `{"error": "<message>"}`; see [`ApiError`] for the
//! status mapping.

use crate::config::ServiceConfig;
use crate::content::ContentType;
use crate::error::{Img2LatexError, UploadError};
use crate::generate::LatexGenerator;
use crate::pipeline::upload::{self, StagedUpload, UploadedFile};
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Shared, read-only state handed to every handler.
pub struct AppState<G> {
    pub config: Arc<ServiceConfig>,
    pub generator: Arc<G>,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            generator: Arc::clone(&self.generator),
        }
    }
}

/// Successful body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateResponse {
    pub latex: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
}

/// Everything a handler can fail with.
///
/// | Variant | Status |
/// |---------|--------|
/// | `Upload(_)` | 400 |
/// | `Conversion(FileNotFound)` | 400, prefixed `File error: ` |
/// | `Conversion(NoLatexFound)` | 422 |
/// | `Conversion(_)` otherwise | 500, prefixed `Internal error: ` |
/// | `Rejected { status, .. }` | as given (e.g. 413 for oversize bodies) |
#[derive(Debug)]
pub enum ApiError {
    Upload(UploadError),
    Conversion(Img2LatexError),
    Rejected { status: StatusCode, message: String },
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        ApiError::Upload(e)
    }
}

impl From<Img2LatexError> for ApiError {
    fn from(e: Img2LatexError) -> Self {
        ApiError::Conversion(e)
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Upload(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Conversion(e) if e.is_client_error() => {
                (StatusCode::BAD_REQUEST, format!("File error: {e}"))
            }
            ApiError::Conversion(e @ Img2LatexError::NoLatexFound) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            ApiError::Conversion(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {e}"))
            }
            ApiError::Rejected { status, message } => (*status, message.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("{} — {}", status, message);
        } else {
            debug!("Rejected request with {}: {}", status, message);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the gateway router around `generator`.
pub fn router<G: LatexGenerator>(config: Arc<ServiceConfig>, generator: Arc<G>) -> Router {
    let body_limit = config.max_upload_bytes;
    let state = AppState { config, generator };

    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/openapi.json", get(openapi))
        .route("/api/generate", post(generate_latex::<G>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the upload directory, bind, and serve until Ctrl+C.
pub async fn serve<G: LatexGenerator>(
    config: Arc<ServiceConfig>,
    generator: Arc<G>,
) -> Result<(), Img2LatexError> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;

    info!("Listening on http://{}", addr);
    info!("  POST /api/generate  (model {}, endpoint {})", config.model, config.ollama_host);
    info!("  GET  /api/health");
    info!("Staging uploads in {}", config.upload_dir.display());

    let app = router(config, generator);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn root() -> &'static str {
    "img2latex API\n\nEndpoints:\n  POST /api/generate - image to LaTeX\n  GET  /api/health - health check\n  GET  /api/openapi.json - API description\n"
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn openapi() -> Json<serde_json::Value> {
    Json(openapi_document())
}

/// Raw multipart fields we care about; anything else is ignored.
#[derive(Default)]
struct GenerateForm {
    file: Option<UploadedFile>,
    content_type: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<GenerateForm, ApiError> {
    let mut form = GenerateForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::Rejected {
        status: e.status(),
        message: e.body_text(),
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            // A part without a filename attribute is a plain form value, not a file.
            "file" => {
                let Some(filename) = field.file_name().map(str::to_string) else {
                    debug!("Ignoring 'file' part without a filename");
                    continue;
                };
                let bytes = field.bytes().await.map_err(|e| ApiError::Rejected {
                    status: e.status(),
                    message: e.body_text(),
                })?;
                form.file = Some(UploadedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            "type" => {
                let value = field.text().await.map_err(|e| ApiError::Rejected {
                    status: e.status(),
                    message: e.body_text(),
                })?;
                form.content_type = Some(value);
            }
            _ => debug!("Ignoring form field '{}'", name),
        }
    }

    Ok(form)
}

async fn generate_latex<G: LatexGenerator>(
    State(state): State<AppState<G>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    // Non-multipart bodies cannot carry a file part.
    let form = match multipart {
        Ok(multipart) => read_form(multipart).await?,
        Err(rejection) => {
            debug!("Not a multipart body: {}", rejection);
            GenerateForm::default()
        }
    };

    let (file, content_type) =
        upload::validate(form.file, form.content_type.as_deref(), &state.config)?;

    let staged = StagedUpload::stage(&file, &state.config.upload_dir)
        .await
        .map_err(Img2LatexError::Io)?;

    let latex = state
        .generator
        .generate(staged.path(), content_type)
        .await?;

    info!(
        "Converted '{}' as {} → {} chars",
        file.filename,
        content_type,
        latex.len()
    );

    Ok(Json(GenerateResponse {
        latex,
        content_type,
    }))
}

/// OpenAPI 3 description of the public routes.
pub fn openapi_document() -> serde_json::Value {
    let types: Vec<&str> = ContentType::ALL.iter().map(ContentType::as_str).collect();
    let error_body = json!({
        "type": "object",
        "properties": { "error": { "type": "string" } }
    });

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Image to LaTeX API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "API for converting images to LaTeX using a vision model"
        },
        "paths": {
            "/api/generate": {
                "post": {
                    "tags": ["LaTeX Generation"],
                    "summary": "Generate LaTeX from image",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "multipart/form-data": {
                                "schema": {
                                    "type": "object",
                                    "required": ["file", "type"],
                                    "properties": {
                                        "file": {
                                            "type": "string",
                                            "format": "binary",
                                            "description": "Image file to convert to LaTeX"
                                        },
                                        "type": {
                                            "type": "string",
                                            "enum": types,
                                            "description": "Type of content in the image"
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": {
                            "description": "LaTeX code generated successfully",
                            "content": { "application/json": { "schema": {
                                "type": "object",
                                "properties": {
                                    "latex": { "type": "string" },
                                    "type": { "type": "string" }
                                }
                            }}}
                        },
                        "400": {
                            "description": "Invalid request",
                            "content": { "application/json": { "schema": error_body.clone() } }
                        },
                        "422": {
                            "description": "The model output contained no LaTeX",
                            "content": { "application/json": { "schema": error_body.clone() } }
                        },
                        "500": {
                            "description": "Internal server error",
                            "content": { "application/json": { "schema": error_body } }
                        }
                    }
                }
            },
            "/api/health": {
                "get": {
                    "tags": ["Health"],
                    "summary": "Check API health",
                    "responses": {
                        "200": {
                            "description": "API is healthy",
                            "content": { "application/json": { "schema": {
                                "type": "object",
                                "properties": { "status": { "type": "string" } }
                            }}}
                        }
                    }
                }
            }
        }
    })
}
