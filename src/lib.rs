//! # img2latex
//!
//! Convert images of tables, equations and formatted text to LaTeX using a
//! vision model served over the Ollama API.
//!
//! ## Why a model and a regex pass?
//!
//! Vision models read a photographed table far better than classic OCR, but
//! their answers are chatty: fenced code, a friendly sentence, sometimes a
//! complete `\documentclass` document. The model does the reading; a small
//! deterministic post-processor cuts its answer down to the fragment the
//! caller asked for.
//!
//! ## Pipeline Overview
//!
//! ```text
//! POST /api/generate (file + type)
//!  │
//!  ├─ 1. Validate  file present, name set, extension allowed, type known
//!  ├─ 2. Stage     unique temp file, removed on every exit path
//!  ├─ 3. Encode    bytes → base64
//!  ├─ 4. VLM       one non-streaming call to {host}/api/generate
//!  ├─ 5. Extract   fenced block or environment, preamble stripped
//!  └─ 6. Respond   {"latex": …, "type": …}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2latex::{ContentType, LatexGenerator, OllamaLatexGenerator, ServiceConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::builder().model("llava:34b").build()?;
//!     let generator = OllamaLatexGenerator::new(&config)?;
//!     let latex = generator
//!         .generate(Path::new("table.png"), ContentType::Table)
//!         .await?;
//!     println!("{latex}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2latex` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod content;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use content::ContentType;
pub use error::{Img2LatexError, UploadError};
pub use generate::{LatexGenerator, OllamaLatexGenerator};
pub use pipeline::postprocess::{extract, Extraction, NO_CONTENT_MESSAGE};
pub use server::{router, serve, GenerateResponse};
