//! Image → LaTeX conversion entry point.
//!
//! [`LatexGenerator`] is the seam between the HTTP gateway and the model:
//! the gateway only knows it can hand over a staged image path and get back
//! LaTeX. [`OllamaLatexGenerator`] is the production implementation; tests
//! substitute their own.

use crate::config::ServiceConfig;
use crate::content::ContentType;
use crate::error::Img2LatexError;
use crate::pipeline::{encode, llm::OllamaClient, postprocess};
use crate::prompts::instruction_prompt;
use std::future::Future;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Anything that can turn an image file into a LaTeX fragment.
pub trait LatexGenerator: Send + Sync + 'static {
    /// Convert the image at `image_path`, treating it as `content_type`.
    ///
    /// # Errors
    /// * [`Img2LatexError::FileNotFound`]: `image_path` is not a regular file
    /// * [`Img2LatexError::Generation`]: the model call failed
    /// * [`Img2LatexError::NoLatexFound`]: the model answer held no LaTeX
    fn generate(
        &self,
        image_path: &Path,
        content_type: ContentType,
    ) -> impl Future<Output = Result<String, Img2LatexError>> + Send;
}

/// Generator backed by an Ollama-compatible vision model.
///
/// Cheap to share: holds one pooled HTTP client reused across requests.
#[derive(Debug, Clone)]
pub struct OllamaLatexGenerator {
    client: OllamaClient,
}

impl OllamaLatexGenerator {
    pub fn new(config: &ServiceConfig) -> Result<Self, Img2LatexError> {
        Ok(Self {
            client: OllamaClient::new(config)?,
        })
    }
}

impl LatexGenerator for OllamaLatexGenerator {
    async fn generate(
        &self,
        image_path: &Path,
        content_type: ContentType,
    ) -> Result<String, Img2LatexError> {
        let start = Instant::now();
        info!(
            "Generating {} LaTeX from {} with {}",
            content_type,
            image_path.display(),
            self.client.model()
        );

        // ── Step 1: Check the image is still there ───────────────────────────
        let is_file = tokio::fs::metadata(image_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(Img2LatexError::FileNotFound {
                path: image_path.to_path_buf(),
            });
        }

        // ── Step 2: Encode ────────────────────────────────────────────────
        let image_b64 = encode::encode_file(image_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Img2LatexError::FileNotFound {
                    path: image_path.to_path_buf(),
                }
            } else {
                Img2LatexError::Io(e)
            }
        })?;

        // ── Step 3: Ask the model ────────────────────────────────────────────
        let prompt = instruction_prompt(content_type);
        let result = self.client.generate(prompt, image_b64).await?;

        // ── Step 4: Clean up the answer ──────────────────────────────────────
        let latex = postprocess::extract(&result.response, content_type)
            .into_option()
            .ok_or(Img2LatexError::NoLatexFound)?;

        debug!(
            "Extracted {} chars of LaTeX in {:?}",
            latex.len(),
            start.elapsed()
        );
        Ok(latex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> OllamaLatexGenerator {
        // Port 9 (discard) on localhost: nothing listens, so any call that
        // gets as far as the network fails fast.
        let config = ServiceConfig::builder()
            .ollama_host("http://127.0.0.1:9")
            .request_timeout_secs(2)
            .build()
            .unwrap();
        OllamaLatexGenerator::new(&config).unwrap()
    }

    #[tokio::test]
    async fn missing_image_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");
        let err = generator()
            .generate(&path, ContentType::Table)
            .await
            .unwrap_err();
        assert!(matches!(err, Img2LatexError::FileNotFound { .. }), "got {err:?}");
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn directory_is_not_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let err = generator()
            .generate(dir.path(), ContentType::Text)
            .await
            .unwrap_err();
        assert!(matches!(err, Img2LatexError::FileNotFound { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_generation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eq.png");
        std::fs::write(&path, b"fake image data").unwrap();
        let err = generator()
            .generate(&path, ContentType::Equation)
            .await
            .unwrap_err();
        assert!(matches!(err, Img2LatexError::Generation(_)), "got {err:?}");
        assert!(err.to_string().starts_with("Failed to generate LaTeX: "));
    }
}
