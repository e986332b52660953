//! Configuration for the image-to-LaTeX service.
//!
//! Every knob lives in [`ServiceConfig`], built once at startup via
//! [`ServiceConfigBuilder`] and shared read-only (behind an `Arc`) by the
//! gateway and the generator. Nothing is read from the environment here; the
//! binary maps env vars and flags onto the builder.

use crate::error::Img2LatexError;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Name of the directory created under the chosen upload root.
pub const UPLOAD_SUBDIR: &str = "latex_generator_uploads";

/// Default vision model served by Ollama.
pub const DEFAULT_MODEL: &str = "llava:34b";

/// Default Ollama base URL.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Configuration for the gateway and the inference client.
///
/// # Example
/// ```rust
/// use img2latex::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .port(8080)
///     .model("llama3.2-vision")
///     .allowed_extensions("png, JPG ,webp")
///     .build()
///     .unwrap();
/// assert!(config.is_allowed_extension("jpg"));
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Interface the gateway binds to. Default: `0.0.0.0`.
    pub bind_host: String,

    /// Gateway port. Default: 5050.
    pub port: u16,

    /// Model identifier passed to the inference endpoint. Default: `llava:34b`.
    pub model: String,

    /// Base URL of the Ollama-compatible endpoint. Default: `http://localhost:11434`.
    pub ollama_host: String,

    /// Directory that holds staged uploads for the duration of one request.
    ///
    /// Default: `<system temp>/latex_generator_uploads`.
    pub upload_dir: PathBuf,

    /// Lowercase file extensions (no leading dot) accepted by the gateway.
    /// Default: png, jpg, jpeg.
    pub allowed_extensions: BTreeSet<String>,

    /// Upper bound on one inference call, in seconds. Default: 120.
    ///
    /// Large vision models on CPU routinely take a minute per image.
    pub request_timeout_secs: u64,

    /// Largest accepted request body in bytes. Default: 16 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 5050,
            model: DEFAULT_MODEL.to_string(),
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            upload_dir: std::env::temp_dir().join(UPLOAD_SUBDIR),
            allowed_extensions: parse_extensions("png,jpg,jpeg"),
            request_timeout_secs: 120,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// Socket address string the gateway listens on.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// Case-insensitive membership test against the extension allow-list.
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        self.allowed_extensions.contains(&ext.to_ascii_lowercase())
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn bind_host(mut self, host: impl Into<String>) -> Self {
        self.config.bind_host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn ollama_host(mut self, host: impl Into<String>) -> Self {
        self.config.ollama_host = host.into();
        self
    }

    /// Use `root/latex_generator_uploads` as the staging directory.
    pub fn upload_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = root.into().join(UPLOAD_SUBDIR);
        self
    }

    /// Use exactly `dir` as the staging directory.
    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    /// Comma-separated list, e.g. `"png,jpg,jpeg"`.
    pub fn allowed_extensions(mut self, list: &str) -> Self {
        self.config.allowed_extensions = parse_extensions(list);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, Img2LatexError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(Img2LatexError::InvalidConfig("model must not be empty".into()));
        }
        if !(c.ollama_host.starts_with("http://") || c.ollama_host.starts_with("https://")) {
            return Err(Img2LatexError::InvalidConfig(format!(
                "inference host must be an http(s) URL, got '{}'",
                c.ollama_host
            )));
        }
        if c.allowed_extensions.is_empty() {
            return Err(Img2LatexError::InvalidConfig(
                "at least one allowed file extension is required".into(),
            ));
        }
        if c.request_timeout_secs == 0 {
            return Err(Img2LatexError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(Img2LatexError::InvalidConfig(
                "max upload size must be > 0".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Split a comma list into normalised extensions: trimmed, lowercase, no
/// leading dot, empties dropped.
fn parse_extensions(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
