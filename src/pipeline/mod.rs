//! Pipeline stages for image-to-LaTeX conversion.
//!
//! Each submodule implements exactly one step, so each can be tested without
//! the others (and the HTTP layer can be tested without any of them).
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ encode ──▶ llm ──▶ postprocess
//! (stage)    (base64)   (VLM)   (extract)
//! ```
//!
//! 1. [`upload`]: validate the request and stage the image in a
//!    self-deleting temp file
//! 2. [`encode`]: base64-wrap the raw image bytes
//! 3. [`llm`]: one non-streaming call to the inference endpoint; the
//!    only stage with network I/O
//! 4. [`postprocess`]: pull the LaTeX fragment out of the model's answer

pub mod encode;
pub mod llm;
pub mod postprocess;
pub mod upload;
