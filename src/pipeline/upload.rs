//! Upload staging: validate an inbound image and park it on disk for exactly
//! one request.
//!
//! ## Cleanup
//!
//! The staged file must disappear whether generation succeeds, fails, or the
//! client hangs up and the handler future is dropped mid-flight. Its lifetime
//! is that of the [`NamedTempFile`] inside [`StagedUpload`], so every exit
//! path deletes it, including early `?` returns.
//!
//! Each staged path carries a random component so two concurrent uploads of
//! `scan.png` never share a file.

use crate::config::ServiceConfig;
use crate::content::ContentType;
use crate::error::UploadError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Name used when sanitising leaves nothing behind.
const FALLBACK_STEM: &str = "upload";

/// Longest stem carried into a staged file name, in bytes.
const MAX_STEM_LEN: usize = 64;

/// An image as it arrived in the request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Apply the gateway checks in order, handing back the file together with
/// its parsed content type.
///
/// * `file`: `None` when the request had no `file` part
/// * `content_type`: raw `type` field, `None` when absent
pub fn validate(
    file: Option<UploadedFile>,
    content_type: Option<&str>,
    config: &ServiceConfig,
) -> Result<(UploadedFile, ContentType), UploadError> {
    let file = file.ok_or(UploadError::NoFile)?;

    if file.filename.is_empty() {
        return Err(UploadError::EmptyFilename);
    }

    if !is_allowed_file(&file.filename, config) {
        return Err(UploadError::InvalidFileType);
    }

    let content_type = content_type
        .unwrap_or("")
        .parse::<ContentType>()
        .map_err(|_| UploadError::InvalidContentType)?;

    Ok((file, content_type))
}

/// `true` when `filename` has an extension in the allow-list.
pub fn is_allowed_file(filename: &str, config: &ServiceConfig) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| config.is_allowed_extension(ext))
}

static RE_UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

/// Reduce a client-supplied filename to a safe single path component.
///
/// Non-ASCII characters are dropped, path separators become word breaks,
/// whitespace runs become `_`, anything outside `[A-Za-z0-9_.-]` is removed,
/// and leading/trailing dots and underscores are stripped so `..` can never
/// survive. May return an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = RE_UNSAFE_CHARS.replace_all(&joined, "");
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// A file written into the upload directory, deleted when dropped.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    /// Write `upload` to a fresh, uniquely named file inside `dir`.
    ///
    /// The name keeps the sanitised stem (at most 64 bytes) and extension of
    /// the original for easier debugging, e.g. `scan-Xk3a9Q.png`.
    pub async fn stage(upload: &UploadedFile, dir: &Path) -> std::io::Result<Self> {
        let safe = sanitize_filename(&upload.filename);
        let (stem, ext) = match safe.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{ext}")),
            Some((_, ext)) => (FALLBACK_STEM, format!(".{ext}")),
            None if safe.is_empty() => (FALLBACK_STEM, String::new()),
            None => (safe.as_str(), String::new()),
        };
        // Sanitised names are pure ASCII, so any byte index is a char boundary.
        let stem = &stem[..stem.len().min(MAX_STEM_LEN)];

        let file = tempfile::Builder::new()
            .prefix(&format!("{stem}-"))
            .suffix(&ext)
            .tempfile_in(dir)?;
        tokio::fs::write(file.path(), &upload.bytes).await?;

        debug!(
            "Staged '{}' ({} bytes) at {}",
            upload.filename,
            upload.bytes.len(),
            file.path().display()
        );
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            bytes: b"fake image data".to_vec(),
        }
    }

    #[test]
    fn validation_order() {
        let config = ServiceConfig::default();
        let check = |file: Option<UploadedFile>, ct: Option<&str>| {
            validate(file, ct, &config).map(|(_, ct)| ct)
        };
        assert_eq!(check(None, Some("bogus")), Err(UploadError::NoFile));
        assert_eq!(
            check(Some(upload("")), Some("bogus")),
            Err(UploadError::EmptyFilename)
        );
        assert_eq!(
            check(Some(upload("example.txt")), Some("bogus")),
            Err(UploadError::InvalidFileType)
        );
        assert_eq!(
            check(Some(upload("example.png")), None),
            Err(UploadError::InvalidContentType)
        );
        assert_eq!(
            check(Some(upload("example.PNG")), Some("Table")),
            Ok(ContentType::Table)
        );
    }

    #[test]
    fn extension_rules() {
        let config = ServiceConfig::default();
        assert!(is_allowed_file("scan.JPEG", &config));
        assert!(is_allowed_file("archive.tar.png", &config));
        assert!(is_allowed_file(".png", &config));
        assert!(!is_allowed_file("png", &config));
        assert!(!is_allowed_file("scan.png.exe", &config));
        assert!(!is_allowed_file("scan.", &config));
    }

    #[test]
    fn sanitize_strips_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename(r"C:\Users\me\scan.png"), "C_Users_me_scan.png");
        assert_eq!(sanitize_filename("my cool  scan.png"), "my_cool_scan.png");
        assert_eq!(sanitize_filename("équation.png"), "quation.png");
        assert_eq!(sanitize_filename("../.."), "");
    }

    #[tokio::test]
    async fn staged_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedUpload::stage(&upload("../scan.png"), dir.path())
            .await
            .unwrap();
        let path = staged.path().to_path_buf();

        assert_eq!(path.parent(), Some(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("scan-"), "got {name}");
        assert!(name.ends_with(".png"), "got {name}");
        assert_eq!(std::fs::read(&path).unwrap(), b"fake image data");

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn long_filename_is_truncated_for_staging() {
        let dir = tempfile::tempdir().unwrap();
        let long = format!("{}.png", "a".repeat(250));
        let staged = StagedUpload::stage(&upload(&long), dir.path()).await.unwrap();

        let name = staged.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(&format!("{}-", "a".repeat(MAX_STEM_LEN))), "got {name}");
        assert!(!name.starts_with(&"a".repeat(MAX_STEM_LEN + 1)), "got {name}");
        assert!(name.ends_with(".png"), "got {name}");
        assert!(name.len() < 100, "got {} bytes", name.len());
    }

    #[tokio::test]
    async fn same_name_uploads_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let a = StagedUpload::stage(&upload("scan.png"), dir.path()).await.unwrap();
        let b = StagedUpload::stage(&upload("scan.png"), dir.path()).await.unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn unsanitisable_name_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedUpload::stage(&upload("日本"), dir.path()).await.unwrap();
        let name = staged.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("upload-"), "got {name}");
    }
}
