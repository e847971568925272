//! PDF-aware document extraction.
//!
//! Given a URL that a fetch-style tool would otherwise return raw, the
//! extractor streams the payload to bounded temporary storage, validates it
//! is actually a PDF, and converts it to normalized text under a hard
//! character cap. Absence of output is the only failure signal: transport
//! and parsing errors are caught here and logged, never raised.

mod pdf;

use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Byte-size policy: downloads larger than this are abandoned.
pub const DEFAULT_MAX_BYTES: u64 = 50 * 1024 * 1024;

/// Character cap on the final text, bounding model context consumption.
pub const DEFAULT_MAX_CHARS: usize = 200_000;

/// Default TCP connect timeout for the download client.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default whole-request timeout; bounds a stalled or drip-feeding server.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const USER_AGENT: &str = "Mozilla/5.0 (compatible; skiff/0.1)";
const PDF_MAGIC: &[u8] = b"%PDF";

/// URL markers indicating a binary document resource.
const PDF_URL_MARKERS: &[&str] = &[".pdf", "content=pdf", "format=pdf", "download=pdf"];

/// Whether a fetch-style URL looks like it points at a PDF document.
pub fn looks_like_document(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    PDF_URL_MARKERS.iter().any(|m| lower.contains(m))
}

// Internal only; `extract` swallows these.
#[derive(Debug, Error)]
enum ExtractError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("document exceeds size policy ({0} bytes)")]
    TooLarge(u64),

    #[error("not a PDF (signature/content-type mismatch)")]
    NotPdf,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Builder for [`DocumentExtractor`].
#[derive(Debug, Clone)]
pub struct DocumentExtractorBuilder {
    max_bytes: u64,
    max_chars: usize,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl DocumentExtractorBuilder {
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn build(self) -> DocumentExtractor {
        // A hung server must not stall the dispatch iteration waiting on
        // this download.
        let http = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .unwrap_or_default();
        DocumentExtractor {
            http,
            max_bytes: self.max_bytes,
            max_chars: self.max_chars,
        }
    }
}

/// Streams, validates, and converts remote PDF documents to text.
pub struct DocumentExtractor {
    http: reqwest::Client,
    max_bytes: u64,
    max_chars: usize,
}

impl DocumentExtractor {
    pub fn builder() -> DocumentExtractorBuilder {
        DocumentExtractorBuilder {
            max_bytes: DEFAULT_MAX_BYTES,
            max_chars: DEFAULT_MAX_CHARS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Fetch `url` and return its text, or `None` if anything goes wrong.
    pub async fn extract(&self, url: &str) -> Option<String> {
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                debug!(error = %e, "no temp storage for document download");
                return None;
            }
        };
        let path = dir.path().join("document.pdf");

        if let Err(e) = self.download(url, &path).await {
            debug!(url, error = %e, "document download failed");
            return None;
        }

        let text = pdf::to_markdown(&path)
            .or_else(|| pdf::to_plain_text(&path))
            .filter(|t| !t.trim().is_empty())?;

        Some(apply_char_cap(text, self.max_chars))
    }

    /// Stream the resource to disk, enforcing the byte-size policy and the
    /// PDF signature check.
    async fn download(&self, url: &str, path: &Path) -> Result<(), ExtractError> {
        let response = self
            .http
            .get(url)
            .header("user-agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| ExtractError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| ExtractError::Transport(e.to_string()))?;

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(ExtractError::TooLarge(len));
            }
        }
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let mut file = tokio::fs::File::create(path).await?;
        let mut written: u64 = 0;
        let mut response = response;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ExtractError::Transport(e.to_string()))?
        {
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(ExtractError::TooLarge(written));
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        validate_signature(path, &content_type)?;
        Ok(())
    }
}

/// Check the magic bytes, falling back to the declared content type.
fn validate_signature(path: &Path, content_type: &str) -> Result<(), ExtractError> {
    let mut head = [0u8; 5];
    let mut file = std::fs::File::open(path)?;
    let read = file.read(&mut head)?;
    if head[..read].starts_with(PDF_MAGIC) || content_type.contains("pdf") {
        Ok(())
    } else {
        Err(ExtractError::NotPdf)
    }
}

/// Truncate to at most `max_chars` characters, marking the cut.
fn apply_char_cap(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut capped: String = text.chars().take(max_chars).collect();
    capped.push_str(&format!("\n\n[truncated at {max_chars} chars]"));
    capped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn document_url_heuristics() {
        assert!(looks_like_document("https://x.test/report.PDF"));
        assert!(looks_like_document("https://x.test/dl?format=pdf"));
        assert!(looks_like_document("https://x.test/dl?content=pdf&x=1"));
        assert!(!looks_like_document("https://x.test/report.html"));
    }

    #[test]
    fn char_cap_is_exact() {
        let text = "a".repeat(150);
        let capped = apply_char_cap(text, 100);
        let marker = "\n\n[truncated at 100 chars]";
        assert!(capped.ends_with(marker));
        assert_eq!(capped.len() - marker.len(), 100);
    }

    #[test]
    fn char_cap_leaves_short_text_alone() {
        let text = "short".to_string();
        assert_eq!(apply_char_cap(text.clone(), 100), text);
    }

    #[tokio::test]
    async fn stalled_server_does_not_hang_extraction() {
        // Accepts the connection and then never sends a byte.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let socket = listener.accept().await;
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(socket);
        });

        let extractor = DocumentExtractor::builder()
            .request_timeout(Duration::from_millis(200))
            .build();
        let started = std::time::Instant::now();
        let url = format!("http://{addr}/report.pdf");
        assert!(extractor.extract(&url).await.is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn signature_accepts_magic_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.7 rest")
            .unwrap();
        assert!(validate_signature(&path, "").is_ok());
    }

    #[test]
    fn signature_falls_back_to_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"<html>")
            .unwrap();
        assert!(validate_signature(&path, "application/pdf").is_ok());
        assert!(validate_signature(&path, "text/html").is_err());
    }
}
