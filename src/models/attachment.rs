use std::path::Path;

use color_eyre::eyre::{Context, Result};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A file submitted alongside scalar fields in a multipart form.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Builds an attachment, sniffing the content type from the bytes.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let content_type = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .wrap_err_with(|| format!("Failed to read attachment: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

// Keep the bytes out of logs.
impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
