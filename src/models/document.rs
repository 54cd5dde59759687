use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use base64::Engine;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Declared media type of an uploaded report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    Image,
    Unknown,
}

impl MediaType {
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        if mime == "application/pdf" {
            MediaType::Pdf
        } else if mime.starts_with("image/") {
            MediaType::Image
        } else {
            MediaType::Unknown
        }
    }

    pub fn from_file_name(name: &str) -> Self {
        let guess = mime_guess::from_path(name).first_or_octet_stream();
        Self::from_mime(guess.essence_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Pdf => "pdf",
            MediaType::Image => "image",
            MediaType::Unknown => "unknown",
        }
    }
}

/// One uploaded report file. Created at submission, read once by the
/// extraction stage, never mutated.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub file_name: String,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(file_name: impl Into<String>, media_type: MediaType, bytes: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            media_type,
            bytes,
        }
    }

    /// Read a document from a seekable stream. Upload handles often arrive
    /// with the cursor mid-stream, so rewind before reading.
    pub fn from_reader<R: Read + Seek>(
        file_name: &str,
        media_type: MediaType,
        reader: &mut R,
    ) -> std::io::Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::new(file_name, media_type, bytes))
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        let media_type = MediaType::from_file_name(&file_name);
        let bytes = std::fs::read(path)?;
        Ok(Self::new(file_name, media_type, bytes))
    }

    /// URL-safe SHA-256 fingerprint of the raw bytes. Stable across
    /// resubmissions of the same file, so storage keys derived from it
    /// are idempotent.
    pub fn content_hash(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
    }
}
