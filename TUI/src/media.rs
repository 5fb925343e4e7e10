//! Image capture: turns a user-selected file into an in-memory image that
//! can be previewed in the terminal and attached to remote requests.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

use crate::error::{Error, Result};

/// An image held in memory. Cloning shares the underlying bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    bytes: Arc<[u8]>,
    mime: &'static str,
    file_name: String,
    /// The content itself identified the format, not just the extension
    sniffed: bool,
}

impl ImageData {
    /// Reads an image from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        Self::from_bytes(bytes, file_name)
    }

    /// Wraps raw bytes, detecting the image type from the content first and
    /// the file extension second.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, file_name: impl Into<String>) -> Result<Self> {
        let bytes = bytes.into();
        let file_name = file_name.into();
        if bytes.is_empty() {
            return Err(Error::Media(format!("{} is empty", file_name)));
        }
        let (mime, sniffed) = match sniff_mime(&bytes) {
            Some(mime) => (mime, true),
            None => {
                let mime = mime_for_name(&file_name)
                    .ok_or_else(|| Error::Media(format!("{} is not a supported image", file_name)))?;
                (mime, false)
            }
        };
        Ok(Self {
            bytes: Arc::from(bytes),
            mime,
            file_name,
            sniffed,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    fn size(&self) -> usize {
        self.bytes.len()
    }

    /// False when only the file extension vouches for the format; such a
    /// file may not decode.
    pub fn previewable(&self) -> bool {
        self.sniffed
    }

    /// `data:<mime>;base64,<payload>`, the form the stylist endpoints expect.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64_STANDARD.encode(&self.bytes))
    }

    /// One-line description for the UI, e.g. `jacket.png (48.2 KB, image/png)`.
    pub fn summary(&self) -> String {
        format!("{} ({}, {})", self.file_name, format_size(self.size()), self.mime)
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.size())
            .finish()
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

fn mime_for_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn format_size(len: usize) -> String {
    if len < 1024 {
        format!("{} B", len)
    } else if len < 1024 * 1024 {
        format!("{:.1} KB", len as f64 / 1024.0)
    } else {
        format!("{:.2} MB", len as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
pub(crate) fn test_image(name: &str) -> ImageData {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(name.as_bytes());
    ImageData::from_bytes(bytes, format!("{}.png", name)).expect("valid test image")
}
