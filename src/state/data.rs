/// Session data: the secret image and the store that owns it
///
/// The secret image is kept in two forms: the raw encoded bytes (for
/// display) and a base64 data URL (for the captioning request).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ImageError;

/// MIME type used when the image format cannot be sniffed
const FALLBACK_MIME: &str = "image/jpeg";

/// The user-chosen picture revealed instead of the real shot
#[derive(Clone, PartialEq)]
pub struct SecretImage {
    /// Original filename, if the image came from a file
    name: Option<String>,
    /// MIME type, e.g. "image/png"
    mime: String,
    /// Encoded image bytes (JPEG/PNG/...)
    bytes: Arc<Vec<u8>>,
    /// `data:<mime>;base64,<payload>`
    data_url: Arc<str>,
}

impl SecretImage {
    /// Build a secret image from encoded file bytes
    pub fn from_bytes(name: Option<String>, bytes: Vec<u8>) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }

        let mime = image::guess_format(&bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or(FALLBACK_MIME)
            .to_string();
        let data_url = format!("data:{};base64,{}", mime, STANDARD.encode(&bytes));

        Ok(Self {
            name,
            mime,
            bytes: Arc::new(bytes),
            data_url: data_url.into(),
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Encoded image bytes, shared
    pub fn bytes(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.bytes)
    }

    /// Base64 payload with the data URL prefix stripped
    pub fn base64_payload(&self) -> &str {
        strip_data_url_prefix(&self.data_url)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Payloads can be megabytes; keep them out of logs
impl std::fmt::Debug for SecretImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretImage")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Read an image file in the background and turn it into a secret image
pub async fn load_secret_image(path: PathBuf) -> Result<SecretImage, ImageError> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ImageError::Read(format!("{}: {}", path.display(), e)))?;

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string());

    SecretImage::from_bytes(name, bytes)
}

/// Remove a `scheme:mime;base64,` prefix if present
pub fn strip_data_url_prefix(payload: &str) -> &str {
    if !payload.starts_with("data:") {
        return payload;
    }
    match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    }
}

/// Holds at most one secret image for the session
///
/// Nothing is persisted; dropping the store forgets the image.
#[derive(Debug, Default)]
pub struct ImageStore {
    current: Option<SecretImage>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current secret image
    pub fn set_image(&mut self, image: SecretImage) {
        self.current = Some(image);
    }

    pub fn clear_image(&mut self) {
        self.current = None;
    }

    pub fn image(&self) -> Option<&SecretImage> {
        self.current.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Smallest thing `image::guess_format` recognizes as PNG
    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[test]
    fn test_empty_bytes_rejected() {
        assert_eq!(
            SecretImage::from_bytes(Some("cat.jpg".into()), Vec::new()),
            Err(ImageError::Empty)
        );
    }

    #[test]
    fn test_from_bytes_sniffs_mime_and_encodes() {
        let image = SecretImage::from_bytes(Some("cat.png".into()), PNG_MAGIC.to_vec()).unwrap();
        assert_eq!(image.mime(), "image/png");
        assert!(image.data_url.starts_with("data:image/png;base64,"));
        assert_eq!(image.base64_payload(), STANDARD.encode(PNG_MAGIC));
        assert_eq!(image.name(), Some("cat.png"));
    }

    #[test]
    fn test_unknown_format_defaults_to_jpeg() {
        let image = SecretImage::from_bytes(None, b"not an image".to_vec()).unwrap();
        assert_eq!(image.mime(), "image/jpeg");
    }

    #[test]
    fn test_payload_has_no_prefix() {
        let image =
            SecretImage::from_bytes(None, vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();
        assert_eq!(image.mime(), "image/jpeg");
        assert_eq!(image.base64_payload(), "/9j/4AAQ");
        assert_eq!(image.data_url.as_ref(), "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_data_url_prefix("data:image/jpeg;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("data:broken"), "data:broken");
    }

    #[tokio::test]
    async fn test_load_secret_image_from_file() {
        let path = std::env::temp_dir().join(format!("magic-shutter-{}.png", std::process::id()));
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let image = load_secret_image(path.clone()).await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(image.mime(), "image/png");
        assert_eq!(image.name(), path.file_name().and_then(|n| n.to_str()));
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let result = load_secret_image(PathBuf::from("/nonexistent/secret.jpg")).await;
        assert!(matches!(result, Err(ImageError::Read(_))));
    }

    #[test]
    fn test_store_set_and_clear() {
        let mut store = ImageStore::new();
        assert!(store.image().is_none());

        let image = SecretImage::from_bytes(None, PNG_MAGIC.to_vec()).unwrap();
        store.set_image(image.clone());
        assert_eq!(store.image(), Some(&image));

        store.clear_image();
        assert!(!store.has_image());
    }
}
