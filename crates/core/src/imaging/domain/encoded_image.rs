use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

/// A self-describing still image: `data:<mime>;base64,<payload>`.
///
/// Produced by a frame source and consumed by the transcoder within a single
/// capture cycle. The value is not validated on construction; the transcoder
/// is the only place that looks inside it.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    uri: String,
}

impl EncodedImage {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// Wraps raw image bytes as a base64 data URI with the given MIME type.
    pub fn encode(mime: &str, bytes: &[u8]) -> Self {
        Self {
            uri: format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }

    pub fn len(&self) -> usize {
        self.uri.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uri.is_empty()
    }
}

// Payloads run to hundreds of kilobytes, so Debug only shows the header.
impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header = self.uri.split(',').next().unwrap_or_default();
        f.debug_struct("EncodedImage")
            .field("header", &header)
            .field("len", &self.uri.len())
            .finish()
    }
}

/// Raw image bytes plus MIME type, ready to be uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryImage {
    bytes: Vec<u8>,
    mime: String,
}

impl BinaryImage {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for BinaryImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryImage")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}
