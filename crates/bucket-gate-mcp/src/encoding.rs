// crates/bucket-gate-mcp/src/encoding.rs
// ============================================================================
// Module: Content Encoding Policy
// Description: Upload decoding and download encoding decisions.
// Purpose: Keep the text-versus-binary rules in one auditable place.
// Dependencies: base64
// ============================================================================

//! ## Overview
//! Uploads arrive as a single `content` string. Strict standard-alphabet
//! base64 (with padding) is decoded to bytes; any other string is stored as
//! its UTF-8 bytes. Downloads are returned as raw text when the content type
//! is textual and the bytes are valid UTF-8, and as base64 otherwise.
//!
//! The upload fallback never fails the call. A caller who meant to send
//! base64 but sent a malformed string gets the literal text stored instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Content type assumed when an object has none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Substrings that mark a content type as textual.
const TEXTUAL_MARKERS: &[&str] = &["json", "xml", "javascript", "html"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Encoding applied to a content payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    /// Raw UTF-8 text.
    Utf8,
    /// Standard base64 with padding.
    Base64,
}

impl ContentEncoding {
    /// Returns the wire label for the encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Base64 => "base64",
        }
    }
}

/// Upload content after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedUpload {
    /// Bytes to store.
    pub bytes: Vec<u8>,
    /// How the input string was interpreted.
    pub encoding: ContentEncoding,
}

/// Download content ready for a JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDownload {
    /// Encoded content string.
    pub content: String,
    /// Encoding applied to `content`.
    pub encoding: ContentEncoding,
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Interprets upload content as base64 when valid, else as UTF-8 text.
#[must_use]
pub fn decode_upload(content: &str) -> DecodedUpload {
    match STANDARD.decode(content) {
        Ok(bytes) => DecodedUpload {
            bytes,
            encoding: ContentEncoding::Base64,
        },
        Err(_) => DecodedUpload {
            bytes: content.as_bytes().to_vec(),
            encoding: ContentEncoding::Utf8,
        },
    }
}

/// Returns the effective content type, defaulting when absent or blank.
#[must_use]
pub fn effective_content_type(content_type: Option<&str>) -> &str {
    content_type.map(str::trim).filter(|value| !value.is_empty()).unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Returns true when a content type should be returned as text.
#[must_use]
pub fn is_textual_content_type(content_type: &str) -> bool {
    let lowered = content_type.to_ascii_lowercase();
    lowered.starts_with("text/") || TEXTUAL_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Encodes downloaded bytes according to their content type.
///
/// Textual content that is not valid UTF-8 is returned as base64 so the
/// bytes survive the round trip.
#[must_use]
pub fn encode_download(bytes: Vec<u8>, content_type: Option<&str>) -> EncodedDownload {
    if is_textual_content_type(effective_content_type(content_type)) {
        match String::from_utf8(bytes) {
            Ok(content) => {
                return EncodedDownload {
                    content,
                    encoding: ContentEncoding::Utf8,
                };
            }
            Err(err) => {
                return EncodedDownload {
                    content: STANDARD.encode(err.into_bytes()),
                    encoding: ContentEncoding::Base64,
                };
            }
        }
    }
    EncodedDownload {
        content: STANDARD.encode(bytes),
        encoding: ContentEncoding::Base64,
    }
}

/// Reverses a download encoding back to the stored bytes.
///
/// # Errors
///
/// Returns [`base64::DecodeError`] when base64 content is malformed.
pub fn decode_download(download: &EncodedDownload) -> Result<Vec<u8>, base64::DecodeError> {
    match download.encoding {
        ContentEncoding::Utf8 => Ok(download.content.as_bytes().to_vec()),
        ContentEncoding::Base64 => STANDARD.decode(&download.content),
    }
}
