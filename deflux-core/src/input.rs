//! Payloads accepted by compression operations.
//!
//! An [`Input`] is either raw bytes or text. Text is converted to bytes with a
//! named encoding (UTF-8 when none is given) before it reaches the compressor.
//! Encoding labels follow the WHATWG Encoding Standard.

use crate::error::{Result, ZlibError};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use serde_json::Value;

/// A payload for `compress`, `write`, or `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A byte sequence, used as is.
    Bytes(Vec<u8>),
    /// Text to encode before use.
    Text {
        /// The text.
        text: String,
        /// Encoding label; `None` means UTF-8.
        encoding: Option<String>,
    },
}

impl Input {
    /// Text encoded as UTF-8.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            encoding: None,
        }
    }

    /// Text encoded with the named encoding.
    pub fn text_with_encoding(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            encoding: Some(label.into()),
        }
    }

    /// Whether the payload carries no bytes or characters.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::Text { text, .. } => text.is_empty(),
        }
    }

    /// Convert to bytes, encoding text as requested.
    ///
    /// Unknown labels and unrepresentable characters are rejected rather than
    /// replaced.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Text {
                text,
                encoding: None,
            } => Ok(text.into_bytes()),
            Self::Text {
                text,
                encoding: Some(label),
            } => encode(&text, &label),
        }
    }
}

fn encode(text: &str, label: &str) -> Result<Vec<u8>> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ZlibError::unknown_encoding(label))?;

    // encoding_rs only decodes UTF-16; its encoder falls back to UTF-8.
    if encoding == UTF_16LE {
        return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == UTF_16BE {
        return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }
    if encoding.output_encoding() != encoding {
        return Err(ZlibError::encoding_error(format!(
            "{} cannot be used for encoding",
            encoding.name()
        )));
    }

    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(ZlibError::encoding_error(format!(
            "text contains characters not representable in {}",
            encoding.name()
        )));
    }
    Ok(bytes.into_owned())
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Input {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Input {
    fn from(bytes: &[u8; N]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl TryFrom<Value> for Input {
    type Error = ZlibError;

    /// Accepts strings and arrays of byte values (`0..=255`).
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(Self::text(text)),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or_else(|| ZlibError::invalid_input("array of non-byte values"))
                })
                .collect::<Result<Vec<u8>>>()
                .map(Self::Bytes),
            Value::Number(_) => Err(ZlibError::invalid_input("number")),
            Value::Bool(_) => Err(ZlibError::invalid_input("boolean")),
            Value::Null => Err(ZlibError::invalid_input("null")),
            Value::Object(_) => Err(ZlibError::invalid_input("object")),
        }
    }
}
