//! Compression variants.
//!
//! A variant selects the direction (compress or decompress) and the container
//! framing around the deflate payload.

use crate::error::{Result, ZlibError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Container framing around a deflate payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    /// Two-byte zlib header and Adler-32 trailer.
    Zlib,
    /// No header or trailer.
    Raw,
    /// Gzip member header and CRC-32 trailer.
    Gzip,
    /// Gzip or zlib, detected from the first bytes.
    Auto,
}

/// One of the seven supported compress/decompress operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Variant {
    /// Compress with zlib framing.
    #[default]
    Deflate,
    /// Compress without framing.
    DeflateRaw,
    /// Decompress gzip members.
    Gunzip,
    /// Compress with gzip framing.
    Gzip,
    /// Decompress zlib framing.
    Inflate,
    /// Decompress unframed data.
    InflateRaw,
    /// Decompress gzip or zlib, auto-detected.
    Unzip,
}

impl Variant {
    /// Every variant in name order.
    pub const ALL: [Variant; 7] = [
        Self::Deflate,
        Self::DeflateRaw,
        Self::Gunzip,
        Self::Gzip,
        Self::Inflate,
        Self::InflateRaw,
        Self::Unzip,
    ];

    /// The canonical lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Deflate => "deflate",
            Self::DeflateRaw => "deflate_raw",
            Self::Gunzip => "gunzip",
            Self::Gzip => "gzip",
            Self::Inflate => "inflate",
            Self::InflateRaw => "inflate_raw",
            Self::Unzip => "unzip",
        }
    }

    /// Resolve a variant name, ignoring ASCII case.
    pub fn parse(name: &str) -> Result<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.name() == lowered)
            .ok_or_else(|| ZlibError::unrecognized_variant(name))
    }

    /// Whether this variant compresses (as opposed to decompresses).
    pub fn is_compressing(self) -> bool {
        matches!(self, Self::Deflate | Self::DeflateRaw | Self::Gzip)
    }

    /// The container framing this variant reads or writes.
    pub fn container(self) -> Container {
        match self {
            Self::Deflate | Self::Inflate => Container::Zlib,
            Self::DeflateRaw | Self::InflateRaw => Container::Raw,
            Self::Gzip | Self::Gunzip => Container::Gzip,
            Self::Unzip => Container::Auto,
        }
    }

    /// The variant that reverses this one.
    ///
    /// `unzip` maps to `gzip`; both `gunzip` and `unzip` reverse `gzip`.
    pub fn counterpart(self) -> Self {
        match self {
            Self::Deflate => Self::Inflate,
            Self::Inflate => Self::Deflate,
            Self::DeflateRaw => Self::InflateRaw,
            Self::InflateRaw => Self::DeflateRaw,
            Self::Gzip => Self::Gunzip,
            Self::Gunzip | Self::Unzip => Self::Gzip,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = ZlibError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Variant {
    type Error = ZlibError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Variant> for &'static str {
    fn from(variant: Variant) -> Self {
        variant.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_any_case() {
        assert_eq!(Variant::parse("gzip").unwrap(), Variant::Gzip);
        assert_eq!(Variant::parse("GZIP").unwrap(), Variant::Gzip);
        assert_eq!(Variant::parse("Deflate_Raw").unwrap(), Variant::DeflateRaw);
        assert_eq!("UnZip".parse::<Variant>().unwrap(), Variant::Unzip);
        for variant in Variant::ALL {
            let upper = variant.name().to_ascii_uppercase();
            assert_eq!(Variant::parse(&upper).unwrap(), variant);
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = Variant::parse("brotli").unwrap_err();
        assert!(matches!(err, ZlibError::UnrecognizedVariant { .. }));
        assert!(err.to_string().contains("unrecognized variant"));
        assert!(Variant::parse("").is_err());
        assert!(Variant::parse("deflate-raw").is_err());
    }

    #[test]
    fn test_direction_and_counterpart() {
        assert!(Variant::Deflate.is_compressing());
        assert!(Variant::Gzip.is_compressing());
        assert!(!Variant::Unzip.is_compressing());
        for variant in Variant::ALL {
            assert_ne!(variant.is_compressing(), variant.counterpart().is_compressing());
        }
        assert_eq!(Variant::Gzip.counterpart(), Variant::Gunzip);
        assert_eq!(Variant::Unzip.counterpart(), Variant::Gzip);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Variant::DeflateRaw).unwrap();
        assert_eq!(json, "\"deflate_raw\"");
        let parsed: Variant = serde_json::from_str("\"INFLATE\"").unwrap();
        assert_eq!(parsed, Variant::Inflate);
        assert!(serde_json::from_str::<Variant>("\"lz4\"").is_err());
    }
}
