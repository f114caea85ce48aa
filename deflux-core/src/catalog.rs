//! Constants catalog for compression settings.
//!
//! The catalog names the numeric values the deflate family defines for each
//! option, so callers never handle magic numbers directly. There are seven
//! families:
//!
//! | Family        | Typed form                   | Short identifiers                          |
//! |---------------|------------------------------|--------------------------------------------|
//! | flush         | [`Flush`]                    | no, partial, sync, full, finish, block, trees |
//! | codes         | [`ResultCode`]               | ok, streamend, needdict, errno, ...        |
//! | level         | [`level`] constants          | no, speed, compression, default, min, max  |
//! | strategy      | [`Strategy`]                 | default, filtered, huffman_only, rle, fixed |
//! | window bits   | [`window_bits`] constants    | min, max, default                          |
//! | memory level  | [`mem_level`] constants      | min, max, default                          |
//! | chunk size    | [`chunk`] constants          | min, max, default                          |
//!
//! Each family is also available as a name-indexed [`Catalog`], built once on
//! first access and shared immutably afterwards.
//!
//! # Example
//!
//! ```rust
//! use deflux_core::catalog::{self, Flush};
//!
//! assert_eq!(catalog::flush().get("sync"), Some(2));
//! assert_eq!(Flush::from_name("sync"), Some(Flush::Sync));
//! assert_eq!(catalog::window_bits::DEFAULT, 15);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// The option family a [`Catalog`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Flush policies.
    Flush,
    /// Result and status codes.
    Codes,
    /// Compression levels.
    Level,
    /// Compression strategies.
    Strategy,
    /// Window size bounds.
    WindowBits,
    /// Memory level bounds.
    MemLevel,
    /// Chunk size bounds.
    Chunk,
}

/// A flat mapping from short identifiers to the values of one family.
#[derive(Debug, Clone)]
pub struct Catalog {
    family: Family,
    entries: Vec<(&'static str, i64)>,
}

impl Catalog {
    fn new(family: Family, entries: Vec<(&'static str, i64)>) -> Self {
        Self { family, entries }
    }

    /// The family this catalog describes.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Look up a value by its short identifier.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|&(_, value)| value)
    }

    /// All `(identifier, value)` pairs in declaration order.
    pub fn entries(&self) -> &[(&'static str, i64)] {
        &self.entries
    }
}

/// Flush policy passed to the compressor after a write or at close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flush {
    /// Buffer freely for the best ratio.
    #[default]
    No,
    /// Flush pending output without byte alignment.
    Partial,
    /// Flush pending output aligned to a byte boundary.
    Sync,
    /// Flush and reset the compression state.
    Full,
    /// Flush everything and terminate the stream.
    Finish,
    /// Stop at the next block boundary.
    Block,
    /// Stop after the block header trees.
    Trees,
}

impl Flush {
    /// Every flush policy in code order.
    pub const ALL: [Flush; 7] = [
        Self::No,
        Self::Partial,
        Self::Sync,
        Self::Full,
        Self::Finish,
        Self::Block,
        Self::Trees,
    ];

    /// The numeric value the deflate family uses for this policy.
    pub fn code(self) -> i32 {
        match self {
            Self::No => 0,
            Self::Partial => 1,
            Self::Sync => 2,
            Self::Full => 3,
            Self::Finish => 4,
            Self::Block => 5,
            Self::Trees => 6,
        }
    }

    /// The catalog identifier.
    pub fn name(self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Partial => "partial",
            Self::Sync => "sync",
            Self::Full => "full",
            Self::Finish => "finish",
            Self::Block => "block",
            Self::Trees => "trees",
        }
    }

    /// Resolve a numeric flush value.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    /// Resolve a catalog identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Status codes reported by the deflate family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// Success.
    Ok,
    /// The end of the compressed stream was reached.
    StreamEnd,
    /// A preset dictionary is required.
    NeedDict,
    /// A system I/O error occurred.
    Errno,
    /// The stream state or parameters are inconsistent.
    StreamError,
    /// The input data is corrupt.
    DataError,
    /// Memory could not be allocated.
    MemError,
    /// No progress was possible, e.g. input ended early.
    BufError,
    /// Library version mismatch.
    VersionError,
}

impl ResultCode {
    /// Every status code in catalog order.
    pub const ALL: [ResultCode; 9] = [
        Self::Ok,
        Self::StreamEnd,
        Self::NeedDict,
        Self::Errno,
        Self::StreamError,
        Self::DataError,
        Self::MemError,
        Self::BufError,
        Self::VersionError,
    ];

    /// The numeric status value.
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::StreamEnd => 1,
            Self::NeedDict => 2,
            Self::Errno => -1,
            Self::StreamError => -2,
            Self::DataError => -3,
            Self::MemError => -4,
            Self::BufError => -5,
            Self::VersionError => -6,
        }
    }

    /// The catalog identifier.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::StreamEnd => "streamend",
            Self::NeedDict => "needdict",
            Self::Errno => "errno",
            Self::StreamError => "streamerror",
            Self::DataError => "dataerror",
            Self::MemError => "memerror",
            Self::BufError => "buferror",
            Self::VersionError => "versionerror",
        }
    }

    /// Resolve a numeric status value.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// The conventional symbolic name, e.g. `Z_DATA_ERROR`.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Ok => "Z_OK",
            Self::StreamEnd => "Z_STREAM_END",
            Self::NeedDict => "Z_NEED_DICT",
            Self::Errno => "Z_ERRNO",
            Self::StreamError => "Z_STREAM_ERROR",
            Self::DataError => "Z_DATA_ERROR",
            Self::MemError => "Z_MEM_ERROR",
            Self::BufError => "Z_BUF_ERROR",
            Self::VersionError => "Z_VERSION_ERROR",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Compression strategy, tuning the matcher for the expected data shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// General purpose data.
    #[default]
    Default,
    /// Data produced by a filter (small values, random distribution).
    Filtered,
    /// Huffman coding only, no string matching.
    #[serde(alias = "huffman")]
    HuffmanOnly,
    /// Run-length matches only (distance one).
    Rle,
    /// Fixed Huffman codes only.
    Fixed,
}

impl Strategy {
    /// Every strategy in code order.
    pub const ALL: [Strategy; 5] = [
        Self::Default,
        Self::Filtered,
        Self::HuffmanOnly,
        Self::Rle,
        Self::Fixed,
    ];

    /// The numeric strategy value.
    pub fn code(self) -> i32 {
        match self {
            Self::Default => 0,
            Self::Filtered => 1,
            Self::HuffmanOnly => 2,
            Self::Rle => 3,
            Self::Fixed => 4,
        }
    }

    /// The catalog identifier.
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Filtered => "filtered",
            Self::HuffmanOnly => "huffman_only",
            Self::Rle => "rle",
            Self::Fixed => "fixed",
        }
    }

    /// Resolve a numeric strategy value.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Resolve a catalog identifier. `huffman` is accepted as a short form.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "huffman" {
            return Some(Self::HuffmanOnly);
        }
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

/// Compression level values.
pub mod level {
    /// Store only.
    pub const NO: i32 = 0;
    /// Fastest compression.
    pub const SPEED: i32 = 1;
    /// Best (slowest) compression.
    pub const BEST: i32 = 9;
    /// Let the library choose (level 6 in practice).
    pub const DEFAULT: i32 = -1;
    /// Smallest accepted level.
    pub const MIN: i32 = -1;
    /// Largest accepted level.
    pub const MAX: i32 = 9;
}

/// Window size exponent bounds.
pub mod window_bits {
    /// Smallest accepted window exponent.
    pub const MIN: u8 = 8;
    /// Largest accepted window exponent.
    pub const MAX: u8 = 15;
    /// Default window exponent (32 KiB).
    pub const DEFAULT: u8 = 15;
    /// Format bit selecting gzip framing.
    pub const GZIP_BIT: u8 = 16;
    /// Format bit selecting gzip/zlib auto-detection.
    pub const AUTO_BIT: u8 = 32;
}

/// Memory level bounds.
pub mod mem_level {
    /// Smallest accepted memory level.
    pub const MIN: u8 = 1;
    /// Largest accepted memory level.
    pub const MAX: u8 = 9;
    /// Default memory level.
    pub const DEFAULT: u8 = 8;
}

/// Chunk size bounds in bytes.
pub mod chunk {
    /// Smallest accepted chunk size.
    pub const MIN: usize = 64;
    /// Largest accepted chunk size (unbounded).
    pub const MAX: usize = usize::MAX;
    /// Default chunk size (16 KiB).
    pub const DEFAULT: usize = 16 * 1024;
}

/// Flush policies by identifier.
pub fn flush() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        let entries = Flush::ALL
            .iter()
            .map(|f| (f.name(), i64::from(f.code())))
            .collect();
        Catalog::new(Family::Flush, entries)
    })
}

/// Status codes by identifier.
pub fn codes() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        let entries = ResultCode::ALL
            .iter()
            .map(|c| (c.name(), i64::from(c.code())))
            .collect();
        Catalog::new(Family::Codes, entries)
    })
}

/// Compression levels by identifier.
pub fn levels() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        Catalog::new(
            Family::Level,
            vec![
                ("no", i64::from(level::NO)),
                ("speed", i64::from(level::SPEED)),
                ("compression", i64::from(level::BEST)),
                ("default", i64::from(level::DEFAULT)),
                ("min", i64::from(level::MIN)),
                ("max", i64::from(level::MAX)),
            ],
        )
    })
}

/// Strategies by identifier.
pub fn strategies() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        let entries = Strategy::ALL
            .iter()
            .map(|s| (s.name(), i64::from(s.code())))
            .collect();
        Catalog::new(Family::Strategy, entries)
    })
}

/// Window size bounds by identifier.
pub fn windows() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        Catalog::new(
            Family::WindowBits,
            vec![
                ("min", i64::from(window_bits::MIN)),
                ("max", i64::from(window_bits::MAX)),
                ("default", i64::from(window_bits::DEFAULT)),
            ],
        )
    })
}

/// Memory level bounds by identifier.
pub fn memory() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        Catalog::new(
            Family::MemLevel,
            vec![
                ("min", i64::from(mem_level::MIN)),
                ("max", i64::from(mem_level::MAX)),
                ("default", i64::from(mem_level::DEFAULT)),
            ],
        )
    })
}

/// Chunk size bounds by identifier.
pub fn chunks() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        Catalog::new(
            Family::Chunk,
            vec![
                ("min", chunk::MIN as i64),
                ("max", i64::MAX),
                ("default", chunk::DEFAULT as i64),
            ],
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_catalog() {
        let catalog = flush();
        assert_eq!(catalog.family(), Family::Flush);
        assert_eq!(catalog.get("no"), Some(0));
        assert_eq!(catalog.get("partial"), Some(1));
        assert_eq!(catalog.get("sync"), Some(2));
        assert_eq!(catalog.get("full"), Some(3));
        assert_eq!(catalog.get("finish"), Some(4));
        assert_eq!(catalog.get("block"), Some(5));
        assert_eq!(catalog.get("trees"), Some(6));
        assert_eq!(catalog.get("eager"), None);
        assert_eq!(catalog.entries().len(), 7);
    }

    #[test]
    fn test_codes_catalog() {
        let catalog = codes();
        assert_eq!(catalog.get("ok"), Some(0));
        assert_eq!(catalog.get("streamend"), Some(1));
        assert_eq!(catalog.get("needdict"), Some(2));
        assert_eq!(catalog.get("dataerror"), Some(-3));
        assert_eq!(catalog.get("versionerror"), Some(-6));
        assert_eq!(ResultCode::from_code(-5), Some(ResultCode::BufError));
        assert_eq!(ResultCode::DataError.to_string(), "Z_DATA_ERROR");
    }

    #[test]
    fn test_level_catalog() {
        let catalog = levels();
        assert_eq!(catalog.get("no"), Some(0));
        assert_eq!(catalog.get("speed"), Some(1));
        assert_eq!(catalog.get("compression"), Some(9));
        assert_eq!(catalog.get("default"), Some(-1));
    }

    #[test]
    fn test_strategy_catalog() {
        let catalog = strategies();
        assert_eq!(catalog.get("default"), Some(0));
        assert_eq!(catalog.get("huffman_only"), Some(2));
        assert_eq!(catalog.get("fixed"), Some(4));
        assert_eq!(Strategy::from_name("huffman"), Some(Strategy::HuffmanOnly));
        assert_eq!(Strategy::from_code(3), Some(Strategy::Rle));
    }

    #[test]
    fn test_bounds_catalogs() {
        assert_eq!(windows().get("min"), Some(8));
        assert_eq!(windows().get("max"), Some(15));
        assert_eq!(memory().get("default"), Some(8));
        assert_eq!(chunks().get("min"), Some(64));
        assert_eq!(chunks().get("default"), Some(16384));
        assert_eq!(chunks().get("max"), Some(i64::MAX));
    }

    #[test]
    fn test_catalog_is_shared() {
        assert!(std::ptr::eq(flush(), flush()));
        assert!(std::ptr::eq(codes(), codes()));
    }

    #[test]
    fn test_flush_roundtrip_names() {
        for policy in Flush::ALL {
            assert_eq!(Flush::from_name(policy.name()), Some(policy));
            assert_eq!(Flush::from_code(policy.code()), Some(policy));
        }
        assert_eq!(Flush::default(), Flush::No);
    }
}
