//! Tunable compression settings.
//!
//! [`Settings`] holds the eight tunable options plus the active [`Variant`].
//! Every field has a getter returning the current value and a `set_*` method
//! that validates, commits, and returns the committed value. Invalid values are
//! rejected and leave the stored value untouched.
//!
//! [`Overrides`] is the typed partial record merged on top of a `Settings` for
//! a single operation. Merging is total: a present override wins, an absent
//! one keeps the base value.
//!
//! # Example
//!
//! ```rust
//! use deflux_core::{Overrides, Settings};
//!
//! let mut settings = Settings::default();
//! assert_eq!(settings.level(), -1);
//! assert_eq!(settings.set_level(9).unwrap(), 9);
//! assert!(settings.set_level(12).is_err());
//! assert_eq!(settings.level(), 9);
//!
//! let overrides = Overrides::from_json(r#"{"level": 1}"#).unwrap();
//! let effective = settings.merge(&overrides).unwrap();
//! assert_eq!(effective.level(), 1);
//! assert_eq!(settings.level(), 9);
//! ```

use crate::catalog::{Flush, Strategy, chunk, level, mem_level, window_bits};
use crate::error::{Result, ZlibError};
use crate::variant::Variant;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Compression settings owned by one facade.
///
/// Deserializing validates every field, so a parsed `Settings` is always in
/// range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SettingsDocument")]
pub struct Settings {
    flush: Flush,
    finish: Flush,
    chunk_size: usize,
    level: i32,
    memory_level: u8,
    strategy: Strategy,
    window_bits: u8,
    variant: Variant,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            flush: Flush::No,
            finish: Flush::Finish,
            chunk_size: chunk::DEFAULT,
            level: level::DEFAULT,
            memory_level: mem_level::DEFAULT,
            strategy: Strategy::Default,
            window_bits: window_bits::DEFAULT,
            variant: Variant::Deflate,
        }
    }
}

/// Unvalidated wire form of [`Settings`].
#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsDocument {
    flush: Flush,
    finish: Flush,
    chunk_size: usize,
    level: i32,
    memory_level: u8,
    strategy: Strategy,
    window_bits: u8,
    variant: Variant,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        let Settings {
            flush,
            finish,
            chunk_size,
            level,
            memory_level,
            strategy,
            window_bits,
            variant,
        } = Settings::default();
        Self {
            flush,
            finish,
            chunk_size,
            level,
            memory_level,
            strategy,
            window_bits,
            variant,
        }
    }
}

impl TryFrom<SettingsDocument> for Settings {
    type Error = ZlibError;

    fn try_from(document: SettingsDocument) -> Result<Self> {
        let settings = Self {
            flush: document.flush,
            finish: document.finish,
            chunk_size: document.chunk_size,
            level: document.level,
            memory_level: document.memory_level,
            strategy: document.strategy,
            window_bits: document.window_bits,
            variant: document.variant,
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Settings {
    /// Catalog defaults bound to `variant`.
    pub fn new(variant: Variant) -> Self {
        Self::default().with_variant(variant)
    }

    /// Parse a settings document. Absent keys take catalog defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check every numeric field against its catalog bounds.
    pub fn validate(&self) -> Result<()> {
        check_chunk_size(self.chunk_size as u64)?;
        check_level(i64::from(self.level))?;
        check_memory_level(i64::from(self.memory_level))?;
        check_window_bits(i64::from(self.window_bits))?;
        Ok(())
    }

    /// Replace the variant, builder style.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Flush policy applied after each streaming write.
    pub fn flush(&self) -> Flush {
        self.flush
    }

    /// Set the per-write flush policy.
    pub fn set_flush(&mut self, flush: Flush) -> Flush {
        self.flush = flush;
        self.flush
    }

    /// Flush policy applied when a stream or one-shot call ends.
    pub fn finish(&self) -> Flush {
        self.finish
    }

    /// Set the end-of-input flush policy.
    pub fn set_finish(&mut self, finish: Flush) -> Flush {
        self.finish = finish;
        self.finish
    }

    /// Internal buffer granularity in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Set the chunk size. Values below [`chunk::MIN`] are rejected.
    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<usize> {
        self.chunk_size = check_chunk_size(chunk_size as u64)?;
        Ok(self.chunk_size)
    }

    /// Compression level, `-1` meaning the library default.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Set the compression level (`-1..=9`).
    pub fn set_level(&mut self, level: i32) -> Result<i32> {
        self.level = check_level(i64::from(level))?;
        Ok(self.level)
    }

    /// Memory level of the compressor.
    pub fn memory_level(&self) -> u8 {
        self.memory_level
    }

    /// Set the memory level (`1..=9`).
    pub fn set_memory_level(&mut self, memory_level: u8) -> Result<u8> {
        self.memory_level = check_memory_level(i64::from(memory_level))?;
        Ok(self.memory_level)
    }

    /// Compression strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Set the compression strategy.
    pub fn set_strategy(&mut self, strategy: Strategy) -> Strategy {
        self.strategy = strategy;
        self.strategy
    }

    /// Window size exponent, possibly carrying a format bit.
    pub fn window_bits(&self) -> u8 {
        self.window_bits
    }

    /// Set the window size exponent (`8..=15`, optionally plus 16 or 32).
    pub fn set_window_bits(&mut self, window_bits: u8) -> Result<u8> {
        self.window_bits = check_window_bits(i64::from(window_bits))?;
        Ok(self.window_bits)
    }

    /// The window size exponent without format bits.
    pub fn window_size_bits(&self) -> u8 {
        self.window_bits & 0x0f
    }

    /// Active compression variant.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Set the variant by name, ignoring case. Unknown names are rejected.
    pub fn set_variant(&mut self, name: &str) -> Result<Variant> {
        self.variant = Variant::parse(name)?;
        Ok(self.variant)
    }

    /// Dynamic accessor by field name.
    ///
    /// With `None`, returns the stored value. With a value, validates it with
    /// the same rules as [`Overrides`], commits it, and returns it. Strings are
    /// never coerced to numbers.
    pub fn field(&mut self, name: &str, value: Option<Value>) -> Result<Value> {
        if let Some(value) = value {
            let mut document = serde_json::Map::new();
            document.insert(name.to_string(), value);
            let overrides: Overrides = serde_json::from_value(Value::Object(document))?;
            *self = self.merge(&overrides)?;
        }

        let current = serde_json::to_value(&*self)?;
        current
            .get(name)
            .cloned()
            .ok_or_else(|| ZlibError::invalid_config(format!("unknown setting `{name}`")))
    }

    /// Produce the effective settings for one operation.
    ///
    /// `self` is not modified.
    pub fn merge(&self, overrides: &Overrides) -> Result<Self> {
        let mut merged = self.clone();

        if let Some(flush) = overrides.flush {
            merged.flush = flush;
        }
        if let Some(finish) = overrides.finish {
            merged.finish = finish;
        }
        if let Some(chunk_size) = overrides.chunk_size {
            merged.chunk_size = check_chunk_size(chunk_size)?;
        }
        if let Some(level) = overrides.level {
            merged.level = check_level(level)?;
        }
        if let Some(memory_level) = overrides.memory_level {
            merged.memory_level = check_memory_level(memory_level)?;
        }
        if let Some(strategy) = overrides.strategy {
            merged.strategy = strategy;
        }
        if let Some(window_bits) = overrides.window_bits {
            merged.window_bits = check_window_bits(window_bits)?;
        }
        if let Some(variant) = overrides.variant {
            merged.variant = variant;
        }

        Ok(merged)
    }
}

/// Per-operation partial settings.
///
/// Unknown keys and mistyped values (including numbers written as strings) are
/// rejected when parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Overrides {
    /// Per-write flush policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flush: Option<Flush>,
    /// End-of-input flush policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<Flush>,
    /// Chunk size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u64>,
    /// Compression level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    /// Memory level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_level: Option<i64>,
    /// Compression strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    /// Window size exponent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_bits: Option<i64>,
    /// Compression variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
}

impl Overrides {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an overrides document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether no field is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn check_chunk_size(value: u64) -> Result<usize> {
    let too_small = value < chunk::MIN as u64;
    match usize::try_from(value) {
        Ok(size) if !too_small => Ok(size),
        _ => Err(ZlibError::out_of_range(
            "chunk_size",
            i64::try_from(value).unwrap_or(i64::MAX),
            chunk::MIN as i64,
            i64::MAX,
        )),
    }
}

fn check_level(value: i64) -> Result<i32> {
    let (min, max) = (i64::from(level::MIN), i64::from(level::MAX));
    if (min..=max).contains(&value) {
        Ok(value as i32)
    } else {
        Err(ZlibError::out_of_range("level", value, min, max))
    }
}

fn check_memory_level(value: i64) -> Result<u8> {
    let (min, max) = (i64::from(mem_level::MIN), i64::from(mem_level::MAX));
    if (min..=max).contains(&value) {
        Ok(value as u8)
    } else {
        Err(ZlibError::out_of_range("memory_level", value, min, max))
    }
}

fn check_window_bits(value: i64) -> Result<u8> {
    let (min, max) = (i64::from(window_bits::MIN), i64::from(window_bits::MAX));
    let format_bits = [
        0,
        i64::from(window_bits::GZIP_BIT),
        i64::from(window_bits::AUTO_BIT),
    ];
    if format_bits
        .iter()
        .any(|bits| (min + bits..=max + bits).contains(&value))
    {
        Ok(value as u8)
    } else {
        Err(ZlibError::out_of_range(
            "window_bits",
            value,
            min,
            max + i64::from(window_bits::AUTO_BIT),
        ))
    }
}
