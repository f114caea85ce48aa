//! # Deflux Core
//!
//! Core components for the Deflux compression facade.
//!
//! This crate is backend-agnostic: it describes *what* to compress and *how*,
//! but contains no compression library.
//!
//! - [`catalog`]: Named constants for every option family
//! - [`settings`]: Tunable settings and per-operation overrides
//! - [`variant`]: The seven compress/decompress variants
//! - [`input`]: Text and byte payloads
//! - [`traits`]: Step APIs for streaming codecs
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Facade (deflux)                                         │
//! │     one-shot compress, stream open/write/end/destroy   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Engine (deflux)                                         │
//! │     zlib-rs-backed Compressor / Decompressor           │
//! ├─────────────────────────────────────────────────────────┤
//! │ Core (this crate)                                       │
//! │     Catalog, Settings, Variant, Input, traits          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use deflux_core::{Settings, Variant, catalog};
//!
//! let mut settings = Settings::new(Variant::Gzip);
//! settings.set_level(catalog::level::BEST).unwrap();
//! assert_eq!(settings.level(), 9);
//! assert_eq!(catalog::flush().get("finish"), Some(4));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod error;
pub mod input;
pub mod settings;
pub mod traits;
pub mod variant;

// Re-exports for convenience
pub use catalog::{Flush, ResultCode, Strategy};
pub use error::{Result, ZlibError};
pub use input::Input;
pub use settings::{Overrides, Settings};
pub use traits::{CompressStatus, Compressor, DecompressStatus, Decompressor};
pub use variant::{Container, Variant};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::catalog::{Flush, Strategy};
    pub use crate::error::{Result, ZlibError};
    pub use crate::input::Input;
    pub use crate::settings::{Overrides, Settings};
    pub use crate::traits::{Compressor, Decompressor};
    pub use crate::variant::Variant;
}
