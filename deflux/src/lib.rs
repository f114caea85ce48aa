//! # Deflux
//!
//! One-shot and streaming deflate/gzip compression behind a small settings
//! object. The zlib-rs backend does the work: compression through `libz-rs-sys`,
//! decompression through [`flate2`].
//!
//! ## Variants
//!
//! | Variant       | Direction  | Framing             |
//! |---------------|------------|---------------------|
//! | `deflate`     | compress   | zlib                |
//! | `deflate_raw` | compress   | none                |
//! | `gzip`        | compress   | gzip                |
//! | `inflate`     | decompress | zlib                |
//! | `inflate_raw` | decompress | none                |
//! | `gunzip`      | decompress | gzip (multi-member) |
//! | `unzip`       | decompress | gzip or zlib        |
//!
//! ## Example
//!
//! ```rust
//! use deflux::{Compression, Input, Overrides, StreamState};
//!
//! futures::executor::block_on(async {
//!     let mut deflate = Compression::new("deflate").unwrap();
//!     deflate.settings_mut().set_level(9).unwrap();
//!     deflate.open(&Overrides::new()).unwrap();
//!
//!     deflate.write("abc").unwrap().await.unwrap();
//!     let packed = deflate.end(Some(Input::from("def"))).unwrap().await.unwrap();
//!     assert_eq!(deflate.state(), StreamState::Ended);
//!
//!     let inflate = Compression::new("inflate").unwrap();
//!     let restored = inflate.compress(packed, &Overrides::new()).unwrap().await.unwrap();
//!     assert_eq!(restored, b"abcdef");
//! });
//! ```
//!
//! ## Logging
//!
//! Stream lifecycle and one-shot completion are reported through [`tracing`]
//! at `debug` level, individual writes at `trace`. No subscriber is installed.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod deferred;
pub mod deflate;
pub mod engine;
pub mod events;
pub mod facade;
pub mod inflate;
pub mod plugin;
pub mod stream;

// Re-exports
pub use deferred::{Deferred, signal_name};
pub use deflate::{DeflateParams, Deflater};
pub use engine::Engine;
pub use events::{Events, StreamEvent};
pub use facade::Compression;
pub use inflate::Inflater;
pub use plugin::ZlibPlugin;
pub use stream::{StreamState, ZlibStream};

pub use deflux_core::{
    Flush, Input, Overrides, ResultCode, Settings, Strategy, Variant, ZlibError, catalog,
};
pub use deflux_core::error::Result;

/// One-shot transform with default settings.
///
/// Shorthand for `Compression::new(variant)?.compress(data, &Overrides::new())`.
pub fn compress(variant: &str, data: impl Into<Input>) -> Result<Deferred<Vec<u8>>> {
    Compression::new(variant)?.compress(data, &Overrides::new())
}
