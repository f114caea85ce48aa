//! The compression facade.
//!
//! [`Compression`] is bound to one variant and owns one [`Settings`]. It offers
//! two modes over the same settings:
//!
//! - **One-shot**: [`Compression::compress`] returns a [`Deferred`] that does
//!   the whole transform when awaited.
//! - **Streaming**: [`Compression::open`] creates a live stream, driven with
//!   `write`/`end`/`cork`/`uncork`/`destroy` and observed through `events`.
//!
//! Caller mistakes (bad payload, unknown variant, streaming call before
//! `open` or after the stream closed) are returned synchronously as `Err`.
//! Failures reported by the backend only ever arrive through the deferred
//! value or the stream's `error` event.
//!
//! # Example
//!
//! ```rust
//! use deflux::{Compression, Overrides};
//!
//! futures::executor::block_on(async {
//!     let gzip = Compression::new("gzip").unwrap();
//!     let packed = gzip.compress("test 123 test", &Overrides::new()).unwrap().await.unwrap();
//!
//!     let gunzip = Compression::new("GUNZIP").unwrap();
//!     let restored = gunzip.compress(packed, &Overrides::new()).unwrap().await.unwrap();
//!     assert_eq!(restored, b"test 123 test");
//! });
//! ```

use crate::deferred::Deferred;
use crate::engine::Engine;
use crate::events::Events;
use crate::stream::{StreamState, ZlibStream};
use deflux_core::catalog::Flush;
use deflux_core::error::{Result, ZlibError};
use deflux_core::input::Input;
use deflux_core::settings::{Overrides, Settings};
use deflux_core::variant::Variant;
use serde_json::Value;
use std::io::Write;
use tracing::debug;

enum Slot {
    Unopened,
    Live(Box<ZlibStream>),
    Closed(StreamState),
}

/// Entry point bound to one compression variant.
pub struct Compression {
    settings: Settings,
    slot: Slot,
}

impl Compression {
    /// Create a facade for `variant` with catalog defaults.
    ///
    /// The name is matched case-insensitively; unknown names are rejected.
    pub fn new(variant: &str) -> Result<Self> {
        Self::with_defaults(Settings::default(), variant)
    }

    /// Create a facade seeded with `defaults`.
    ///
    /// `variant` always replaces the variant carried by `defaults`.
    pub fn with_defaults(defaults: Settings, variant: &str) -> Result<Self> {
        let variant = Variant::parse(variant)?;
        Ok(Self::from_settings(defaults.with_variant(variant)))
    }

    /// Create a facade that uses `settings` as is.
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            settings,
            slot: Slot::Unopened,
        }
    }

    /// The persistent settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable access to the persistent settings.
    ///
    /// Changes apply to later one-shot calls and to a stream opened later;
    /// an open stream keeps the settings it was opened with.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// The variant from the persistent settings.
    pub fn variant(&self) -> Variant {
        self.settings.variant()
    }

    /// Transform `data` in one call.
    ///
    /// `overrides` apply to this call only. The payload is converted and the
    /// settings merged before returning; the transform itself runs when the
    /// returned value is awaited, processing `chunk_size` bytes at a time and
    /// yielding in between.
    pub fn compress(
        &self,
        data: impl Into<Input>,
        overrides: &Overrides,
    ) -> Result<Deferred<Vec<u8>>> {
        let bytes = data.into().into_bytes()?;
        let settings = self.settings.merge(overrides)?;
        debug!(
            variant = %settings.variant(),
            bytes = bytes.len(),
            "one-shot transform scheduled"
        );
        Ok(Deferred::new(transform(settings, bytes)))
    }

    /// [`compress`](Self::compress) for a dynamically typed payload.
    ///
    /// Only strings and arrays of byte values are accepted.
    pub fn compress_value(&self, data: Value, overrides: &Overrides) -> Result<Deferred<Vec<u8>>> {
        self.compress(Input::try_from(data)?, overrides)
    }

    /// Create the live stream.
    ///
    /// A facade opens at most one stream over its lifetime.
    ///
    /// Parameters the backend cannot honor are rejected here, synchronously.
    pub fn open(&mut self, overrides: &Overrides) -> Result<()> {
        if !matches!(self.slot, Slot::Unopened) {
            return Err(ZlibError::AlreadyOpened);
        }

        let settings = self.settings.merge(overrides)?;
        self.slot = Slot::Live(Box::new(ZlibStream::open(settings)?));
        Ok(())
    }

    /// Subscribe to the stream's lifecycle events. At most once per stream.
    pub fn events(&mut self) -> Result<Events> {
        self.live()?.events()
    }

    /// Append `chunk` to the stream's input.
    ///
    /// Resolves once the chunk was handed to the backend; while corked, that
    /// happens at `uncork` or `end`.
    pub fn write(&mut self, chunk: impl Into<Input>) -> Result<Deferred<()>> {
        let stream = self.live()?;
        let bytes = chunk.into().into_bytes()?;
        let deferred = stream.write(bytes);
        self.settle();
        Ok(deferred)
    }

    /// Write an optional final chunk and close the stream.
    ///
    /// Resolves with the output that was not read yet. The stream is
    /// released afterwards.
    pub fn end(&mut self, chunk: Option<Input>) -> Result<Deferred<Vec<u8>>> {
        let stream = self.live()?;
        let last = chunk.map(Input::into_bytes).transpose()?;
        let deferred = stream.end(last);
        self.settle();
        Ok(deferred)
    }

    /// Hold writes until [`uncork`](Self::uncork) or [`end`](Self::end).
    pub fn cork(&mut self) -> Result<()> {
        self.live()?.cork();
        Ok(())
    }

    /// Release held writes, in order.
    pub fn uncork(&mut self) -> Result<()> {
        self.live()?.uncork();
        self.settle();
        Ok(())
    }

    /// Terminate the stream.
    ///
    /// Pending writes resolve with [`ZlibError::Destroyed`]. A `reason` is
    /// also delivered as an `error` event.
    pub fn destroy(&mut self, reason: Option<&str>) -> Result<()> {
        self.live()?.destroy(reason.map(str::to_string));
        self.settle();
        Ok(())
    }

    /// Take the output produced so far.
    pub fn read(&mut self) -> Result<Vec<u8>> {
        Ok(self.live()?.read())
    }

    /// Send buffered and future output to `sink`.
    pub fn pipe(&mut self, sink: impl Write + Send + 'static) -> Result<()> {
        self.live()?.pipe(Box::new(sink))
    }

    /// Detach the downstream consumer, returning it if one was attached.
    pub fn unpipe(&mut self) -> Result<Option<Box<dyn Write + Send>>> {
        Ok(self.live()?.unpipe())
    }

    /// The live stream, for inspection. `None` before `open` and after the
    /// stream closed.
    pub fn stream(&self) -> Option<&ZlibStream> {
        match &self.slot {
            Slot::Live(stream) => Some(stream.as_ref()),
            _ => None,
        }
    }

    /// Lifecycle state of the stream.
    pub fn state(&self) -> StreamState {
        match &self.slot {
            Slot::Unopened => StreamState::Unopened,
            Slot::Live(stream) => stream.state(),
            Slot::Closed(state) => *state,
        }
    }

    fn live(&mut self) -> Result<&mut ZlibStream> {
        match &mut self.slot {
            Slot::Unopened => Err(ZlibError::StreamNotOpen),
            Slot::Closed(state) => Err(ZlibError::stream_closed(state.name())),
            Slot::Live(stream) => Ok(stream.as_mut()),
        }
    }

    /// Release the stream once it reached a terminal state.
    fn settle(&mut self) {
        if let Slot::Live(stream) = &self.slot {
            let state = stream.state();
            if state.is_terminal() {
                self.slot = Slot::Closed(state);
            }
        }
    }
}

impl std::fmt::Debug for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compression")
            .field("settings", &self.settings)
            .field("state", &self.state())
            .finish()
    }
}

/// The one-shot transform. Nothing runs until first polled.
async fn transform(settings: Settings, data: Vec<u8>) -> Result<Vec<u8>> {
    let mut engine = Engine::new(&settings)?;
    let mut output = Vec::new();

    for slice in data.chunks(settings.chunk_size()) {
        output.extend(engine.feed(slice, Flush::No)?);
        tokio::task::yield_now().await;
    }
    output.extend(engine.finish()?);

    debug!(
        variant = %settings.variant(),
        total_in = engine.total_in(),
        total_out = engine.total_out(),
        "one-shot transform complete"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deflux_core::catalog::Strategy;
    use serde_json::json;

    #[test]
    fn test_new_rejects_unknown_variant() {
        let err = Compression::new("lzma").unwrap_err();
        assert!(matches!(err, ZlibError::UnrecognizedVariant { .. }));
        assert_eq!(Compression::new("Deflate_Raw").unwrap().variant(), Variant::DeflateRaw);
    }

    #[test]
    fn test_caller_variant_wins() {
        let defaults = Settings::new(Variant::Inflate);
        let facade = Compression::with_defaults(defaults, "gzip").unwrap();
        assert_eq!(facade.variant(), Variant::Gzip);
    }

    #[test]
    fn test_settings_are_owned() {
        let mut facade = Compression::new("deflate").unwrap();
        facade.settings_mut().set_strategy(Strategy::Rle);
        assert_eq!(facade.settings().strategy(), Strategy::Rle);
    }

    #[tokio::test]
    async fn test_compress_does_not_mutate_settings() {
        let facade = Compression::new("deflate").unwrap();
        let overrides = Overrides {
            level: Some(9),
            ..Overrides::default()
        };
        facade.compress("abc", &overrides).unwrap().await.unwrap();
        assert_eq!(facade.settings().level(), -1);
    }

    #[test]
    fn test_compress_value_rejects_non_payloads() {
        let facade = Compression::new("gzip").unwrap();
        for bad in [json!(42), json!(null), json!({"data": "x"})] {
            let err = facade.compress_value(bad, &Overrides::new()).unwrap_err();
            assert!(err.is_contract_violation());
        }
        assert!(facade.compress_value(json!("ok"), &Overrides::new()).is_ok());
    }

    #[tokio::test]
    async fn test_unsupported_flush_reported_async() {
        let facade = Compression::new("deflate").unwrap();
        let overrides = Overrides {
            finish: Some(Flush::Trees),
            ..Overrides::default()
        };
        let deferred = facade.compress("abc", &overrides).unwrap();
        assert!(matches!(
            deferred.await,
            Err(ZlibError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_stream_lifecycle_states() {
        let mut facade = Compression::new("deflate").unwrap();
        assert_eq!(facade.state(), StreamState::Unopened);
        assert!(facade.stream().is_none());

        facade.open(&Overrides::new()).unwrap();
        assert_eq!(facade.state(), StreamState::Open);
        facade.cork().unwrap();
        assert_eq!(facade.state(), StreamState::Corked);
        facade.uncork().unwrap();
        assert_eq!(facade.state(), StreamState::Open);

        facade.destroy(None).unwrap();
        assert_eq!(facade.state(), StreamState::Destroyed);
        assert!(facade.stream().is_none());
        assert_eq!(
            facade.cork().unwrap_err(),
            ZlibError::stream_closed("destroyed")
        );
        assert_eq!(facade.open(&Overrides::new()).unwrap_err(), ZlibError::AlreadyOpened);
    }
}
