//! Live compression streams.
//!
//! A [`ZlibStream`] is created by the facade's `open` and owned by it. Writes
//! reach the engine synchronously and in call order. While corked, writes are
//! queued and their deferred values stay unresolved until `uncork` or `end`.
//!
//! # State machine
//!
//! ```text
//! Open ──cork──▶ Corked ──uncork──▶ Open
//!   │               │
//!   ├──end──────────┴──▶ Ended
//!   └──destroy / fault──▶ Destroyed
//! ```
//!
//! Output is buffered until read, or written straight to a piped sink.

use crate::deferred::Deferred;
use crate::engine::Engine;
use crate::events::{self, Events, StreamEvent};
use deflux_core::error::{Result, ZlibError};
use deflux_core::settings::Settings;
use std::collections::VecDeque;
use std::fmt;
use std::io::Write;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

/// Lifecycle state of a facade's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// `open` has not been called.
    Unopened,
    /// Accepting writes.
    Open,
    /// Accepting writes, holding them until `uncork` or `end`.
    Corked,
    /// Closed gracefully.
    Ended,
    /// Terminated by `destroy` or a fault.
    Destroyed,
}

impl StreamState {
    /// Lower-case state name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unopened => "unopened",
            Self::Open => "open",
            Self::Corked => "corked",
            Self::Ended => "ended",
            Self::Destroyed => "destroyed",
        }
    }

    /// Whether no further operations are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Destroyed)
    }
}

struct PendingWrite {
    data: Vec<u8>,
    done: oneshot::Sender<Result<()>>,
}

/// A live stream bound to one variant and its effective settings.
pub struct ZlibStream {
    engine: Engine,
    settings: Settings,
    state: StreamState,
    pending: VecDeque<PendingWrite>,
    buffer: Vec<u8>,
    needs_drain: bool,
    events_tx: mpsc::UnboundedSender<StreamEvent>,
    events: Option<Events>,
    sink: Option<Box<dyn Write + Send>>,
}

impl ZlibStream {
    pub(crate) fn open(settings: Settings) -> Result<Self> {
        let engine = Engine::new(&settings)?;
        let (events_tx, events) = events::channel();
        debug!(
            variant = %settings.variant(),
            level = settings.level(),
            chunk_size = settings.chunk_size(),
            "stream opened"
        );
        Ok(Self {
            engine,
            settings,
            state: StreamState::Open,
            pending: VecDeque::new(),
            buffer: Vec::new(),
            needs_drain: false,
            events_tx,
            events: Some(events),
            sink: None,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The effective settings the stream was opened with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether writes are being held.
    pub fn is_corked(&self) -> bool {
        self.state == StreamState::Corked
    }

    /// Whether a `drain` event is owed once buffered output is read.
    pub fn needs_drain(&self) -> bool {
        self.needs_drain
    }

    /// Output bytes waiting to be read.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Writes queued while corked.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Buffered output size at which a `drain` becomes owed.
    pub fn high_water_mark(&self) -> usize {
        self.settings.chunk_size()
    }

    /// Whether a downstream consumer is attached.
    pub fn is_piped(&self) -> bool {
        self.sink.is_some()
    }

    /// Bytes accepted by the engine.
    pub fn total_in(&self) -> u64 {
        self.engine.total_in()
    }

    /// Bytes produced by the engine.
    pub fn total_out(&self) -> u64 {
        self.engine.total_out()
    }

    pub(crate) fn events(&mut self) -> Result<Events> {
        self.events.take().ok_or(ZlibError::EventsAlreadySubscribed)
    }

    pub(crate) fn write(&mut self, data: Vec<u8>) -> Deferred<()> {
        if self.state == StreamState::Corked {
            let (done, receiver) = oneshot::channel();
            trace!(bytes = data.len(), queued = self.pending.len() + 1, "write queued");
            self.pending.push_back(PendingWrite { data, done });
            return Deferred::pending(receiver);
        }

        Deferred::resolved(self.accept(&data))
    }

    pub(crate) fn cork(&mut self) {
        self.state = StreamState::Corked;
    }

    pub(crate) fn uncork(&mut self) {
        if self.state == StreamState::Corked {
            self.state = StreamState::Open;
            self.flush_pending();
        }
    }

    pub(crate) fn end(&mut self, last: Option<Vec<u8>>) -> Deferred<Vec<u8>> {
        self.uncork();
        if self.state == StreamState::Destroyed {
            return Deferred::resolved(Err(ZlibError::destroyed(
                "stream faulted while flushing corked writes",
            )));
        }

        if let Some(data) = last {
            if let Err(err) = self.accept(&data) {
                return Deferred::resolved(Err(err));
            }
        }

        let result = self.engine.finish().and_then(|out| self.emit_output(out));
        if let Err(err) = result {
            return Deferred::resolved(Err(self.fail(err)));
        }

        if let Some(mut sink) = self.sink.take() {
            if let Err(err) = sink.flush() {
                return Deferred::resolved(Err(self.fail(ZlibError::sink(&err))));
            }
            self.emit(StreamEvent::Unpipe);
        }

        self.state = StreamState::Ended;
        self.emit(StreamEvent::Finish);
        debug!(
            variant = %self.settings.variant(),
            total_in = self.engine.total_in(),
            total_out = self.engine.total_out(),
            "stream ended"
        );

        Deferred::resolved(Ok(std::mem::take(&mut self.buffer)))
    }

    pub(crate) fn destroy(&mut self, reason: Option<String>) {
        self.resolve_pending();
        self.sink = None;
        self.state = StreamState::Destroyed;
        debug!(variant = %self.settings.variant(), reason = ?reason, "stream destroyed");
        if let Some(reason) = reason {
            self.emit(StreamEvent::Error(ZlibError::destroyed(reason)));
        }
    }

    pub(crate) fn read(&mut self) -> Vec<u8> {
        let out = std::mem::take(&mut self.buffer);
        if self.needs_drain {
            self.needs_drain = false;
            self.emit(StreamEvent::Drain);
        }
        out
    }

    pub(crate) fn pipe(&mut self, mut sink: Box<dyn Write + Send>) -> Result<()> {
        self.unpipe();

        if !self.buffer.is_empty() {
            sink.write_all(&self.buffer)
                .map_err(|err| ZlibError::sink(&err))?;
            self.buffer.clear();
        }

        self.sink = Some(sink);
        self.emit(StreamEvent::Pipe);
        if self.needs_drain {
            self.needs_drain = false;
            self.emit(StreamEvent::Drain);
        }
        Ok(())
    }

    pub(crate) fn unpipe(&mut self) -> Option<Box<dyn Write + Send>> {
        let sink = self.sink.take()?;
        self.emit(StreamEvent::Unpipe);
        Some(sink)
    }

    fn accept(&mut self, data: &[u8]) -> Result<()> {
        let result = self.engine.write(data).and_then(|out| {
            trace!(bytes = data.len(), produced = out.len(), "write accepted");
            self.emit_output(out)
        });
        result.map_err(|err| self.fail(err))
    }

    fn flush_pending(&mut self) {
        while let Some(PendingWrite { data, done }) = self.pending.pop_front() {
            let result = self.accept(&data);
            let failed = result.is_err();
            let _ = done.send(result);
            if failed {
                break;
            }
        }
    }

    fn emit_output(&mut self, out: Vec<u8>) -> Result<()> {
        if out.is_empty() {
            return Ok(());
        }

        match &mut self.sink {
            Some(sink) => sink.write_all(&out).map_err(|err| ZlibError::sink(&err)),
            None => {
                self.buffer.extend_from_slice(&out);
                if self.buffer.len() >= self.high_water_mark() {
                    self.needs_drain = true;
                }
                Ok(())
            }
        }
    }

    /// Move to `Destroyed` after a runtime failure and report it.
    fn fail(&mut self, err: ZlibError) -> ZlibError {
        self.resolve_pending();
        self.sink = None;
        self.state = StreamState::Destroyed;
        debug!(variant = %self.settings.variant(), error = %err, "stream faulted");
        self.emit(StreamEvent::Error(err.clone()));
        err
    }

    fn resolve_pending(&mut self) {
        for PendingWrite { done, .. } in self.pending.drain(..) {
            let _ = done.send(Err(ZlibError::destroyed(
                "stream destroyed before the write was processed",
            )));
        }
    }

    fn emit(&self, event: StreamEvent) {
        // The subscription may have been dropped; events are then discarded.
        let _ = self.events_tx.send(event);
    }
}

impl fmt::Debug for ZlibStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZlibStream")
            .field("variant", &self.settings.variant())
            .field("state", &self.state)
            .field("pending", &self.pending.len())
            .field("buffered", &self.buffer.len())
            .field("needs_drain", &self.needs_drain)
            .field("piped", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deflux_core::catalog::Flush;
    use deflux_core::variant::Variant;
    use std::io::Read;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        flate2::read::ZlibDecoder::new(data)
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[tokio::test]
    async fn test_write_then_end() {
        let mut stream = ZlibStream::open(Settings::new(Variant::Deflate)).unwrap();
        stream.write(b"abc".to_vec()).await.unwrap();
        let tail = stream.end(Some(b"def".to_vec())).await.unwrap();

        assert_eq!(stream.state(), StreamState::Ended);
        assert_eq!(inflate(&tail), b"abcdef");
        assert_eq!(stream.total_in(), 6);
    }

    #[tokio::test]
    async fn test_cork_holds_writes() {
        let mut stream = ZlibStream::open(Settings::new(Variant::Deflate)).unwrap();
        stream.cork();
        assert!(stream.is_corked());

        let first = stream.write(b"one ".to_vec());
        let second = stream.write(b"two".to_vec());
        assert_eq!(stream.pending_writes(), 2);
        assert_eq!(stream.total_in(), 0);

        stream.uncork();
        assert_eq!(stream.pending_writes(), 0);
        assert_eq!(stream.total_in(), 7);
        first.await.unwrap();
        second.await.unwrap();

        let out = stream.end(None).await.unwrap();
        assert_eq!(inflate(&out), b"one two");
    }

    #[tokio::test]
    async fn test_destroy_resolves_pending_with_error() {
        let mut stream = ZlibStream::open(Settings::new(Variant::Gzip)).unwrap();
        let mut events = stream.events().unwrap();
        stream.cork();
        let pending = stream.write(b"never written".to_vec());

        stream.destroy(Some("caller gave up".to_string()));
        assert_eq!(stream.state(), StreamState::Destroyed);
        assert!(matches!(pending.await, Err(ZlibError::Destroyed { .. })));
        assert_eq!(
            events.try_recv(),
            Some(StreamEvent::Error(ZlibError::destroyed("caller gave up")))
        );
    }

    #[tokio::test]
    async fn test_fault_destroys_stream() {
        let mut stream = ZlibStream::open(Settings::new(Variant::Inflate)).unwrap();
        let mut events = stream.events().unwrap();

        let err = stream.write(b"not zlib at all".to_vec()).await.unwrap_err();
        assert!(!err.is_contract_violation());
        assert_eq!(stream.state(), StreamState::Destroyed);
        assert_eq!(events.try_recv(), Some(StreamEvent::Error(err)));
    }

    #[test]
    fn test_events_single_subscription() {
        let mut stream = ZlibStream::open(Settings::new(Variant::Deflate)).unwrap();
        assert!(stream.events().is_ok());
        assert_eq!(
            stream.events().unwrap_err(),
            ZlibError::EventsAlreadySubscribed
        );
    }

    #[tokio::test]
    async fn test_drain_after_high_water_mark() {
        let mut settings = Settings::new(Variant::DeflateRaw);
        settings.set_chunk_size(64).unwrap();
        settings.set_level(0).unwrap();
        settings.set_flush(Flush::Sync);
        let mut stream = ZlibStream::open(settings).unwrap();
        let mut events = stream.events().unwrap();

        stream.write(vec![7u8; 256]).await.unwrap();
        assert!(stream.needs_drain());
        assert!(stream.buffered() >= 64);

        let out = stream.read();
        assert!(out.len() >= 256);
        assert!(!stream.needs_drain());
        assert_eq!(events.try_recv(), Some(StreamEvent::Drain));
    }

    #[tokio::test]
    async fn test_pipe_and_unpipe() {
        let mut stream = ZlibStream::open(Settings::new(Variant::Deflate)).unwrap();
        let mut events = stream.events().unwrap();
        let sink = SharedSink::default();

        stream.pipe(Box::new(sink.clone())).unwrap();
        assert!(stream.is_piped());
        stream.write(b"piped data".to_vec()).await.unwrap();
        let tail = stream.end(None).await.unwrap();

        assert!(tail.is_empty());
        assert!(!stream.is_piped());
        assert_eq!(inflate(&sink.0.lock().unwrap()), b"piped data");
        assert_eq!(
            events.drain_ready(),
            vec![StreamEvent::Pipe, StreamEvent::Unpipe, StreamEvent::Finish]
        );
    }
}
