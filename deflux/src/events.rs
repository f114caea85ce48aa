//! Stream lifecycle notifications.
//!
//! Each stream owns one unbounded channel of [`StreamEvent`]s. The receiving
//! half is handed out once through `events()` as an [`Events`] subscription,
//! which is a [`futures::Stream`]. Events emitted before subscribing are kept.
//! The subscription ends once the stream has been released.

use deflux_core::error::ZlibError;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// A lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Buffered output fell below the high-water mark; writing may resume.
    Drain,
    /// The stream faulted.
    Error(ZlibError),
    /// Graceful close completed.
    Finish,
    /// A downstream consumer was attached.
    Pipe,
    /// A downstream consumer was detached.
    Unpipe,
}

impl StreamEvent {
    /// The event name: `drain`, `error`, `finish`, `pipe`, or `unpipe`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Drain => "drain",
            Self::Error(_) => "error",
            Self::Finish => "finish",
            Self::Pipe => "pipe",
            Self::Unpipe => "unpipe",
        }
    }
}

/// Create the sending and receiving halves for one stream.
pub(crate) fn channel() -> (mpsc::UnboundedSender<StreamEvent>, Events) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, Events { rx })
}

/// A subscription to one stream's events.
#[derive(Debug)]
pub struct Events {
    rx: mpsc::UnboundedReceiver<StreamEvent>,
}

impl Events {
    /// Wait for the next event. `None` once the stream is gone and every
    /// event has been delivered.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<StreamEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain every queued event without waiting.
    pub fn drain_ready(&mut self) -> Vec<StreamEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Stream for Events {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
