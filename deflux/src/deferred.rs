//! Single-resolution deferred values.
//!
//! A [`Deferred`] is the future returned by every asynchronous facade
//! operation. It resolves exactly once: `Ok` carries the "data" signal and
//! `Err` the "error" signal.

use deflux_core::error::{Result, ZlibError};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// A boxed future resolving to `Result<T>`.
#[must_use = "a deferred value does nothing unless awaited"]
pub struct Deferred<T> {
    inner: Pin<Box<dyn Future<Output = Result<T>> + Send>>,
}

impl<T: Send + 'static> Deferred<T> {
    /// Wrap a future.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            inner: Box::pin(future),
        }
    }

    /// A value that is already resolved.
    pub fn resolved(result: Result<T>) -> Self {
        Self::new(std::future::ready(result))
    }

    /// A value resolved later through `receiver`.
    ///
    /// If the sending side is dropped first, the value resolves with
    /// [`ZlibError::Destroyed`].
    pub(crate) fn pending(receiver: oneshot::Receiver<Result<T>>) -> Self {
        Self::new(async move {
            receiver.await.unwrap_or_else(|_| {
                Err(ZlibError::destroyed(
                    "stream dropped before the operation completed",
                ))
            })
        })
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

/// The signal name a resolved value carries: `"data"` or `"error"`.
pub fn signal_name<T>(result: &Result<T>) -> &'static str {
    match result {
        Ok(_) => "data",
        Err(_) => "error",
    }
}
