//! Compression (deflate) over the zlib-rs backend.
//!
//! [`Deflater`] drives a `libz-rs-sys` deflate stream through the
//! [`Compressor`] step API and writes one of three framings:
//! - zlib (`deflate`): two-byte header, Adler-32 trailer
//! - raw (`deflate_raw`): no framing
//! - gzip (`gzip`): member header, CRC-32 and size trailer
//!
//! Level, window size, memory level and strategy are all handed to the
//! backend when the stream is initialized.

use std::ffi::c_int;
use std::fmt;
use std::ptr;

use deflux_core::catalog::{Flush, ResultCode, Strategy, level, mem_level, window_bits};
use deflux_core::error::{Result, ZlibError};
use deflux_core::traits::{CompressStatus, Compressor};
use deflux_core::variant::Container;
use libz_rs_sys::{
    Z_BLOCK, Z_BUF_ERROR, Z_DEFLATED, Z_FINISH, Z_FULL_FLUSH, Z_NO_FLUSH, Z_OK, Z_PARTIAL_FLUSH,
    Z_STREAM_END, Z_SYNC_FLUSH, deflate, deflateEnd, deflateInit2_, deflateReset, z_stream,
    zlibVersion,
};

/// Tuning parameters for one deflate stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeflateParams {
    /// Compression level, `-1` for the backend default.
    pub level: i32,
    /// Window size exponent without format bits (`9..=15`).
    pub window_bits: u8,
    /// Memory level (`1..=9`).
    pub memory_level: u8,
    /// Matcher strategy.
    pub strategy: Strategy,
}

impl Default for DeflateParams {
    fn default() -> Self {
        Self {
            level: level::DEFAULT,
            window_bits: window_bits::DEFAULT,
            memory_level: mem_level::DEFAULT,
            strategy: Strategy::Default,
        }
    }
}

impl DeflateParams {
    /// Default parameters at `level`.
    pub fn with_level(level: i32) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }
}

/// Streaming compressor backed by zlib-rs.
pub struct Deflater {
    // Boxed: the backend state keeps a pointer back to its stream.
    stream: Box<z_stream>,
    container: Container,
    params: DeflateParams,
    finished: bool,
}

// SAFETY: the z_stream and the state it points to are owned exclusively by
// this value and only touched through `&mut self`.
unsafe impl Send for Deflater {}

impl Deflater {
    /// Create a compressor for `container` framing.
    ///
    /// `params.window_bits` must already be clamped to what the backend
    /// accepts (`9..=15`). Auto-detection is a decompression-only framing.
    pub fn new(container: Container, params: DeflateParams) -> Result<Self> {
        let stream = init(container, params)?;
        Ok(Self {
            stream,
            container,
            params,
            finished: false,
        })
    }

    /// The parameters the stream was initialized with.
    pub fn params(&self) -> DeflateParams {
        self.params
    }

    /// Total bytes consumed so far.
    pub fn total_in(&self) -> u64 {
        self.stream.total_in as u64
    }

    /// Total bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.stream.total_out as u64
    }
}

fn init(container: Container, params: DeflateParams) -> Result<Box<z_stream>> {
    let bits = c_int::from(params.window_bits);
    let framed_bits = match container {
        Container::Zlib => bits,
        Container::Raw => -bits,
        Container::Gzip => bits + c_int::from(window_bits::GZIP_BIT),
        Container::Auto => {
            return Err(ZlibError::unsupported(
                "auto-detected framing cannot be used for compression",
            ));
        }
    };

    // SAFETY: all-zero is the initial z_stream state: no buffers and the
    // backend's default allocator.
    let mut stream: Box<z_stream> = Box::new(unsafe { std::mem::zeroed() });

    // SAFETY: `stream` is heap allocated and never moves while the deflate
    // state refers to it; it is released in `Drop`.
    let code = unsafe {
        deflateInit2_(
            &mut *stream,
            params.level,
            Z_DEFLATED,
            framed_bits,
            c_int::from(params.memory_level),
            params.strategy.code(),
            zlibVersion(),
            std::mem::size_of::<z_stream>() as c_int,
        )
    };

    if code != Z_OK {
        return Err(ZlibError::library(
            ResultCode::from_code(code).unwrap_or(ResultCode::StreamError),
            format!("deflate initialization rejected {params:?}"),
        ));
    }
    Ok(stream)
}

/// Map a catalog flush policy to the backend's flush mode.
///
/// `trees` is an inflate-only stopping point.
pub fn backend_flush(flush: Flush) -> Result<c_int> {
    match flush {
        Flush::No => Ok(Z_NO_FLUSH),
        Flush::Partial => Ok(Z_PARTIAL_FLUSH),
        Flush::Sync => Ok(Z_SYNC_FLUSH),
        Flush::Full => Ok(Z_FULL_FLUSH),
        Flush::Finish => Ok(Z_FINISH),
        Flush::Block => Ok(Z_BLOCK),
        Flush::Trees => Err(ZlibError::unsupported(format!(
            "flush policy '{}' when compressing",
            flush.name()
        ))),
    }
}

impl Compressor for Deflater {
    fn compress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: Flush,
    ) -> Result<(usize, usize, CompressStatus)> {
        if self.finished {
            if input.is_empty() {
                return Ok((0, 0, CompressStatus::Done));
            }
            return Err(ZlibError::library(
                ResultCode::StreamError,
                "write after the compressed stream was finished",
            ));
        }

        let mode = backend_flush(flush)?;
        let before_in = self.total_in();
        let before_out = self.total_out();

        self.stream.next_in = input.as_ptr().cast_mut();
        self.stream.avail_in = u32::try_from(input.len()).unwrap_or(u32::MAX);
        self.stream.next_out = output.as_mut_ptr();
        self.stream.avail_out = u32::try_from(output.len()).unwrap_or(u32::MAX);

        // SAFETY: next_in/next_out cover `input` and `output`, which outlive
        // the call, and the pointers are cleared before returning.
        let code = unsafe { deflate(&mut *self.stream, mode) };

        self.stream.next_in = ptr::null_mut::<u8>();
        self.stream.avail_in = 0;
        self.stream.next_out = ptr::null_mut::<u8>();
        self.stream.avail_out = 0;

        let consumed = (self.total_in() - before_in) as usize;
        let produced = (self.total_out() - before_out) as usize;

        let status = match code {
            Z_STREAM_END => {
                self.finished = true;
                CompressStatus::Done
            }
            Z_OK | Z_BUF_ERROR if produced == output.len() => CompressStatus::NeedsOutput,
            Z_OK | Z_BUF_ERROR => CompressStatus::NeedsInput,
            code => {
                return Err(ZlibError::library(
                    ResultCode::from_code(code).unwrap_or(ResultCode::StreamError),
                    "deflate failed",
                ));
            }
        };

        Ok((consumed, produced, status))
    }

    fn reset(&mut self) {
        // Keeps every parameter; a gzip stream starts a fresh member header.
        // SAFETY: the stream was initialized in `new` and not yet ended.
        if unsafe { deflateReset(&mut *self.stream) } == Z_OK {
            self.finished = false;
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for Deflater {
    fn drop(&mut self) {
        // SAFETY: the stream was initialized in `new` and is ended exactly once.
        unsafe {
            deflateEnd(&mut *self.stream);
        }
    }
}

impl fmt::Debug for Deflater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deflater")
            .field("container", &self.container)
            .field("params", &self.params)
            .field("total_in", &self.total_in())
            .field("total_out", &self.total_out())
            .field("finished", &self.finished)
            .finish()
    }
}
