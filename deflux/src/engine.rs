//! Variant-driven codec engine.
//!
//! An [`Engine`] is built from effective [`Settings`] and hides which codec
//! serves the variant. Callers feed it byte chunks and receive whatever output
//! each chunk produced. Per-write and end-of-input flush policies come from the
//! settings.

use crate::deflate::{DeflateParams, Deflater, backend_flush};
use crate::inflate::{Inflater, sniff_container};
use deflux_core::catalog::{Flush, window_bits};
use deflux_core::error::{Result, ZlibError};
use deflux_core::settings::Settings;
use deflux_core::traits::{Compressor, Decompressor};
use deflux_core::variant::{Container, Variant};

enum Codec {
    Deflate(Deflater),
    Inflate(Inflater),
    /// `unzip` before the first two bytes have arrived.
    Sniffing(Vec<u8>),
}

/// A compressor or decompressor configured for one variant.
pub struct Engine {
    codec: Codec,
    variant: Variant,
    flush: Flush,
    finish: Flush,
    window_bits: u8,
    scratch: Vec<u8>,
    total_in: u64,
    total_out: u64,
}

/// The window exponent the backend is given for `settings`.
///
/// Format bits are dropped since the variant selects framing, and 8 is raised
/// to 9, the smallest window the backend accepts.
pub fn backend_window_bits(settings: &Settings) -> u8 {
    settings
        .window_size_bits()
        .clamp(window_bits::MIN + 1, window_bits::MAX)
}

impl Engine {
    /// Build the codec for `settings.variant()`.
    ///
    /// Flush policies the backend cannot honor are rejected here, before any
    /// data is processed.
    pub fn new(settings: &Settings) -> Result<Self> {
        let variant = settings.variant();
        let bits = backend_window_bits(settings);

        let codec = if variant.is_compressing() {
            backend_flush(settings.flush())?;
            backend_flush(settings.finish())?;
            let params = DeflateParams {
                level: settings.level(),
                window_bits: bits,
                memory_level: settings.memory_level(),
                strategy: settings.strategy(),
            };
            Codec::Deflate(Deflater::new(variant.container(), params)?)
        } else if variant.container() == Container::Auto {
            Codec::Sniffing(Vec::with_capacity(2))
        } else {
            Codec::Inflate(Inflater::new(variant.container(), bits)?)
        };

        Ok(Self {
            codec,
            variant,
            flush: settings.flush(),
            finish: settings.finish(),
            window_bits: bits,
            scratch: vec![0u8; settings.chunk_size().min(64 * 1024)],
            total_in: 0,
            total_out: 0,
        })
    }

    /// The variant this engine serves.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Bytes accepted so far.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Whether the compressed stream has been terminated (compressing) or
    /// fully decoded (decompressing).
    pub fn is_finished(&self) -> bool {
        match &self.codec {
            Codec::Deflate(deflater) => deflater.is_finished(),
            Codec::Inflate(inflater) => inflater.is_finished(),
            Codec::Sniffing(_) => false,
        }
    }

    /// Process one write with the per-write flush policy.
    pub fn write(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.feed(data, self.flush)
    }

    /// Process `data` with an explicit flush policy.
    ///
    /// Decompressors ignore the policy.
    pub fn feed(&mut self, data: &[u8], flush: Flush) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.total_in += data.len() as u64;

        match &mut self.codec {
            Codec::Deflate(deflater) => {
                deflater.compress_into(data, flush, &mut self.scratch, &mut out)?;
            }
            Codec::Inflate(inflater) => {
                inflater.decompress_into(data, &mut self.scratch, &mut out)?;
            }
            Codec::Sniffing(head) => {
                head.extend_from_slice(data);
                if head.len() >= 2 {
                    let buffered = std::mem::take(head);
                    self.resolve_container(&buffered, &mut out)?;
                }
            }
        }

        self.total_out += out.len() as u64;
        Ok(out)
    }

    /// Signal end of input, applying the end-of-input flush policy.
    ///
    /// For decompressors with the `finish` policy, input that ends before the
    /// compressed stream does fails with "unexpected end of file".
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();

        if let Codec::Sniffing(head) = &mut self.codec {
            let buffered = std::mem::take(head);
            self.resolve_container(&buffered, &mut out)?;
        }

        match &mut self.codec {
            Codec::Deflate(deflater) => {
                if !deflater.is_finished() {
                    deflater.compress_into(&[], self.finish, &mut self.scratch, &mut out)?;
                }
            }
            Codec::Inflate(inflater) => {
                inflater.finish_input();
                if self.finish == Flush::Finish && !inflater.is_finished() {
                    return Err(ZlibError::unexpected_eof());
                }
            }
            Codec::Sniffing(_) => {}
        }

        self.total_out += out.len() as u64;
        Ok(out)
    }

    fn resolve_container(&mut self, head: &[u8], out: &mut Vec<u8>) -> Result<()> {
        let mut inflater = Inflater::new(sniff_container(head), self.window_bits)?;
        inflater.decompress_into(head, &mut self.scratch, out)?;
        self.codec = Codec::Inflate(inflater);
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("variant", &self.variant)
            .field("flush", &self.flush)
            .field("finish", &self.finish)
            .field("total_in", &self.total_in)
            .field("total_out", &self.total_out)
            .finish_non_exhaustive()
    }
}
