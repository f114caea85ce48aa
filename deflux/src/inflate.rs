//! Decompression (inflate) over the flate2 backend.
//!
//! [`Inflater`] adapts `flate2::Decompress` to the [`Decompressor`] step API.
//! Gzip input may hold several concatenated members; each one that follows a
//! completed member is decoded in turn, however the input is split across
//! calls. Bytes after the final member that do not start a new member are
//! discarded.

use deflux_core::catalog::ResultCode;
use deflux_core::error::{Result, ZlibError};
use deflux_core::traits::{DecompressStatus, Decompressor};
use deflux_core::variant::Container;
use flate2::{Decompress, DecompressError, FlushDecompress, Status};
use tracing::warn;

/// The two leading bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Streaming decompressor backed by flate2.
#[derive(Debug)]
pub struct Inflater {
    inner: Decompress,
    container: Container,
    window_bits: u8,
    members: usize,
    finished: bool,
    /// A lone `0x1f` seen after a completed member.
    held_magic: bool,
}

impl Inflater {
    /// Create a decompressor for `container` framing.
    ///
    /// `Container::Auto` must be resolved by the caller first, typically with
    /// [`sniff_container`].
    pub fn new(container: Container, window_bits: u8) -> Result<Self> {
        let inner = build(container, window_bits)?;
        Ok(Self {
            inner,
            container,
            window_bits,
            members: 1,
            finished: false,
            held_magic: false,
        })
    }

    /// The framing being decoded.
    pub fn container(&self) -> Container {
        self.container
    }

    /// Number of gzip members started so far (1 for other framings).
    pub fn members(&self) -> usize {
        self.members
    }

    /// Total bytes consumed by the current member.
    pub fn total_in(&self) -> u64 {
        self.inner.total_in()
    }

    /// Total bytes produced by the current member.
    pub fn total_out(&self) -> u64 {
        self.inner.total_out()
    }

    fn start_next_member(&mut self) -> Result<()> {
        self.inner = build(self.container, self.window_bits)?;
        self.members += 1;
        self.finished = false;
        Ok(())
    }

    /// Signal that no more input follows.
    ///
    /// A half-seen gzip magic byte left over after the last member is
    /// discarded.
    pub fn finish_input(&mut self) {
        if self.held_magic {
            self.held_magic = false;
            self.discard_trailing(1);
        }
    }

    /// Decide what follows a completed member.
    ///
    /// Returns `true` when a new gzip member starts, the held magic byte (if
    /// any) having been fed to it. Otherwise the input is trailing data.
    fn after_member(&mut self, input: &[u8], output: &mut [u8]) -> Result<bool> {
        if self.container != Container::Gzip {
            return Ok(false);
        }

        if self.held_magic {
            self.held_magic = false;
            if input.first() == Some(&GZIP_MAGIC[1]) {
                self.start_next_member()?;
                self.inner
                    .decompress(&GZIP_MAGIC[..1], output, FlushDecompress::None)
                    .map_err(library_error)?;
                return Ok(true);
            }
            self.discard_trailing(1);
            return Ok(false);
        }

        if input.starts_with(&GZIP_MAGIC) {
            self.start_next_member()?;
            return Ok(true);
        }
        if input == &GZIP_MAGIC[..1] {
            self.held_magic = true;
        }
        Ok(false)
    }

    fn discard_trailing(&self, trailing: usize) {
        if trailing > 0 {
            warn!(
                trailing,
                container = ?self.container,
                "discarding trailing bytes after end of compressed stream"
            );
        }
    }
}

fn build(container: Container, window_bits: u8) -> Result<Decompress> {
    match container {
        Container::Zlib => Ok(Decompress::new_with_window_bits(true, window_bits)),
        Container::Raw => Ok(Decompress::new_with_window_bits(false, window_bits)),
        Container::Gzip => Ok(Decompress::new_gzip(window_bits)),
        Container::Auto => Err(ZlibError::unsupported(
            "auto-detected framing must be resolved before decoding",
        )),
    }
}

/// Choose gzip or zlib framing from the first two bytes of the input.
pub fn sniff_container(head: &[u8]) -> Container {
    if head.starts_with(&GZIP_MAGIC) {
        Container::Gzip
    } else {
        Container::Zlib
    }
}

fn library_error(err: DecompressError) -> ZlibError {
    let code = if err.needs_dictionary().is_some() {
        ResultCode::NeedDict
    } else {
        ResultCode::DataError
    };
    ZlibError::library(code, err.to_string())
}

impl Decompressor for Inflater {
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize, DecompressStatus)> {
        if self.finished {
            if input.is_empty() {
                return Ok((0, 0, DecompressStatus::Done));
            }
            if !self.after_member(input, output)? {
                if !self.held_magic {
                    self.discard_trailing(input.len());
                }
                return Ok((input.len(), 0, DecompressStatus::Done));
            }
        }

        let before_in = self.inner.total_in();
        let before_out = self.inner.total_out();

        let status = self
            .inner
            .decompress(input, output, FlushDecompress::None)
            .map_err(library_error)?;

        let consumed = (self.inner.total_in() - before_in) as usize;
        let produced = (self.inner.total_out() - before_out) as usize;

        let status = match status {
            Status::StreamEnd => {
                self.finished = true;
                let rest = &input[consumed..];
                if self.container == Container::Gzip && rest.starts_with(&GZIP_MAGIC) {
                    self.start_next_member()?;
                    DecompressStatus::NeedsInput
                } else {
                    if self.container == Container::Gzip && rest == &GZIP_MAGIC[..1] {
                        self.held_magic = true;
                    } else {
                        self.discard_trailing(rest.len());
                    }
                    return Ok((input.len(), produced, DecompressStatus::Done));
                }
            }
            Status::Ok | Status::BufError if produced == output.len() => {
                DecompressStatus::NeedsOutput
            }
            Status::Ok | Status::BufError => DecompressStatus::NeedsInput,
        };

        Ok((consumed, produced, status))
    }

    fn reset(&mut self) {
        if let Ok(inner) = build(self.container, self.window_bits) {
            self.inner = inner;
        }
        self.members = 1;
        self.finished = false;
        self.held_magic = false;
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_inflate_zlib() {
        let mut inflater = Inflater::new(Container::Zlib, 15).unwrap();
        let decoded = inflater.decompress_all(&zlib(b"Hello, World!")).unwrap();
        assert_eq!(decoded, b"Hello, World!");
        assert!(inflater.is_finished());
    }

    #[test]
    fn test_inflate_small_output_buffer() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let compressed = zlib(&data);

        let mut inflater = Inflater::new(Container::Zlib, 15).unwrap();
        let mut scratch = [0u8; 64];
        let mut out = Vec::new();
        let consumed = inflater
            .decompress_into(&compressed, &mut scratch, &mut out)
            .unwrap();
        assert_eq!(consumed, compressed.len());
        assert_eq!(out, data);
    }

    #[test]
    fn test_inflate_multi_member_gzip() {
        let mut input = gzip(b"first ");
        input.extend(gzip(b"second"));

        let mut inflater = Inflater::new(Container::Gzip, 15).unwrap();
        let decoded = inflater.decompress_all(&input).unwrap();
        assert_eq!(decoded, b"first second");
        assert_eq!(inflater.members(), 2);
    }

    #[test]
    fn test_magic_split_across_inputs() {
        let first = gzip(b"first ");
        let second = gzip(b"second");

        let mut inflater = Inflater::new(Container::Gzip, 15).unwrap();
        let mut scratch = [0u8; 256];
        let mut out = Vec::new();
        let mut head = first.clone();
        head.push(second[0]);
        inflater.decompress_into(&head, &mut scratch, &mut out).unwrap();
        assert_eq!(out, b"first ");
        assert!(inflater.is_finished());

        inflater
            .decompress_into(&second[1..], &mut scratch, &mut out)
            .unwrap();
        inflater.finish_input();
        assert_eq!(out, b"first second");
        assert_eq!(inflater.members(), 2);
        assert!(inflater.is_finished());
    }

    #[test]
    fn test_magic_alone_between_inputs() {
        let first = gzip(b"one ");
        let second = gzip(b"two");

        let mut inflater = Inflater::new(Container::Gzip, 15).unwrap();
        let mut scratch = [0u8; 256];
        let mut out = Vec::new();
        for piece in [&first[..], &second[..1], &second[1..]] {
            inflater.decompress_into(piece, &mut scratch, &mut out).unwrap();
        }
        assert_eq!(out, b"one two");
        assert_eq!(inflater.members(), 2);
    }

    #[test]
    fn test_held_magic_then_garbage_is_discarded() {
        let mut inflater = Inflater::new(Container::Gzip, 15).unwrap();
        let mut scratch = [0u8; 256];
        let mut out = Vec::new();
        let mut head = gzip(b"only");
        head.push(0x1f);
        inflater.decompress_into(&head, &mut scratch, &mut out).unwrap();
        inflater.decompress_into(b"\x00junk", &mut scratch, &mut out).unwrap();
        assert_eq!(out, b"only");
        assert_eq!(inflater.members(), 1);

        let mut inflater = Inflater::new(Container::Gzip, 15).unwrap();
        let decoded = inflater.decompress_all(&head).unwrap();
        inflater.finish_input();
        assert_eq!(decoded, b"only");
        assert!(inflater.is_finished());
    }

    #[test]
    fn test_trailing_garbage_discarded() {
        let mut input = gzip(b"payload");
        input.extend_from_slice(b"\x00\x00junk");

        let mut inflater = Inflater::new(Container::Gzip, 15).unwrap();
        let decoded = inflater.decompress_all(&input).unwrap();
        assert_eq!(decoded, b"payload");
        assert_eq!(inflater.members(), 1);
    }

    #[test]
    fn test_invalid_data_is_data_error() {
        let mut inflater = Inflater::new(Container::Zlib, 15).unwrap();
        let err = inflater.decompress_all(b"definitely not zlib").unwrap_err();
        assert_eq!(err.code(), ResultCode::DataError);
        assert!(!err.is_contract_violation());
    }

    #[test]
    fn test_truncated_input_is_unexpected_eof() {
        let compressed = zlib(b"a fairly long message that gets cut short");
        let mut inflater = Inflater::new(Container::Zlib, 15).unwrap();
        let err = inflater
            .decompress_all(&compressed[..compressed.len() / 2])
            .unwrap_err();
        assert_eq!(err, ZlibError::unexpected_eof());
    }

    #[test]
    fn test_sniff_container() {
        assert_eq!(sniff_container(&gzip(b"x")), Container::Gzip);
        assert_eq!(sniff_container(&zlib(b"x")), Container::Zlib);
        assert_eq!(sniff_container(&[0x1f]), Container::Zlib);
        assert!(Inflater::new(Container::Auto, 15).is_err());
    }
}
