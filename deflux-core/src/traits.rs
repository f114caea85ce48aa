//! Core traits for streaming codecs.
//!
//! Compression backends implement [`Compressor`] or [`Decompressor`] as a
//! step API: each call consumes some input, produces some output into a
//! caller-supplied buffer, and reports what it needs next. The provided driver
//! methods run that step loop over a scratch buffer until the input is used up.

use crate::catalog::{Flush, ResultCode};
use crate::error::{Result, ZlibError};

/// Scratch buffer size used by the `*_all` convenience methods.
const SCRATCH_SIZE: usize = 32 * 1024;

/// Status of a streaming decompression step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressStatus {
    /// More input is needed to continue decompression.
    NeedsInput,
    /// More output buffer space is needed.
    NeedsOutput,
    /// The compressed stream is complete.
    Done,
}

/// Status of a streaming compression step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressStatus {
    /// More input data can be accepted.
    NeedsInput,
    /// More output buffer space is needed.
    NeedsOutput,
    /// The stream has been terminated.
    Done,
}

/// A streaming decompressor (decoder).
pub trait Decompressor {
    /// Decompress data from input to output.
    ///
    /// # Returns
    ///
    /// A tuple of (bytes consumed from input, bytes written to output, status)
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize, DecompressStatus)>;

    /// Reset the decompressor to its initial state.
    fn reset(&mut self);

    /// Check if the compressed stream has ended.
    fn is_finished(&self) -> bool;

    /// Decode `input` through `scratch`, appending the output to `out`.
    ///
    /// Returns the number of input bytes consumed. Stops early only when the
    /// compressed stream ends.
    fn decompress_into(
        &mut self,
        input: &[u8],
        scratch: &mut [u8],
        out: &mut Vec<u8>,
    ) -> Result<usize> {
        let mut input_pos = 0;

        loop {
            let (consumed, produced, status) =
                self.decompress(&input[input_pos..], scratch)?;

            input_pos += consumed;
            out.extend_from_slice(&scratch[..produced]);

            match status {
                DecompressStatus::Done => return Ok(input_pos),
                DecompressStatus::NeedsInput if input_pos >= input.len() => return Ok(input_pos),
                DecompressStatus::NeedsOutput | DecompressStatus::NeedsInput => {}
            }

            if consumed == 0 && produced == 0 {
                return Ok(input_pos);
            }
        }
    }

    /// Decompress all data at once (convenience method).
    fn decompress_all(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut buffer = vec![0u8; SCRATCH_SIZE];
        self.decompress_into(input, &mut buffer, &mut output)?;

        if !self.is_finished() {
            return Err(ZlibError::unexpected_eof());
        }
        Ok(output)
    }
}

/// A streaming compressor (encoder).
pub trait Compressor {
    /// Compress data from input to output.
    ///
    /// # Returns
    ///
    /// A tuple of (bytes consumed from input, bytes written to output, status)
    fn compress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: Flush,
    ) -> Result<(usize, usize, CompressStatus)>;

    /// Reset the compressor to its initial state.
    fn reset(&mut self);

    /// Check if the stream has been terminated.
    fn is_finished(&self) -> bool;

    /// Encode all of `input` through `scratch`, then apply `flush`, appending
    /// the output to `out`.
    ///
    /// Returns the number of input bytes consumed.
    fn compress_into(
        &mut self,
        input: &[u8],
        flush: Flush,
        scratch: &mut [u8],
        out: &mut Vec<u8>,
    ) -> Result<usize> {
        let mut input_pos = 0;

        loop {
            let (consumed, produced, status) =
                self.compress(&input[input_pos..], scratch, flush)?;

            input_pos += consumed;
            out.extend_from_slice(&scratch[..produced]);

            match status {
                CompressStatus::Done => return Ok(input_pos),
                CompressStatus::NeedsInput
                    if input_pos >= input.len() && flush != Flush::Finish =>
                {
                    return Ok(input_pos);
                }
                CompressStatus::NeedsOutput | CompressStatus::NeedsInput => {}
            }

            if consumed == 0 && produced == 0 {
                return Err(ZlibError::library(
                    ResultCode::BufError,
                    "compressor made no progress",
                ));
            }
        }
    }

    /// Compress all data at once (convenience method).
    fn compress_all(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut buffer = vec![0u8; SCRATCH_SIZE];
        self.compress_into(input, Flush::Finish, &mut buffer, &mut output)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Copies input to output, at most `step` bytes per call.
    struct Passthrough {
        step: usize,
        finished: bool,
    }

    impl Compressor for Passthrough {
        fn compress(
            &mut self,
            input: &[u8],
            output: &mut [u8],
            flush: Flush,
        ) -> Result<(usize, usize, CompressStatus)> {
            let n = input.len().min(output.len()).min(self.step);
            output[..n].copy_from_slice(&input[..n]);
            if flush == Flush::Finish && n == input.len() {
                self.finished = true;
                return Ok((n, n, CompressStatus::Done));
            }
            let status = if n == output.len() {
                CompressStatus::NeedsOutput
            } else {
                CompressStatus::NeedsInput
            };
            Ok((n, n, status))
        }

        fn reset(&mut self) {
            self.finished = false;
        }

        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    impl Decompressor for Passthrough {
        fn decompress(
            &mut self,
            input: &[u8],
            output: &mut [u8],
        ) -> Result<(usize, usize, DecompressStatus)> {
            let n = input.len().min(output.len()).min(self.step);
            output[..n].copy_from_slice(&input[..n]);
            if input.get(n) == Some(&0) {
                self.finished = true;
                return Ok((n + 1, n, DecompressStatus::Done));
            }
            Ok((n, n, DecompressStatus::NeedsInput))
        }

        fn reset(&mut self) {
            self.finished = false;
        }

        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    #[test]
    fn test_compress_driver_consumes_everything() {
        let mut codec = Passthrough {
            step: 3,
            finished: false,
        };
        let mut scratch = [0u8; 4];
        let mut out = Vec::new();
        let consumed = codec
            .compress_into(b"hello world", Flush::No, &mut scratch, &mut out)
            .unwrap();
        assert_eq!(consumed, 11);
        assert_eq!(out, b"hello world");
        assert!(!Compressor::is_finished(&codec));

        let all = codec.compress_all(b"abc").unwrap();
        assert_eq!(all, b"abc");
        assert!(Compressor::is_finished(&codec));
    }

    #[test]
    fn test_decompress_driver_stops_at_end() {
        let mut codec = Passthrough {
            step: 2,
            finished: false,
        };
        let mut scratch = [0u8; 8];
        let mut out = Vec::new();
        let consumed = codec
            .decompress_into(b"abcd\0trailing", &mut scratch, &mut out)
            .unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(out, b"abcd");
        assert!(Decompressor::is_finished(&codec));
    }

    #[test]
    fn test_decompress_all_requires_end() {
        let mut codec = Passthrough {
            step: 8,
            finished: false,
        };
        let err = codec.decompress_all(b"no terminator").unwrap_err();
        assert_eq!(err, ZlibError::unexpected_eof());
    }
}
