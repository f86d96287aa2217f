// wave-codec -- Reading and writing of RIFF/WAVE PCM files.
// Copyright (c) 2016 The wave-codec project authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io;
use std::io::Write;
use std::result;

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;
use thiserror::Error;

use crate::chunks::{DataWriterChunk, FmtChunk, FormatData, RiffChunk};
use crate::chunks::{DATA_CHUNK_BASE_OFFSET, MAX_RESOURCE_SIZE, SUBCHUNK_HEADER_SIZE, WAVE_TAG};

// MARK: Error types

#[derive(Debug, Error)]
pub enum WriteError {
    /// The writer was configured with unsupported parameters.
    #[error("Format error: {0}")]
    Format(#[from] WriteErrorKind),
    /// The bytes handed to the writer don't make up whole samples.
    #[error("Invalid write: {0}")]
    InvalidWrite(InvalidWriteKind),
    /// The requested operation isn't available.
    #[error("{0} is not implemented")]
    Unimplemented(&'static str),
    /// An IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Represents a result when writing a wave file.
pub type WriteResult<T> = result::Result<T, WriteError>;

/// Represents a file format error, when incorrect parameters have been specified.
#[derive(Debug, Error)]
pub enum WriteErrorKind {
    /// The number of channels is zero, which is invalid.
    #[error("Number of channels is zero")]
    NumChannelsIsZero,
    /// The sample rate is zero, which is invalid.
    #[error("Sample rate is zero")]
    SampleRateIsZero,
    /// Only 8-bit, 16-bit, 24-bit and 32-bit PCM files are supported.
    #[error("Unsupported bits per sample: {0}")]
    UnsupportedBitsPerSample(u16),
    /// A block of `channels` samples at this bit depth needs more than 65535 bytes.
    #[error("Block size of {channels} channels at {bits_per_sample} bits doesn't fit in 16 bits")]
    BlockSizeTooLarge { channels: u16, bits_per_sample: u16 },
    /// The byte rate needs more than 32 bits.
    #[error("Byte rate of {block_size}-byte blocks at {sample_rate} Hz doesn't fit in 32 bits")]
    ByteRateTooLarge { block_size: u16, sample_rate: u32 },
}

#[derive(Debug, Error)]
pub enum InvalidWriteKind {
    #[error("writing data needs at least {block_size} bytes, got {len}")]
    ShorterThanBlock { len: usize, block_size: usize },
    #[error("writing data must be a multiple of {block_size} bytes, got {len}")]
    NotBlockAligned { len: usize, block_size: usize },
    #[error("audio data would grow to {len} bytes, more than a wave file can hold")]
    PayloadTooLarge { len: u64 },
}

// Everything in front of the audio data: RIFF header, "fmt " chunk and the
// "data" tag and size.
const HEADER_SIZE: u64 = DATA_CHUNK_BASE_OFFSET + SUBCHUNK_HEADER_SIZE;

const MAX_PAYLOAD_SIZE: u64 = MAX_RESOURCE_SIZE - HEADER_SIZE;

// MARK: Configuration

/// The shape of the audio a [`WaveWriter`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WriterConfig {
    pub fn new(channels: u16, sample_rate: u32, bits_per_sample: u16) -> WriterConfig {
        WriterConfig {
            channels: channels,
            sample_rate: sample_rate,
            bits_per_sample: bits_per_sample,
        }
    }

    fn validate(&self) -> WriteResult<FormatData> {
        if self.channels == 0 {
            return Err(WriteErrorKind::NumChannelsIsZero.into());
        } else if self.sample_rate == 0 {
            return Err(WriteErrorKind::SampleRateIsZero.into());
        } else if self.bits_per_sample != 8 && self.bits_per_sample != 16 &&
                  self.bits_per_sample != 24 && self.bits_per_sample != 32 {
            return Err(WriteErrorKind::UnsupportedBitsPerSample(self.bits_per_sample).into());
        }

        let block_size = (self.bits_per_sample / 8).checked_mul(self.channels).ok_or(
            WriteErrorKind::BlockSizeTooLarge {
                channels: self.channels,
                bits_per_sample: self.bits_per_sample,
            })?;
        FormatData::pcm(self.channels, self.sample_rate, self.bits_per_sample).ok_or_else(|| {
            WriteErrorKind::ByteRateTooLarge {
                block_size: block_size,
                sample_rate: self.sample_rate,
            }.into()
        })
    }
}

// MARK: Writing functions

/// Helper struct that takes ownership of a writer and can be used to write data
/// to a PCM wave file.
///
/// Samples are kept in memory until [`close`](#method.close) or
/// [`finish`](#method.finish), which is when the sizes are known and the whole
/// file gets written out in one go.
#[derive(Debug)]
pub struct WaveWriter<W>
    where W: Write
{
    // Where the finished file goes.
    out: W,

    written_samples: u64,

    riff_chunk: RiffChunk,
    fmt_chunk: FmtChunk,
    data_chunk: DataWriterChunk,
}

impl<W> WaveWriter<W>
    where W: Write
{
    /// Returns a new wave writer for the given writer. Nothing is written to it
    /// until the wave writer is closed.
    pub fn new(out: W, config: WriterConfig) -> WriteResult<WaveWriter<W>> {
        let format = config.validate()?;

        Ok(WaveWriter {
            out: out,
            written_samples: 0,
            riff_chunk: RiffChunk::wave(),
            fmt_chunk: FmtChunk::new(format),
            data_chunk: DataWriterChunk::empty(),
        })
    }

    pub fn format(&self) -> &FormatData {
        &self.fmt_chunk.data
    }

    /// Number of whole samples (blocks) accepted so far.
    pub fn written_samples(&self) -> u64 {
        self.written_samples
    }

    /// Number of audio bytes buffered so far.
    pub fn payload_len(&self) -> usize {
        self.data_chunk.data.len()
    }

    /// Writes 8-bit samples, interleaved by channel.
    pub fn write_samples_u8(&mut self, samples: &[u8]) -> WriteResult<usize> {
        let mut buf = Vec::with_capacity(samples.len());
        for &sample in samples {
            buf.write_u8(sample)?;
        }
        self.write_raw(&buf)
    }

    /// Writes 16-bit samples, interleaved by channel.
    pub fn write_samples_i16(&mut self, samples: &[i16]) -> WriteResult<usize> {
        let mut buf = Vec::with_capacity(samples.len() * 2);
        for &sample in samples {
            buf.write_i16::<LittleEndian>(sample)?;
        }
        self.write_raw(&buf)
    }

    /// 24-bit samples can't be written yet; this always fails.
    pub fn write_samples_i24(&mut self, _samples: &[i32]) -> WriteResult<usize> {
        Err(WriteError::Unimplemented("writing 24-bit samples"))
    }

    /// Appends encoded audio bytes. They have to make up whole blocks; nothing
    /// is kept if they don't. Returns the number of bytes taken.
    pub fn write_raw(&mut self, bytes: &[u8]) -> WriteResult<usize> {
        let block_size = usize::from(self.fmt_chunk.data.block_size);
        if bytes.len() < block_size {
            return Err(WriteError::InvalidWrite(InvalidWriteKind::ShorterThanBlock {
                len: bytes.len(),
                block_size: block_size,
            }));
        }
        if bytes.len() % block_size != 0 {
            return Err(WriteError::InvalidWrite(InvalidWriteKind::NotBlockAligned {
                len: bytes.len(),
                block_size: block_size,
            }));
        }

        let new_len = (self.data_chunk.data.len() + bytes.len()) as u64;
        if new_len > MAX_PAYLOAD_SIZE {
            return Err(WriteError::InvalidWrite(InvalidWriteKind::PayloadTooLarge { len: new_len }));
        }

        self.data_chunk.data.extend_from_slice(bytes);
        self.written_samples += (bytes.len() / block_size) as u64;
        Ok(bytes.len())
    }

    /// Writes out the file and closes the underlying writer.
    pub fn close(self) -> WriteResult<()> {
        self.finish().map(|_| ())
    }

    /// Writes out the file, flushes the underlying writer and hands it back.
    ///
    /// The writer is flushed even if writing failed, but the write error is
    /// the one reported.
    pub fn finish(mut self) -> WriteResult<W> {
        let data_size = self.data_chunk.data.len() as u32;
        let subchunk_header_size = SUBCHUNK_HEADER_SIZE as u32;
        self.riff_chunk.size = WAVE_TAG.len() as u32 + (subchunk_header_size + self.fmt_chunk.size) +
                               (subchunk_header_size + data_size);
        self.data_chunk.size = data_size;

        debug!("writing wave file: {:?}, {} samples, {} data bytes",
               self.fmt_chunk.data,
               self.written_samples,
               data_size);

        let written = self.write_chunks();
        let flushed = self.out.flush();
        written?;
        flushed?;

        Ok(self.out)
    }

    fn write_chunks(&mut self) -> io::Result<()> {
        self.riff_chunk.write_to(&mut self.out)?;
        self.fmt_chunk.write_to(&mut self.out)?;
        self.data_chunk.write_header_to(&mut self.out)?;
        self.out.write_all(&self.data_chunk.data)
    }
}

// MARK: Tests
