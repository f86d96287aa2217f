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

use std::fs::File;
use std::io;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::result;

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, trace, warn};
use thiserror::Error;

use crate::chunks::{DataChunk, DataReaderChunk, DataSection, FmtChunk, FormatData, ListSizeField,
                    RiffChunk};
use crate::chunks::{DATA_CHUNK_BASE_OFFSET, DATA_TAG, FMT_CHUNK_SIZE, FMT_TAG, LIST_CHUNK_OFFSET,
                    LIST_TAG, MAX_RESOURCE_SIZE, RIFF_CHUNK_SIZE, RIFF_TAG, SUBCHUNK_HEADER_SIZE,
                    WAVE_TAG};
use crate::sample::{bytes_to_int, normalize, split_channels, to_signed};

// MARK: Error types

/// Represents an error that occurred while reading a wave file.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The resource is larger than a RIFF file can describe.
    #[error("resource is too large: {size} bytes")]
    ResourceTooLarge { size: u64 },
    /// A chunk tag isn't the one expected at its position.
    #[error("malformed header: expected {} but found {}", tag_name(.expected), tag_name(.found))]
    MalformedHeader { expected: [u8; 4], found: [u8; 4] },
    /// A declared chunk size disagrees with the file.
    #[error("{chunk} chunk size must be {expected} but is {found}")]
    SizeMismatch {
        chunk: &'static str,
        expected: u64,
        found: u64,
    },
    /// The file ended in the middle of the header.
    #[error("unexpected end of file")]
    UnexpectedEnd,
    /// The format information can't be used to frame samples.
    #[error("Format error: {0}")]
    InvalidFormat(#[from] FormatErrorKind),
    /// An IO error occurred.
    #[error("IO error: {0}")]
    Io(#[source] io::Error),
}

/// Represents a result when reading a wave file.
pub type ReadResult<T> = result::Result<T, ReadError>;

/// Represents a file format error, when the wave file is incorrect or unsupported.
#[derive(Debug, Error)]
pub enum FormatErrorKind {
    /// The number of channels is zero, which is invalid.
    #[error("Number of channels is zero")]
    NumChannelsIsZero,
    /// The sample rate is zero, which is invalid.
    #[error("Sample rate is zero")]
    SampleRateIsZero,
    /// The block size is zero, so samples can't be framed.
    #[error("Block size is zero")]
    BlockSizeIsZero,
    /// The block size can't be split evenly between the channels.
    #[error("Block size of {block_size} bytes doesn't divide into {channel_count} channels")]
    BlockSizeNotChannelMultiple { block_size: u16, channel_count: u16 },
    /// A typed read was requested that doesn't match the bits per sample of the file.
    #[error("Unexpected bits per sample: {0}")]
    UnexpectedBitsPerSample(u16),
}

impl From<io::Error> for ReadError {
    fn from(err: io::Error) -> ReadError {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => ReadError::UnexpectedEnd,
            _ => ReadError::Io(err),
        }
    }
}

fn tag_name(tag: &[u8; 4]) -> String {
    format!("{:?}", String::from_utf8_lossy(tag))
}

// MARK: Options

/// Knobs for parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    /// How the size of a "LIST" chunk between "fmt " and "data" is read.
    pub list_size_field: ListSizeField,
}

// MARK: Validation and parsing functions

fn validate_resource_size(size: u64) -> ReadResult<()> {
    if size > MAX_RESOURCE_SIZE {
        Err(ReadError::ResourceTooLarge { size: size })
    } else {
        Ok(())
    }
}

fn validate_format(format: &FormatData) -> ReadResult<()> {
    if format.channel_count == 0 {
        Err(FormatErrorKind::NumChannelsIsZero.into())
    } else if format.samples_per_sec == 0 {
        Err(FormatErrorKind::SampleRateIsZero.into())
    } else if format.block_size == 0 {
        Err(FormatErrorKind::BlockSizeIsZero.into())
    } else if format.block_size % format.channel_count != 0 {
        Err(FormatErrorKind::BlockSizeNotChannelMultiple {
            block_size: format.block_size,
            channel_count: format.channel_count,
        }.into())
    } else {
        Ok(())
    }
}

trait ReadChunksExt: Read + Seek {
    fn read_riff_chunk(&mut self, resource_len: u64) -> ReadResult<RiffChunk> {
        let id = self.validate_tag(RIFF_TAG)?;

        // Unlike many readers, we don't tolerate a wrong size here.
        let size = self.read_chunk_size()?;
        let expected = resource_len.saturating_sub(SUBCHUNK_HEADER_SIZE);
        if u64::from(size) != expected {
            return Err(ReadError::SizeMismatch {
                chunk: "RIFF",
                expected: expected,
                found: size.into(),
            });
        }

        let format_type = self.validate_tag(WAVE_TAG)?;

        Ok(RiffChunk {
            id: id,
            size: size,
            format_type: format_type,
        })
    }

    fn read_fmt_chunk(&mut self) -> ReadResult<FmtChunk> {
        self.seek(SeekFrom::Start(RIFF_CHUNK_SIZE))?;

        let id = self.validate_tag(FMT_TAG)?;
        let size = self.read_chunk_size()?;
        if size != FMT_CHUNK_SIZE {
            return Err(ReadError::SizeMismatch {
                chunk: "fmt ",
                expected: FMT_CHUNK_SIZE.into(),
                found: size.into(),
            });
        }

        let data = FormatData::read_from(self)?;
        validate_format(&data)?;

        Ok(FmtChunk {
            id: id,
            size: size,
            data: data,
        })
    }

    /// Returns how many bytes a "LIST" chunk right after "fmt " occupies, or 0
    /// if there is none.
    fn read_list_footprint(&mut self, list_size_field: ListSizeField) -> ReadResult<u64> {
        self.seek(SeekFrom::Start(LIST_CHUNK_OFFSET))?;

        let tag = self.read_tag()?;
        if tag != LIST_TAG {
            trace!("no LIST chunk, found {}", tag_name(&tag));
            return Ok(0);
        }

        let footprint = list_size_field.read_footprint(self)?;
        trace!("LIST chunk occupies {} bytes ({:?} size field)",
               footprint,
               list_size_field);
        Ok(footprint)
    }

    fn read_data_chunk(&mut self,
                       extra_chunk_size: u64,
                       resource_len: u64)
                       -> ReadResult<DataReaderChunk> {
        let data_chunk_offset = self.seek(SeekFrom::Start(DATA_CHUNK_BASE_OFFSET + extra_chunk_size))?;

        let id = self.validate_tag(DATA_TAG)?;
        let size = self.read_chunk_size()?;

        let section = DataSection::new(data_chunk_offset + SUBCHUNK_HEADER_SIZE,
                                       size.into(),
                                       resource_len);
        if section.available() < section.len() {
            warn!("data chunk declares {} bytes but only {} are present",
                  section.len(),
                  section.available());
        }

        Ok(DataChunk {
            id: id,
            size: size,
            data: section,
        })
    }

    fn validate_tag(&mut self, expected: [u8; 4]) -> ReadResult<[u8; 4]> {
        let tag = self.read_tag()?;
        if tag != expected {
            return Err(ReadError::MalformedHeader {
                expected: expected,
                found: tag,
            });
        }
        Ok(tag)
    }

    fn read_tag(&mut self) -> ReadResult<[u8; 4]> {
        let mut tag: [u8; 4] = [0; 4];
        self.read_exact(&mut tag)?;
        Ok(tag)
    }

    fn read_chunk_size(&mut self) -> ReadResult<u32> {
        Ok(self.read_u32::<LittleEndian>()?)
    }
}

impl<T> ReadChunksExt for T where T: Read + Seek {}

// MARK: Reader

/// Holds a fully loaded PCM wave file and hands out its samples one block at
/// a time.
///
/// The whole file is parsed and validated up front; once a reader exists, the
/// only condition left to handle while pulling samples is the end of the data
/// chunk, which the `read_*` methods report as `None`.
#[derive(Debug)]
pub struct WaveReader {
    riff_chunk: RiffChunk,
    fmt_chunk: FmtChunk,
    data_chunk: DataReaderChunk,

    // On-disk size of the optional "LIST" chunk, which shifts the "data" chunk.
    extra_chunk_size: u64,

    num_samples: u32,
    read_sample_count: u32,
    duration_seconds: u32,

    bytes: Vec<u8>,
}

impl WaveReader {
    /// Opens and parses the wave file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> ReadResult<WaveReader> {
        WaveReader::open_with_options(path, ReaderOptions::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(path: P,
                                             options: ReaderOptions)
                                             -> ReadResult<WaveReader> {
        let mut file = File::open(path)?;
        let size = file.metadata()?.len();
        validate_resource_size(size)?;

        let mut bytes = Vec::with_capacity(size as usize);
        file.read_to_end(&mut bytes)?;
        WaveReader::from_bytes_with_options(bytes, options)
    }

    /// Loads everything from `resource` and parses it.
    pub fn new<R: Read + Seek>(resource: R) -> ReadResult<WaveReader> {
        WaveReader::new_with_options(resource, ReaderOptions::default())
    }

    pub fn new_with_options<R: Read + Seek>(mut resource: R,
                                            options: ReaderOptions)
                                            -> ReadResult<WaveReader> {
        let size = resource.seek(SeekFrom::End(0))?;
        validate_resource_size(size)?;
        resource.seek(SeekFrom::Start(0))?;

        let mut bytes = Vec::with_capacity(size as usize);
        resource.read_to_end(&mut bytes)?;
        WaveReader::from_bytes_with_options(bytes, options)
    }

    /// Parses a wave file that is already in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> ReadResult<WaveReader> {
        WaveReader::from_bytes_with_options(bytes, ReaderOptions::default())
    }

    pub fn from_bytes_with_options(bytes: Vec<u8>, options: ReaderOptions) -> ReadResult<WaveReader> {
        let resource_len = bytes.len() as u64;
        validate_resource_size(resource_len)?;

        let (riff_chunk, fmt_chunk, extra_chunk_size, data_chunk) = {
            let mut cursor = Cursor::new(&bytes[..]);
            let riff_chunk = cursor.read_riff_chunk(resource_len)?;
            let fmt_chunk = cursor.read_fmt_chunk()?;
            let extra_chunk_size = cursor.read_list_footprint(options.list_size_field)?;
            let data_chunk = cursor.read_data_chunk(extra_chunk_size, resource_len)?;
            (riff_chunk, fmt_chunk, extra_chunk_size, data_chunk)
        };

        let num_samples = data_chunk.size / u32::from(fmt_chunk.data.block_size);
        let duration_seconds = num_samples / fmt_chunk.data.samples_per_sec;

        debug!("parsed wave file: {} bytes, {:?}, data at {} ({} bytes), {} samples",
               resource_len,
               fmt_chunk.data,
               data_chunk.data.begin(),
               data_chunk.size,
               num_samples);

        Ok(WaveReader {
            riff_chunk: riff_chunk,
            fmt_chunk: fmt_chunk,
            data_chunk: data_chunk,
            extra_chunk_size: extra_chunk_size,
            num_samples: num_samples,
            read_sample_count: 0,
            duration_seconds: duration_seconds,
            bytes: bytes,
        })
    }

    pub fn riff_chunk(&self) -> &RiffChunk {
        &self.riff_chunk
    }

    pub fn fmt_chunk(&self) -> &FmtChunk {
        &self.fmt_chunk
    }

    pub fn data_chunk(&self) -> &DataReaderChunk {
        &self.data_chunk
    }

    pub fn format(&self) -> &FormatData {
        &self.fmt_chunk.data
    }

    /// Number of samples the "data" chunk declares.
    pub fn num_samples(&self) -> u32 {
        self.num_samples
    }

    /// Number of samples pulled so far with the `read_*sample*` methods.
    ///
    /// Once the end of the data has been reached, this being lower than
    /// [`num_samples`](#method.num_samples) means the file was cut short.
    pub fn read_sample_count(&self) -> u32 {
        self.read_sample_count
    }

    /// Whole seconds of audio, rounded down.
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    /// Bytes taken up by a "LIST" chunk before the "data" chunk.
    pub fn extra_chunk_size(&self) -> u64 {
        self.extra_chunk_size
    }

    /// Byte offset of the first audio byte in the file.
    pub fn data_offset(&self) -> u64 {
        self.data_chunk.data.begin()
    }

    /// Complete samples left before the end of the data.
    pub fn remaining_samples(&self) -> u64 {
        self.data_chunk.data.remaining() / u64::from(self.fmt_chunk.data.block_size)
    }

    /// The audio bytes present in the file, bounded by the "data" chunk.
    pub fn data(&self) -> &[u8] {
        self.data_chunk.data.slice(&self.bytes)
    }

    /// Reads bytes of audio data at `offset` from the start of the data without
    /// moving the read position.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> usize {
        self.data_chunk.data.read_at(&self.bytes, offset, buf)
    }

    /// Moves the read position to the start of the given sample.
    pub fn seek_to_sample(&mut self, sample: u64) {
        let block_size = u64::from(self.fmt_chunk.data.block_size);
        self.data_chunk.data.set_position(sample.saturating_mul(block_size));
    }

    /// Reads the bytes of one block, i.e. one sample for every channel. Returns
    /// `None` once less than a full block is left.
    pub fn read_raw_sample(&mut self) -> Option<Vec<u8>> {
        let block_size = usize::from(self.fmt_chunk.data.block_size);
        if self.data_chunk.data.remaining() < block_size as u64 {
            return None;
        }

        let mut block = vec![0u8; block_size];
        self.data_chunk.data.read(&self.bytes, &mut block);
        self.read_sample_count += 1;
        Some(block)
    }

    /// Reads one sample per channel, scaled by
    /// [`normalize`](crate::sample::normalize).
    pub fn read_sample(&mut self) -> Option<Vec<f64>> {
        let bits_per_sample = self.fmt_chunk.data.bits_per_sample;
        self.read_channels(|raw| normalize(raw, bits_per_sample))
    }

    /// Reads one sample per channel as the unsigned value of its bytes.
    pub fn read_sample_as_int(&mut self) -> Option<Vec<i32>> {
        self.read_channels(|raw| raw)
    }

    /// Reads one sample per channel from an 8-bit file.
    pub fn read_sample_u8(&mut self) -> ReadResult<Option<Vec<u8>>> {
        self.expect_bits_per_sample(8)?;
        Ok(self.read_channels(|raw| raw as u8))
    }

    /// Reads one sample per channel from a 16-bit file.
    pub fn read_sample_i16(&mut self) -> ReadResult<Option<Vec<i16>>> {
        self.expect_bits_per_sample(16)?;
        Ok(self.read_channels(|raw| to_signed(raw, 16) as i16))
    }

    /// Reads interleaved 8-bit samples into `buf`, whole blocks at a time.
    /// Returns the number of values stored.
    pub fn read_samples_as_u8(&mut self, buf: &mut [u8]) -> ReadResult<usize> {
        self.read_samples(buf, |wave_reader| wave_reader.read_sample_u8())
    }

    /// Reads interleaved 16-bit samples into `buf`, whole blocks at a time.
    /// Returns the number of values stored.
    pub fn read_samples_as_i16(&mut self, buf: &mut [i16]) -> ReadResult<usize> {
        self.read_samples(buf, |wave_reader| wave_reader.read_sample_i16())
    }

    fn read_samples<F, S>(&mut self, buf: &mut [S], read_sample_impl: F) -> ReadResult<usize>
        where F: Fn(&mut Self) -> ReadResult<Option<Vec<S>>>
    {
        let channel_count = usize::from(self.fmt_chunk.data.channel_count);
        let mut successfully_read = 0;

        for frame in buf.chunks_mut(channel_count) {
            if frame.len() < channel_count {
                break;
            }
            match read_sample_impl(self)? {
                Some(sample) => {
                    for (out, value) in frame.iter_mut().zip(sample) {
                        *out = value;
                        successfully_read += 1;
                    }
                }
                None => break,
            }
        }

        Ok(successfully_read)
    }

    fn read_channels<F, S>(&mut self, convert: F) -> Option<Vec<S>>
        where F: Fn(i32) -> S
    {
        let channel_count = usize::from(self.fmt_chunk.data.channel_count);
        let block = self.read_raw_sample()?;
        Some(split_channels(&block, channel_count)
            .map(|bytes| convert(bytes_to_int(bytes)))
            .collect())
    }

    fn expect_bits_per_sample(&self, bits_per_sample: u16) -> ReadResult<()> {
        let actual = self.fmt_chunk.data.bits_per_sample;
        if actual != bits_per_sample {
            return Err(FormatErrorKind::UnexpectedBitsPerSample(actual).into());
        }
        Ok(())
    }
}

/// Reads raw audio bytes from the current position. Doesn't count samples.
impl Read for WaveReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.data_chunk.data.read(&self.bytes, buf))
    }
}

/// Seeks within the audio data; position 0 is the first audio byte.
impl Seek for WaveReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let section = &mut self.data_chunk.data;
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => offset_by(section.available(), delta),
            SeekFrom::Current(delta) => offset_by(section.position(), delta),
        };

        match target {
            Some(position) => {
                section.set_position(position);
                Ok(section.position())
            }
            None => Err(io::Error::new(io::ErrorKind::InvalidInput,
                                       "seek before the start of the audio data")),
        }
    }
}

fn offset_by(base: u64, delta: i64) -> Option<u64> {
    if delta >= 0 {
        base.checked_add(delta as u64)
    } else {
        base.checked_sub(delta.unsigned_abs())
    }
}

// MARK: Tests
