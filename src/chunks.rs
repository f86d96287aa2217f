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

//! The chunks that make up a PCM wave file, and where they live in it.

use std::io;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

// MARK: Tags and layout

pub const RIFF_TAG: [u8; 4] = *b"RIFF";
pub const WAVE_TAG: [u8; 4] = *b"WAVE";
pub const FMT_TAG: [u8; 4] = *b"fmt ";
pub const LIST_TAG: [u8; 4] = *b"LIST";
pub const DATA_TAG: [u8; 4] = *b"data";

/// Files larger than this can't be described by the 32-bit RIFF size field.
pub const MAX_RESOURCE_SIZE: u64 = 1 << 32;

/// "RIFF", chunk size and "WAVE".
pub const RIFF_CHUNK_SIZE: u64 = 12;

/// The only "fmt " payload size we accept or produce.
pub const FMT_CHUNK_SIZE: u32 = 16;

/// Tag plus size field that precede every subchunk payload.
pub const SUBCHUNK_HEADER_SIZE: u64 = 8;

/// Where an optional "LIST" chunk starts: right after the RIFF header and the
/// 24 bytes of the "fmt " chunk.
pub const LIST_CHUNK_OFFSET: u64 = RIFF_CHUNK_SIZE + SUBCHUNK_HEADER_SIZE + FMT_CHUNK_SIZE as u64;

/// Where the "data" chunk starts when there is no "LIST" chunk.
pub const DATA_CHUNK_BASE_OFFSET: u64 = LIST_CHUNK_OFFSET;

pub const FORMAT_UNCOMPRESSED_PCM: u16 = 1;

// MARK: RIFF header

/// The master chunk at the start of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiffChunk {
    pub id: [u8; 4],
    /// Size of the rest of the file, i.e. the file size minus 8 bytes.
    pub size: u32,
    pub format_type: [u8; 4],
}

impl RiffChunk {
    /// A header for a wave file whose size is not known yet.
    pub fn wave() -> RiffChunk {
        RiffChunk {
            id: RIFF_TAG,
            size: 0,
            format_type: WAVE_TAG,
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.id)?;
        out.write_u32::<LittleEndian>(self.size)?;
        out.write_all(&self.format_type)
    }
}

// MARK: "fmt " chunk

/// The 16 bytes of PCM format information carried by the "fmt " chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatData {
    pub wave_format_type: u16,
    pub channel_count: u16,
    pub samples_per_sec: u32,
    pub bytes_per_sec: u32,
    pub block_size: u16,
    pub bits_per_sample: u16,
}

impl FormatData {
    /// Builds the format for uncompressed PCM, deriving the block size and the
    /// byte rate from the other fields. Returns `None` if the block size doesn't
    /// fit in 16 bits or the byte rate doesn't fit in 32 bits.
    pub fn pcm(channel_count: u16, samples_per_sec: u32, bits_per_sample: u16) -> Option<FormatData> {
        let block_size = (bits_per_sample / 8).checked_mul(channel_count)?;
        let bytes_per_sec = u32::from(block_size).checked_mul(samples_per_sec)?;
        Some(FormatData {
            wave_format_type: FORMAT_UNCOMPRESSED_PCM,
            channel_count: channel_count,
            samples_per_sec: samples_per_sec,
            bytes_per_sec: bytes_per_sec,
            block_size: block_size,
            bits_per_sample: bits_per_sample,
        })
    }

    /// Number of bytes used by a single channel inside a block.
    pub fn bytes_per_channel(&self) -> usize {
        if self.channel_count == 0 {
            0
        } else {
            usize::from(self.block_size) / usize::from(self.channel_count)
        }
    }

    pub fn read_from<R: Read + ?Sized>(input: &mut R) -> io::Result<FormatData> {
        Ok(FormatData {
            wave_format_type: input.read_u16::<LittleEndian>()?,
            channel_count: input.read_u16::<LittleEndian>()?,
            samples_per_sec: input.read_u32::<LittleEndian>()?,
            bytes_per_sec: input.read_u32::<LittleEndian>()?,
            block_size: input.read_u16::<LittleEndian>()?,
            bits_per_sample: input.read_u16::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u16::<LittleEndian>(self.wave_format_type)?;
        out.write_u16::<LittleEndian>(self.channel_count)?;
        out.write_u32::<LittleEndian>(self.samples_per_sec)?;
        out.write_u32::<LittleEndian>(self.bytes_per_sec)?;
        out.write_u16::<LittleEndian>(self.block_size)?;
        out.write_u16::<LittleEndian>(self.bits_per_sample)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FmtChunk {
    pub id: [u8; 4],
    pub size: u32,
    pub data: FormatData,
}

impl FmtChunk {
    pub fn new(data: FormatData) -> FmtChunk {
        FmtChunk {
            id: FMT_TAG,
            size: FMT_CHUNK_SIZE,
            data: data,
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.id)?;
        out.write_u32::<LittleEndian>(self.size)?;
        self.data.write_to(out)
    }
}

// MARK: "LIST" chunk

/// How the size of a "LIST" chunk placed between "fmt " and "data" is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSizeField {
    /// A single size byte directly after the tag, kept as the default for
    /// compatibility with files that use this narrower size field.
    SingleByte,
    /// The usual 4-byte little-endian chunk size, with a pad byte after odd
    /// sized payloads.
    Standard,
}

impl Default for ListSizeField {
    fn default() -> ListSizeField {
        ListSizeField::SingleByte
    }
}

impl ListSizeField {
    /// Reads the size field that follows a "LIST" tag and returns the number of
    /// bytes the whole chunk occupies on disk, header included.
    pub fn read_footprint<R: Read + ?Sized>(self, input: &mut R) -> io::Result<u64> {
        match self {
            ListSizeField::SingleByte => {
                let size = input.read_u8()?;
                Ok(u64::from(size) + SUBCHUNK_HEADER_SIZE)
            }
            ListSizeField::Standard => {
                let size = u64::from(input.read_u32::<LittleEndian>()?);
                Ok(size + (size & 1) + SUBCHUNK_HEADER_SIZE)
            }
        }
    }
}

// MARK: "data" chunk

/// The "data" chunk. Readers keep a [`DataSection`] pointing into the loaded
/// file; writers keep the encoded samples themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunk<D> {
    pub id: [u8; 4],
    pub size: u32,
    pub data: D,
}

pub type DataReaderChunk = DataChunk<DataSection>;
pub type DataWriterChunk = DataChunk<Vec<u8>>;

impl DataWriterChunk {
    pub fn empty() -> DataWriterChunk {
        DataChunk {
            id: DATA_TAG,
            size: 0,
            data: Vec::new(),
        }
    }

    /// Writes the tag and size; the payload follows separately.
    pub fn write_header_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.id)?;
        out.write_u32::<LittleEndian>(self.size)
    }
}

/// A bounded window over the audio payload of a loaded file.
///
/// The window covers the declared size of the "data" chunk, starting at
/// `begin`. `available` can be smaller than `len` when the file was cut short.
/// Positions are relative to `begin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSection {
    begin: u64,
    len: u64,
    available: u64,
    position: u64,
}

impl DataSection {
    pub fn new(begin: u64, len: u64, resource_len: u64) -> DataSection {
        let available = resource_len.saturating_sub(begin).min(len);
        DataSection {
            begin: begin,
            len: len,
            available: available,
            position: 0,
        }
    }

    /// Absolute offset of the first payload byte.
    pub fn begin(&self) -> u64 {
        self.begin
    }

    /// Declared length of the payload.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes of the payload actually present in the resource.
    pub fn available(&self) -> u64 {
        self.available
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn remaining(&self) -> u64 {
        self.available.saturating_sub(self.position)
    }

    /// Moves the cursor, clamping it to the available bytes.
    pub fn set_position(&mut self, position: u64) {
        self.position = position.min(self.available);
    }

    /// The part of `source` this section covers. Empty if `source` is too
    /// short to hold it.
    pub fn slice<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        let begin = self.begin as usize;
        source.get(begin..begin + self.available as usize).unwrap_or(&[])
    }

    /// Copies bytes starting at `offset` without touching the cursor.
    pub fn read_at(&self, source: &[u8], offset: u64, buf: &mut [u8]) -> usize {
        let data = match self.slice(source).get(offset as usize..) {
            Some(data) => data,
            None => return 0,
        };
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        n
    }

    /// Copies bytes from the cursor and advances it.
    pub fn read(&mut self, source: &[u8], buf: &mut [u8]) -> usize {
        let n = self.read_at(source, self.position, buf);
        self.position += n as u64;
        n
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{DataSection, FmtChunk, FormatData, ListSizeField, RiffChunk};

    #[test]
    fn test_pcm_format_derives_block_size_and_byte_rate() {
        let format = FormatData::pcm(2, 44100, 16).unwrap();
        assert_eq!(4, format.block_size);
        assert_eq!(176400, format.bytes_per_sec);
        assert_eq!(2, format.bytes_per_channel());

        let format = FormatData::pcm(1, 8000, 8).unwrap();
        assert_eq!(1, format.block_size);
        assert_eq!(8000, format.bytes_per_sec);
    }

    #[test]
    fn test_pcm_format_rejects_overflowing_sizes() {
        assert_eq!(None, FormatData::pcm(16384, 8000, 32));
        assert_eq!(None, FormatData::pcm(2, 2_000_000_000, 16));
        assert_eq!(Some(65532), FormatData::pcm(16383, 1, 32).map(|format| format.block_size));
    }

    #[test]
    fn test_fmt_chunk_layout() {
        let mut out = Vec::new();
        FmtChunk::new(FormatData::pcm(1, 44100, 8).unwrap()).write_to(&mut out).unwrap();
        assert_eq!(&b"fmt \x10\x00\x00\x00\
                      \x01\x00\
                      \x01\x00\
                      \x44\xAC\x00\x00\
                      \x44\xAC\x00\x00\
                      \x01\x00\
                      \x08\x00"[..],
                   &out[..]);
    }

    #[test]
    fn test_format_data_reads_fields_in_order() {
        let mut data = Cursor::new(b"\x01\x00\x02\x00\x40\x1F\x00\x00\x00\x7D\x00\x00\x04\x00\x10\x00");
        let format = FormatData::read_from(&mut data).unwrap();
        assert_eq!(FormatData::pcm(2, 8000, 16), Some(format));
    }

    #[test]
    fn test_riff_header_layout() {
        let mut riff = RiffChunk::wave();
        riff.size = 36;
        let mut out = Vec::new();
        riff.write_to(&mut out).unwrap();
        assert_eq!(&b"RIFF\x24\x00\x00\x00WAVE"[..], &out[..]);
    }

    #[test]
    fn test_list_footprint_single_byte() {
        let mut data = Cursor::new(b"\x1A\x00\x00\x00");
        assert_eq!(34, ListSizeField::SingleByte.read_footprint(&mut data).unwrap());
        assert_eq!(1, data.position());
    }

    #[test]
    fn test_list_footprint_standard_pads_odd_sizes() {
        let mut data = Cursor::new(b"\x1A\x01\x00\x00");
        assert_eq!(8 + 282, ListSizeField::Standard.read_footprint(&mut data).unwrap());

        let mut data = Cursor::new(b"\x05\x00\x00\x00");
        assert_eq!(8 + 6, ListSizeField::Standard.read_footprint(&mut data).unwrap());
    }

    #[test]
    fn test_data_section_is_bounded() {
        let source = b"0123456789ABCDEF";
        let mut section = DataSection::new(4, 8, source.len() as u64);
        assert_eq!(b"456789AB", section.slice(source));

        let mut buf = [0u8; 5];
        assert_eq!(5, section.read(source, &mut buf));
        assert_eq!(b"45678", &buf);
        assert_eq!(3, section.read(source, &mut buf));
        assert_eq!(b"9AB", &buf[..3]);
        assert_eq!(0, section.read(source, &mut buf));
        assert_eq!(0, section.remaining());
    }

    #[test]
    fn test_data_section_with_foreign_buffer() {
        let section = DataSection::new(4, 8, 16);
        let short = b"0123";
        let mut buf = [0u8; 4];
        assert_eq!(b"", section.slice(short));
        assert_eq!(0, section.read_at(short, 0, &mut buf));
    }

    #[test]
    fn test_data_section_truncated_resource() {
        let source = b"0123456789";
        let section = DataSection::new(4, 100, source.len() as u64);
        assert_eq!(100, section.len());
        assert_eq!(6, section.available());

        let mut buf = [0u8; 4];
        assert_eq!(2, section.read_at(source, 4, &mut buf));
        assert_eq!(b"89", &buf[..2]);
        assert_eq!(0, section.read_at(source, 6, &mut buf));
    }
}
