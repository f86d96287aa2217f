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

//! Reading and writing of RIFF/WAVE PCM files.
//!
//! [`WaveReader`] loads a whole file, checks its structure and then hands out
//! samples one block at a time, either as raw bytes, as integers or as floats.
//! [`WaveWriter`] collects samples in memory and writes the complete file when
//! it's closed, once every size is known.
//!
//! Only uncompressed PCM with the canonical 16-byte "fmt " chunk is handled.
//! Besides "fmt " and "data", a single "LIST" chunk between the two is
//! understood well enough to skip it.
//!
//! # The wave file format
//!
//! The wave file format starts with the RIFF file header:
//!
//! Offset | Size | Data       |    Description
//! -----: | ---: | ---------- | ----------------------------------------------
//!      0 |    4 | "RIFF"     | Identifies the main chunk.
//!      4 |    4 | chunk size | The size of the rest of the file. This must be equal to the size of the file minus 8 bytes.
//!      8 |    4 | "WAVE"     | Indicates that this is a wave file.
//!
//! ## The "fmt " subchunk
//!
//! Offset | Size | Data            | Description
//! -----: | ---: | --------------- | -----------------------------------------
//!     12 |    4 | "fmt "          | Identifies this subchunk.
//!     16 |    4 | subchunk size   | The size of the rest of this subchunk. Always 16 here.
//!     20 |    2 | format (1)      | The format of the wave data, which will be 1 for uncompressed PCM data.
//!     22 |    2 | num channels    | Indicates if the data is mono, stereo, or something else.
//!     24 |    4 | sample rate     | The sample rate per second.
//!     28 |    4 | byte rate       | The total byte rate per second: block align times sample rate.
//!     32 |    2 | block align     | How many bytes are needed for each "frame", where a frame is one sample for each channel.
//!     34 |    2 | bits per sample | The bits per sample; i.e. 16 for 16-bit audio.
//!
//! 8-bit samples are unsigned with silence at 128; 16-bit and 24-bit samples
//! are signed. See [`sample`] for how they are converted.
//!
//! ## The "LIST" subchunk
//!
//! A "LIST" chunk, if present, starts at offset 36 and pushes the "data"
//! subchunk back. By default its size is read from a single byte right after
//! the tag rather than from the usual 4-byte field; this narrower size field
//! is kept for compatibility. [`ListSizeField::Standard`] switches to the
//! 4-byte field.
//!
//! ## The "data" subchunk
//!
//! Offset | Size | Data            | Description
//! -----: | ---: | --------------- | -----------------------------------------
//! 36+    |    4 | "data"          | Identifies this subchunk
//! 40+    |    4 | subchunk size   | The number of audio bytes that follow.
//! 44+    |  ... | audio data      | This stores the actual audio data.
//!
//! As the size fields are 32-bit values, a file can't exceed 4 GiB.
//!
//! # Example
//!
//! ```
//! use wave_codec::{WaveReader, WaveWriter, WriterConfig};
//!
//! let mut wave_writer = WaveWriter::new(Vec::new(), WriterConfig::new(1, 8000, 16)).unwrap();
//! wave_writer.write_samples_i16(&[100, -100]).unwrap();
//! let bytes = wave_writer.finish().unwrap();
//!
//! let mut wave_reader = WaveReader::from_bytes(bytes).unwrap();
//! assert_eq!(2, wave_reader.num_samples());
//! while let Some(sample) = wave_reader.read_sample() {
//!     assert_eq!(1, sample.len());
//! }
//! assert_eq!(wave_reader.num_samples(), wave_reader.read_sample_count());
//! ```

// This is a helper macro that helps us validate results in our tests.
// Thank you bluss and durka42!
#[cfg(test)]
macro_rules! assert_matches {
    ($expected:pat $(if $guard:expr)*, $value:expr) => {
        match $value {
            $expected $(if $guard)* => {},
            ref actual => {
                panic!("assertion failed: `(left matches right)` (left: `{}`, right: `{:?}`",
                    stringify!($expected), actual);
            },
        }
    };
}

pub mod chunks;
pub mod reader;
pub mod sample;
pub mod writer;

pub use crate::chunks::{FmtChunk, FormatData, ListSizeField, RiffChunk};
pub use crate::reader::{FormatErrorKind, ReadError, ReadResult, ReaderOptions, WaveReader};
pub use crate::writer::{InvalidWriteKind, WaveWriter, WriteError, WriteErrorKind, WriteResult,
                        WriterConfig};
