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

//! Conversions between raw little-endian sample bytes and sample values.
//!
//! 8-bit PCM is unsigned with silence at 128, while 16-bit and 24-bit PCM are
//! two's complement with silence at 0. [`bytes_to_int`] does not know about
//! either convention: it just assembles the bytes into an unsigned value, and
//! [`normalize`] and [`to_signed`] apply the depth-specific rules on top.

/// Assembles 1, 2 or 3 little-endian bytes into an unsigned value.
///
/// Any other length yields 0.
pub fn bytes_to_int(bytes: &[u8]) -> i32 {
    match *bytes {
        [b0] => i32::from(b0),
        [b0, b1] => i32::from(b0) + (i32::from(b1) << 8),
        [b0, b1, b2] => i32::from(b0) + (i32::from(b1) << 8) + (i32::from(b2) << 16),
        _ => 0,
    }
}

/// Scales a value produced by [`bytes_to_int`] to a float.
///
/// 8-bit values map 0..=255 onto -1.0..1.0 around 128, and 16-bit values are
/// divided by 32768 as they are. There is no rule for other depths, so those
/// come out as 0.0.
pub fn normalize(raw: i32, bits_per_sample: u16) -> f64 {
    match bits_per_sample {
        8 => f64::from(raw - 128) / 128.0,
        16 => f64::from(raw) / 32768.0,
        _ => 0.0,
    }
}

/// Reinterprets a value produced by [`bytes_to_int`] as a signed sample.
///
/// 8-bit values are re-centred so that 128 becomes 0; 16-bit and 24-bit
/// values are sign extended.
pub fn to_signed(raw: i32, bits_per_sample: u16) -> i32 {
    match bits_per_sample {
        8 => raw - 128,
        16 => i32::from(raw as u16 as i16),
        24 => (raw << 8) >> 8,
        _ => raw,
    }
}

/// Splits an interleaved block into one byte group per channel.
pub fn split_channels(block: &[u8], channel_count: usize) -> impl Iterator<Item = &[u8]> {
    let width = (block.len() / channel_count.max(1)).max(1);
    block.chunks(width).take(channel_count)
}
