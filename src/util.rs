// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::AvroResult;
use crate::error::Details;
use crate::schema::Documentation;
use serde_json::{Map, Value};
use std::io::{Read, Write};
use std::sync::{
    Once,
    atomic::{AtomicI64, AtomicUsize, Ordering},
};

/// Maximum number of bytes that can be allocated when decoding
/// Avro-encoded values. This is a protection against ill-formed
/// data, whose length field might be interpreted as enormous.
/// See [`max_allocation_bytes`] to change this limit.
pub const DEFAULT_MAX_ALLOCATION_BYTES: usize = 512 * 1024 * 1024;
static MAX_ALLOCATION_BYTES: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_ALLOCATION_BYTES);
static MAX_ALLOCATION_BYTES_ONCE: Once = Once::new();

/// Maximum number of items in a single block of a blocked container
/// (array, map, or object container file block).
/// See [`max_block_count`] to change this limit.
pub const DEFAULT_MAX_BLOCK_COUNT: i64 = i32::MAX as i64;
static MAX_BLOCK_COUNT: AtomicI64 = AtomicI64::new(DEFAULT_MAX_BLOCK_COUNT);
static MAX_BLOCK_COUNT_ONCE: Once = Once::new();

/// Maximum byte size of a single object container file block.
/// See [`max_block_size`] to change this limit.
pub const DEFAULT_MAX_BLOCK_SIZE: i64 = i32::MAX as i64;
static MAX_BLOCK_SIZE: AtomicI64 = AtomicI64::new(DEFAULT_MAX_BLOCK_SIZE);
static MAX_BLOCK_SIZE_ONCE: Once = Once::new();

/// Set a new maximum number of bytes that can be allocated when decoding data.
/// Once called, the limit cannot be changed.
///
/// **NOTE** This function must be called before decoding **any** data. The
/// library leverages [`std::sync::Once`] to set the limit either when calling
/// this method, or when decoding for the first time.
pub fn max_allocation_bytes(num_bytes: usize) -> usize {
    MAX_ALLOCATION_BYTES_ONCE.call_once(|| {
        MAX_ALLOCATION_BYTES.store(num_bytes, Ordering::Release);
    });
    MAX_ALLOCATION_BYTES.load(Ordering::Acquire)
}

/// Set a new maximum number of items per container block. Once called, the
/// limit cannot be changed.
///
/// **NOTE** This function must be called before decoding **any** data, see
/// [`max_allocation_bytes`] for the details.
pub fn max_block_count(num_items: i64) -> i64 {
    MAX_BLOCK_COUNT_ONCE.call_once(|| {
        MAX_BLOCK_COUNT.store(num_items, Ordering::Release);
    });
    MAX_BLOCK_COUNT.load(Ordering::Acquire)
}

/// Set a new maximum byte size per object container file block. Once called,
/// the limit cannot be changed.
///
/// **NOTE** This function must be called before decoding **any** data, see
/// [`max_allocation_bytes`] for the details.
pub fn max_block_size(num_bytes: i64) -> i64 {
    MAX_BLOCK_SIZE_ONCE.call_once(|| {
        MAX_BLOCK_SIZE.store(num_bytes, Ordering::Release);
    });
    MAX_BLOCK_SIZE.load(Ordering::Acquire)
}

pub fn safe_len(len: usize) -> AvroResult<usize> {
    let max_bytes = max_allocation_bytes(DEFAULT_MAX_ALLOCATION_BYTES);

    if len <= max_bytes {
        Ok(len)
    } else {
        Err(Details::MemoryAllocation {
            desired: len,
            maximum: max_bytes,
        }
        .into())
    }
}

/// Validate a container block item count against the configured maximum and
/// convert it to a `usize`. The count must already be non-negative.
pub fn safe_block_count(count: i64) -> AvroResult<usize> {
    let maximum = max_block_count(DEFAULT_MAX_BLOCK_COUNT);
    if count > maximum {
        return Err(Details::BlockCountOverflow { count, maximum }.into());
    }
    usize::try_from(count).map_err(|e| Details::ConvertI64ToUsize(e, count).into())
}

/// Validate an object container file block byte size against the configured
/// maximum and convert it to a `usize`.
pub fn safe_block_size(size: i64) -> AvroResult<usize> {
    let maximum = max_block_size(DEFAULT_MAX_BLOCK_SIZE);
    if size < 0 {
        return Err(Details::NegativeLength(size).into());
    }
    if size > maximum {
        return Err(Details::BlockSizeOverflow { size, maximum }.into());
    }
    safe_len(usize::try_from(size).map_err(|e| Details::ConvertI64ToUsize(e, size))?)
}

/// Convenience accessors for the JSON objects a schema document is made of.
pub trait MapHelper {
    fn string(&self, key: &str) -> Option<String>;

    fn name(&self) -> Option<String> {
        self.string("name")
    }

    fn doc(&self) -> Documentation {
        self.string("doc")
    }
}

impl MapHelper for Map<String, Value> {
    fn string(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
    }
}

pub fn zig_i32<W: Write>(n: i32, buffer: W) -> AvroResult<usize> {
    zig_i64(n as i64, buffer)
}

pub fn zig_i64<W: Write>(n: i64, writer: W) -> AvroResult<usize> {
    encode_variable(((n << 1) ^ (n >> 63)) as u64, writer)
}

pub fn zag_i32<R: Read>(reader: &mut R) -> AvroResult<i32> {
    let i = zag_i64(reader)?;
    i32::try_from(i).map_err(|e| Details::ZagI32(e, i).into())
}

pub fn zag_i64<R: Read>(reader: &mut R) -> AvroResult<i64> {
    let z = decode_variable(reader)?;
    Ok(if z & 0x1 == 0 {
        (z >> 1) as i64
    } else {
        !(z >> 1) as i64
    })
}

fn encode_variable<W: Write>(mut z: u64, mut writer: W) -> AvroResult<usize> {
    let mut buffer = [0u8; 10];
    let mut i: usize = 0;
    loop {
        if z <= 0x7F {
            buffer[i] = (z & 0x7F) as u8;
            i += 1;
            break;
        } else {
            buffer[i] = (0x80 | (z & 0x7F)) as u8;
            i += 1;
            z >>= 7;
        }
    }
    writer
        .write(&buffer[..i])
        .map_err(|e| Details::WriteBytes(e).into())
}

fn decode_variable<R: Read>(reader: &mut R) -> AvroResult<u64> {
    let mut i = 0u64;
    let mut buf = [0u8; 1];

    let mut j = 0;
    loop {
        if j > 9 {
            // if j * 7 > 64
            return Err(Details::IntegerOverflow.into());
        }
        reader
            .read_exact(&mut buf[..])
            .map_err(Details::ReadVariableIntegerBytes)?;
        i |= (u64::from(buf[0] & 0x7F)) << (j * 7);
        if (buf[0] >> 7) == 0 {
            break;
        } else {
            j += 1;
        }
    }

    Ok(i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zigzag() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        zig_i32(42i32, &mut a).unwrap();
        zig_i64(42i64, &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zig_i64() {
        let mut s = Vec::new();

        zig_i64(0, &mut s).unwrap();
        assert_eq!(s, [0]);

        s.clear();
        zig_i64(-1, &mut s).unwrap();
        assert_eq!(s, [1]);

        s.clear();
        zig_i64(1, &mut s).unwrap();
        assert_eq!(s, [2]);

        s.clear();
        zig_i64(-64, &mut s).unwrap();
        assert_eq!(s, [127]);

        s.clear();
        zig_i64(64, &mut s).unwrap();
        assert_eq!(s, [128, 1]);

        s.clear();
        zig_i64(i32::MAX as i64, &mut s).unwrap();
        assert_eq!(s, [254, 255, 255, 255, 15]);

        s.clear();
        zig_i64(i32::MIN as i64, &mut s).unwrap();
        assert_eq!(s, [255, 255, 255, 255, 15]);

        s.clear();
        zig_i64(i64::MAX, &mut s).unwrap();
        assert_eq!(s, [254, 255, 255, 255, 255, 255, 255, 255, 255, 1]);

        s.clear();
        zig_i64(i64::MIN, &mut s).unwrap();
        assert_eq!(s, [255, 255, 255, 255, 255, 255, 255, 255, 255, 1]);
    }

    #[test]
    fn test_zag_round_trip_edges() -> TestResult {
        for n in [0i64, -1, 1, i64::MIN, i64::MAX, i32::MIN as i64 - 1] {
            let mut s = Vec::new();
            zig_i64(n, &mut s)?;
            assert_eq!(zag_i64(&mut &s[..])?, n);
        }
        Ok(())
    }

    #[test]
    fn test_decode_max_length_varint() -> TestResult {
        // ten bytes is the longest legal encoding of a 64-bit value
        let encoded: &[u8] = &[254, 255, 255, 255, 255, 255, 255, 255, 255, 1];
        assert_eq!(zag_i64(&mut &*encoded)?, i64::MAX);
        Ok(())
    }

    #[test]
    fn test_overflow() {
        let causes_left_shift_overflow: &[u8] =
            &[0xe1, 0xe1, 0xe1, 0xe1, 0xe1, 0xe1, 0xe1, 0xe1, 0xe1, 0xe1, 0xe1];
        assert!(decode_variable(&mut &*causes_left_shift_overflow).is_err());
    }

    #[test]
    fn test_short_varint_is_an_error() {
        // continuation bit set but the stream ends
        let truncated: &[u8] = &[0x80];
        assert!(zag_i64(&mut &*truncated).is_err());
    }

    #[test]
    fn test_safe_len() -> TestResult {
        assert_eq!(42usize, safe_len(42usize)?);
        assert!(safe_len(1024 * 1024 * 1024).is_err());

        Ok(())
    }

    #[test]
    fn test_safe_block_count() {
        assert!(safe_block_count(DEFAULT_MAX_BLOCK_COUNT + 1).is_err());
        assert_eq!(safe_block_count(10).unwrap(), 10);
    }
}
