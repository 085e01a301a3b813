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

//! Logic for reading Avro Object Container Files.

use crate::codec::Codec;
use crate::compression::Compression;
use crate::decode::decode;
use crate::error::{Details, Error};
use crate::schema::Schema;
use crate::types::Value;
use crate::util::{safe_block_count, safe_block_size, zag_i64};
use crate::AvroResult;
use log::warn;
use std::collections::HashMap;
use std::io::{ErrorKind, Read};
use std::str::FromStr;

/// Internal block reader: header state plus the buffered current block.
struct Block<R> {
    reader: R,
    /// Internal buffering to reduce allocation.
    buf: Vec<u8>,
    buf_idx: usize,
    /// Number of elements expected to exist within this block.
    message_count: usize,
    marker: [u8; 16],
    compression: Compression,
    codec: Codec,
    user_metadata: HashMap<String, Vec<u8>>,
}

impl<R: Read> Block<R> {
    fn new(reader: R) -> AvroResult<Block<R>> {
        let mut block = Block {
            reader,
            compression: Compression::Null,
            codec: Codec::new("null")?,
            buf: vec![],
            buf_idx: 0,
            message_count: 0,
            marker: [0; 16],
            user_metadata: Default::default(),
        };

        block.read_header()?;
        Ok(block)
    }

    /// Try to read the header and set the writer schema, the compression and
    /// the sync marker based on its content.
    fn read_header(&mut self) -> AvroResult<()> {
        let mut buf = [0u8; 4];
        self.reader
            .read_exact(&mut buf)
            .map_err(Details::ReadHeader)?;

        if buf != [b'O', b'b', b'j', 1u8] {
            return Err(Details::HeaderMagic.into());
        }

        let meta_schema = Schema::map(Schema::Bytes).build();
        match decode(&meta_schema, &mut self.reader)? {
            Value::Map(metadata) => {
                self.read_writer_schema(&metadata)?;
                self.compression = read_compression(&metadata)?;

                for (key, value) in metadata {
                    if key == "avro.schema" || key == "avro.codec" {
                        // already processed
                    } else if key.starts_with("avro.") {
                        warn!("Ignoring unknown metadata key: {key}");
                    } else {
                        self.read_user_metadata(key, value);
                    }
                }
            }
            _ => {
                return Err(Details::GetHeaderMetadata.into());
            }
        }

        self.reader
            .read_exact(&mut self.marker)
            .map_err(|e| Details::ReadMarker(e).into())
    }

    fn fill_buf(&mut self, n: usize) -> AvroResult<()> {
        // The buffer must contain exactly `n` bytes, no matter what size it
        // had before.
        self.buf.resize(n, 0);
        self.reader
            .read_exact(&mut self.buf)
            .map_err(Details::ReadIntoBuf)?;
        self.buf_idx = 0;
        Ok(())
    }

    /// Try to read a data block; its values are decoded lazily by
    /// `read_next`.
    fn read_block_next(&mut self) -> AvroResult<()> {
        match zag_i64(&mut self.reader).map_err(Error::into_details) {
            Ok(block_count) => {
                if block_count < 0 {
                    return Err(Details::NegativeLength(block_count).into());
                }
                self.message_count = safe_block_count(block_count)?;

                let block_bytes = zag_i64(&mut self.reader)?;
                self.fill_buf(safe_block_size(block_bytes)?)?;

                let mut marker = [0u8; 16];
                self.reader
                    .read_exact(&mut marker)
                    .map_err(Details::ReadBlockMarker)?;

                if marker != self.marker {
                    return Err(Details::GetBlockMarker.into());
                }

                self.compression.decompress(&mut self.buf)
            }
            Err(Details::ReadVariableIntegerBytes(io_err)) => {
                if let ErrorKind::UnexpectedEof = io_err.kind() {
                    // the stream ended cleanly at a block boundary
                    self.message_count = 0;
                    Ok(())
                } else {
                    Err(Details::ReadVariableIntegerBytes(io_err).into())
                }
            }
            Err(e) => Err(Error::new(e)),
        }
    }

    fn is_empty(&self) -> bool {
        self.message_count == 0
    }

    fn read_next(&mut self) -> AvroResult<Option<Value>> {
        if self.is_empty() {
            self.read_block_next()?;
            if self.is_empty() {
                return Ok(None);
            }
        }

        let block_bytes = &self.buf[self.buf_idx..];
        let (item, tail) = self.codec.native_from_binary(block_bytes)?;

        if !block_bytes.is_empty() && block_bytes.len() == tail.len() {
            // decoding consumed no bytes; bail out instead of looping forever
            return Err(Details::ReadBlock.into());
        }
        self.buf_idx += block_bytes.len() - tail.len();
        self.message_count -= 1;
        Ok(Some(item))
    }

    fn read_writer_schema(&mut self, metadata: &HashMap<String, Value>) -> AvroResult<()> {
        match metadata.get("avro.schema") {
            Some(Value::Bytes(schema_bytes)) => {
                let schema_text =
                    std::str::from_utf8(schema_bytes).map_err(Details::ConvertToUtf8Error)?;
                self.codec = Codec::new(schema_text)?;
                Ok(())
            }
            _ => Err(Details::GetAvroSchemaFromMap.into()),
        }
    }

    fn read_user_metadata(&mut self, key: String, value: Value) {
        match value {
            Value::Bytes(vec) => {
                self.user_metadata.insert(key, vec);
            }
            wrong => {
                warn!("User metadata values must be Value::Bytes, found {wrong:?}");
            }
        }
    }
}

fn read_compression(metadata: &HashMap<String, Value>) -> AvroResult<Compression> {
    match metadata.get("avro.codec") {
        // absent or empty means no compression
        None => Ok(Compression::Null),
        Some(Value::Bytes(bytes)) => {
            let label = std::str::from_utf8(bytes).map_err(Details::ConvertToUtf8Error)?;
            if label.is_empty() {
                return Ok(Compression::Null);
            }
            Compression::from_str(label)
                .map_err(|_| Details::CodecNotSupported(label.to_owned()).into())
        }
        Some(_) => Err(Details::BadCodecMetadata.into()),
    }
}

/// Main interface for reading Avro Object Container Files.
///
/// The reader decodes one value per call and yields them through the
/// [`Iterator`] interface; iteration ends at the end of the stream or at the
/// first error.
pub struct Reader<R> {
    block: Block<R>,
    errored: bool,
}

impl<R: Read> Reader<R> {
    /// Creates a `Reader` given something implementing the `io::Read` trait
    /// to read from. The schema is read from the container header.
    ///
    /// **NOTE** The avro header is going to be read automatically upon
    /// creation of the `Reader`.
    pub fn new(reader: R) -> AvroResult<Reader<R>> {
        let block = Block::new(reader)?;
        Ok(Reader {
            block,
            errored: false,
        })
    }

    /// Get a reference to the writer `Schema` read from the header.
    pub fn writer_schema(&self) -> &Schema {
        self.block.codec.schema()
    }

    /// Get a reference to the compiled `Codec` for the writer schema.
    pub fn codec(&self) -> &Codec {
        &self.block.codec
    }

    /// The sync marker separating the blocks of this file, as needed by
    /// [`Writer::append_to`](crate::writer::Writer::append_to).
    pub fn sync_marker(&self) -> [u8; 16] {
        self.block.marker
    }

    /// Get a reference to the user metadata of the container header.
    pub fn user_metadata(&self) -> &HashMap<String, Vec<u8>> {
        &self.block.user_metadata
    }

    fn read_next(&mut self) -> AvroResult<Option<Value>> {
        self.block.read_next()
    }
}

impl<R: Read> Iterator for Reader<R> {
    type Item = AvroResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        // to prevent keep on reading after the first error occurs
        if self.errored {
            return None;
        };
        match self.read_next() {
            Ok(opt) => opt.map(Ok),
            Err(e) => {
                self.errored = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;
    use crate::writer::Writer;
    use pretty_assertions::assert_eq;

    fn write_longs(marker: [u8; 16], values: &[i64]) -> Vec<u8> {
        let codec = Codec::new("\"long\"").unwrap();
        let mut writer = Writer::builder()
            .codec(&codec)
            .writer(Vec::new())
            .marker(marker)
            .build();
        writer
            .extend_from_slice(&values.iter().map(|&l| Value::Long(l)).collect::<Vec<_>>())
            .unwrap();
        writer.into_inner().unwrap()
    }

    #[test]
    fn test_round_trip_through_block_reader() -> TestResult {
        let encoded = write_longs([3u8; 16], &[27, 3]);
        let reader = Reader::new(&encoded[..])?;
        assert_eq!(reader.sync_marker(), [3u8; 16]);
        assert_eq!(reader.writer_schema(), &Schema::Long);

        let values: Vec<Value> = reader.collect::<AvroResult<_>>()?;
        assert_eq!(values, vec![Value::Long(27), Value::Long(3)]);
        Ok(())
    }

    #[test]
    fn test_wrong_magic_is_rejected() {
        let result = Reader::new(&b"NotAvroData....."[..]);
        assert!(matches!(
            result.map_err(Error::into_details).map(|_| ()),
            Err(Details::HeaderMagic)
        ));
    }

    #[test]
    fn test_corrupted_sync_marker_is_rejected() -> TestResult {
        let mut encoded = write_longs([3u8; 16], &[1]);
        // flip a byte of the block-trailing marker copy
        let last = encoded.len() - 1;
        encoded[last] ^= 0xff;

        let reader = Reader::new(&encoded[..])?;
        let result: AvroResult<Vec<Value>> = reader.collect();
        assert!(matches!(
            result.map_err(Error::into_details).map(|_| ()),
            Err(Details::GetBlockMarker)
        ));
        Ok(())
    }

    #[test]
    fn test_reader_stops_after_error() -> TestResult {
        let mut encoded = write_longs([3u8; 16], &[1]);
        let last = encoded.len() - 1;
        encoded[last] ^= 0xff;

        let mut reader = Reader::new(&encoded[..])?;
        assert!(reader.next().is_some_and(|r| r.is_err()));
        assert!(reader.next().is_none());
        Ok(())
    }
}
