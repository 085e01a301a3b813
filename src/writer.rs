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

//! Logic for writing Avro Object Container Files.

use crate::codec::Codec;
use crate::compression::Compression;
use crate::encode::{encode, encode_long};
use crate::error::Details;
use crate::schema::Schema;
use crate::types::Value;
use crate::AvroResult;
use std::collections::HashMap;
use std::io::Write;

const DEFAULT_BLOCK_SIZE: usize = 16000;
const AVRO_OBJECT_HEADER: &[u8] = b"Obj\x01";

/// Main interface for writing Avro Object Container Files.
///
/// Values are buffered and written out as a block when the buffer passes the
/// configured block size. Call [`flush`](Writer::flush) (or
/// [`into_inner`](Writer::into_inner)) before dropping the writer, otherwise
/// buffered values are lost.
pub struct Writer<'a, W: Write> {
    codec: &'a Codec,
    writer: W,
    compression: Compression,
    block_size: usize,
    buffer: Vec<u8>,
    num_values: usize,
    marker: [u8; 16],
    has_header: bool,
    user_metadata: HashMap<String, Vec<u8>>,
}

#[bon::bon]
impl<'a, W: Write> Writer<'a, W> {
    #[builder(finish_fn = build)]
    pub fn builder(
        codec: &'a Codec,
        writer: W,
        #[builder(default = Compression::Null)] compression: Compression,
        #[builder(default = DEFAULT_BLOCK_SIZE)] block_size: usize,
        #[builder(default = generate_sync_marker())] marker: [u8; 16],
        /// Has the header already been written.
        ///
        /// Set to `true` to append to a stream that already carries a
        /// header, using that stream's sync `marker`.
        #[builder(default = false)]
        has_header: bool,
        #[builder(default)] user_metadata: HashMap<String, Vec<u8>>,
    ) -> Self {
        Self {
            codec,
            writer,
            compression,
            block_size,
            buffer: Vec::with_capacity(block_size),
            num_values: 0,
            marker,
            has_header,
            user_metadata,
        }
    }
}

impl<'a, W: Write> Writer<'a, W> {
    /// Creates a `Writer` given a compiled `Codec` and something implementing
    /// the `io::Write` trait to write to.
    /// No compression will be used.
    pub fn new(codec: &'a Codec, writer: W) -> Self {
        Writer::with_compression(codec, writer, Compression::Null)
    }

    /// Creates a `Writer` with a specific `Compression` given a compiled
    /// `Codec` and something implementing the `io::Write` trait to write to.
    pub fn with_compression(codec: &'a Codec, writer: W, compression: Compression) -> Self {
        Self::builder()
            .codec(codec)
            .writer(writer)
            .compression(compression)
            .build()
    }

    /// Creates a `Writer` that will append values to an already populated
    /// `std::io::Write` using the provided `marker`.
    /// No compression will be used.
    pub fn append_to(codec: &'a Codec, writer: W, marker: [u8; 16]) -> Self {
        Writer::append_to_with_compression(codec, writer, Compression::Null, marker)
    }

    /// Creates a `Writer` that will append values to an already populated
    /// `std::io::Write` using the provided `marker`.
    pub fn append_to_with_compression(
        codec: &'a Codec,
        writer: W,
        compression: Compression,
        marker: [u8; 16],
    ) -> Self {
        Self::builder()
            .codec(codec)
            .writer(writer)
            .compression(compression)
            .marker(marker)
            .has_header(true)
            .build()
    }

    /// Get a reference to the `Schema` this `Writer` writes with.
    pub fn schema(&self) -> &'a Schema {
        self.codec.schema()
    }

    /// The sync marker separating the blocks of this file.
    pub fn sync_marker(&self) -> [u8; 16] {
        self.marker
    }

    /// Append a value to the `Writer`.
    ///
    /// Returns the number of bytes written to the underlying writer (which
    /// might be 0, see below).
    ///
    /// **NOTE**: This function is not guaranteed to perform any actual
    /// write, since it relies on internal buffering for performance reasons.
    /// If you want to be sure the value has been written, then call
    /// [`flush`](Writer::flush).
    pub fn append<T: Into<Value>>(&mut self, value: T) -> AvroResult<usize> {
        let avro = value.into();
        self.append_value_ref(&avro)
    }

    /// Append a value to the `Writer`, by reference.
    ///
    /// Returns the number of bytes written; see [`append`](Writer::append)
    /// for the buffering caveat.
    pub fn append_value_ref(&mut self, value: &Value) -> AvroResult<usize> {
        let n = self.maybe_write_header()?;

        self.codec.binary_from_native(value, &mut self.buffer)?;
        self.num_values += 1;

        if self.buffer.len() >= self.block_size {
            return self.flush().map(|b| b + n);
        }

        Ok(n)
    }

    /// Extend a `Writer` with an `Iterator` of values.
    ///
    /// Returns the number of bytes written.
    ///
    /// **NOTE**: This function forces the written data to be flushed (an
    /// implicit call to [`flush`](Writer::flush) is performed).
    pub fn extend<I, T: Into<Value>>(&mut self, values: I) -> AvroResult<usize>
    where
        I: IntoIterator<Item = T>,
    {
        let mut num_bytes = 0;
        for value in values {
            num_bytes += self.append(value)?;
        }
        num_bytes += self.flush()?;

        Ok(num_bytes)
    }

    /// Extend a `Writer` by appending each `Value` from a slice.
    ///
    /// Returns the number of bytes written.
    ///
    /// **NOTE**: This function forces the written data to be flushed (an
    /// implicit call to [`flush`](Writer::flush) is performed).
    pub fn extend_from_slice(&mut self, values: &[Value]) -> AvroResult<usize> {
        let mut num_bytes = 0;
        for value in values {
            num_bytes += self.append_value_ref(value)?;
        }
        num_bytes += self.flush()?;

        Ok(num_bytes)
    }

    /// Flush the buffered values to the inner `Writer` as a single block.
    ///
    /// This will also write the header if it was not written yet.
    ///
    /// Returns the number of bytes written.
    pub fn flush(&mut self) -> AvroResult<usize> {
        let mut num_bytes = self.maybe_write_header()?;
        if self.num_values == 0 {
            return Ok(num_bytes);
        }

        self.compression.compress(&mut self.buffer)?;

        let num_values = i64::try_from(self.num_values)
            .map_err(|e| Details::ConvertLengthToI64(e, self.num_values))?;
        let stream_len = i64::try_from(self.buffer.len())
            .map_err(|e| Details::ConvertLengthToI64(e, self.buffer.len()))?;

        num_bytes += encode_long(num_values, &mut self.writer)?
            + encode_long(stream_len, &mut self.writer)?
            + self
                .writer
                .write(self.buffer.as_ref())
                .map_err(Details::WriteBytes)?
            + self.append_marker()?;

        self.buffer.clear();
        self.num_values = 0;

        self.writer.flush().map_err(Details::FlushWriter)?;

        Ok(num_bytes)
    }

    /// Return what the `Writer` is writing to, consuming the `Writer` itself.
    ///
    /// **NOTE**: This function forces the written data to be flushed (an
    /// implicit call to [`flush`](Writer::flush) is performed).
    pub fn into_inner(mut self) -> AvroResult<W> {
        self.flush()?;
        Ok(self.writer)
    }

    /// Gets a reference to the underlying writer.
    ///
    /// **NOTE**: There is likely data still in the buffer. To have all the
    /// data in the writer call [`flush`](Writer::flush) first.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Adds custom metadata to the file.
    /// This method can be used only before adding the first value to the
    /// writer; the metadata map lives in the file header.
    pub fn add_user_metadata<T: AsRef<[u8]>>(&mut self, key: String, value: T) -> AvroResult<()> {
        if !self.has_header {
            if key.starts_with("avro.") {
                return Err(Details::InvalidMetadataKey(key).into());
            }
            self.user_metadata.insert(key, value.as_ref().to_vec());
            Ok(())
        } else {
            Err(Details::FileHeaderAlreadyWritten.into())
        }
    }

    /// Write the synchronization marker after a block.
    fn append_marker(&mut self) -> AvroResult<usize> {
        self.writer
            .write(&self.marker)
            .map_err(|e| Details::WriteMarker(e).into())
    }

    /// Create an Avro header based on schema, compression and sync marker.
    fn header(&self) -> AvroResult<Vec<u8>> {
        let mut metadata: HashMap<String, Value> = HashMap::with_capacity(2);
        metadata.insert(
            "avro.schema".to_owned(),
            Value::Bytes(self.codec.schema_json().as_bytes().to_vec()),
        );
        if self.compression != Compression::Null {
            let label: &str = self.compression.into();
            metadata.insert(
                "avro.codec".to_owned(),
                Value::Bytes(label.as_bytes().to_vec()),
            );
        }

        for (k, v) in &self.user_metadata {
            metadata.insert(k.clone(), Value::Bytes(v.clone()));
        }

        let mut header = Vec::new();
        header.extend_from_slice(AVRO_OBJECT_HEADER);
        encode(
            &metadata.into(),
            &Schema::map(Schema::Bytes).build(),
            &mut header,
        )?;
        header.extend_from_slice(&self.marker);

        Ok(header)
    }

    fn maybe_write_header(&mut self) -> AvroResult<usize> {
        if !self.has_header {
            let header = self.header()?;
            let n = self
                .writer
                .write(header.as_ref())
                .map_err(Details::WriteBytes)?;
            self.has_header = true;
            Ok(n)
        } else {
            Ok(0)
        }
    }
}

fn generate_sync_marker() -> [u8; 16] {
    rand::random()
}
