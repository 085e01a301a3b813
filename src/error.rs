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

use crate::{
    schema::{Name, SchemaKind},
    types::{Value, ValueKind},
};

/// Errors encountered while compiling schemas or converting data.
///
/// To inspect the exact failure use [`details`](Self::details) or
/// [`into_details`](Self::into_details) to get a [`Details`].
#[derive(thiserror::Error, Debug)]
#[repr(transparent)]
#[error(transparent)]
pub struct Error {
    details: Box<Details>,
}

impl Error {
    pub fn new(details: Details) -> Self {
        Self {
            details: Box::new(details),
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        *self.details
    }
}

impl From<Details> for Error {
    fn from(details: Details) -> Self {
        Self::new(details)
    }
}

/// All error conditions raised by this crate.
///
/// Kept as one flat enum so callers can match on the precise failure without
/// chasing nested error types.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Details {
    // ---- schema compilation ----
    #[error("Failed to parse schema from JSON")]
    ParseSchemaJson(#[source] serde_json::Error),

    #[error("A schema must be a JSON string, object or array")]
    ParseSchemaFromValidJson,

    #[error("Unknown primitive or named type: {0}")]
    ParsePrimitive(String),

    #[error("Unknown primitive or named type: {0}. Did you mean {1}?")]
    ParsePrimitiveSimilar(String, &'static str),

    #[error("No `name` field")]
    GetNameField,

    #[error("No `name` field in a record field")]
    GetNameFieldFromRecord,

    #[error("Invalid name {0}, must match {1}")]
    InvalidSchemaName(String, &'static str),

    #[error("Invalid namespace {0}, must match {1}")]
    InvalidNamespace(String, &'static str),

    #[error("Invalid enum symbol {0}, must match {1}")]
    InvalidEnumSymbolName(String, &'static str),

    #[error("Invalid record field name {0}, must match {1}")]
    InvalidRecordFieldName(String, &'static str),

    #[error("Unexpected `type` {0} in complex schema")]
    GetComplexType(serde_json::Value),

    #[error("No `type` field in complex schema")]
    GetComplexTypeField,

    #[error("The `{0}` type cannot be referred to by name; it requires a full definition")]
    InvalidSchemaRecord(String),

    #[error("No `fields` array in record schema")]
    GetRecordFieldsJson,

    #[error("No `type` in record field")]
    GetRecordFieldTypeField,

    #[error("Record {record} field {position} ought to be a valid Avro type")]
    RecordFieldType {
        record: String,
        position: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Duplicate field {0} in record")]
    FieldNameDuplicate(String),

    #[error("No `symbols` array in enum schema")]
    GetEnumSymbolsField,

    #[error("The `symbols` of an enum must be an array of strings")]
    GetEnumSymbols,

    #[error("An enum must declare at least one symbol")]
    GetEnumSymbolsEmpty,

    #[error("Duplicate enum symbol {0}")]
    EnumSymbolDuplicate(String),

    #[error("No `items` field in array schema")]
    GetArrayItemsField,

    #[error("No `values` field in map schema")]
    GetMapValuesField,

    #[error("No `size` field in fixed schema")]
    GetFixedSizeField,

    #[error("The `size` of a fixed schema must be a positive integer, got: {0}")]
    GetFixedSizeFieldPositive(serde_json::Value),

    #[error("A union must declare at least one member")]
    EmptyUnion,

    #[error("Unions cannot contain directly nested unions")]
    GetNestedUnion,

    #[error("Union member {0} duplicates an earlier member")]
    GetUnionDuplicate(String),

    #[error("Two schemas with the same fullname were given: {0}")]
    NameCollision(String),

    #[error("Schema definition for {0} is ambiguous")]
    AmbiguousSchemaDefinition(Name),

    #[error("Failed to resolve schema reference: {0}")]
    SchemaResolutionError(Name),

    // ---- binary decoding ----
    #[error("Failed to read boolean bytes: {0}")]
    ReadBoolean(#[source] std::io::Error),

    #[error("Invalid u8 for bool: {0}")]
    BoolValue(u8),

    #[error("Failed to read bytes: {0}")]
    ReadBytes(#[source] std::io::Error),

    #[error("Failed to read string: {0}")]
    ReadString(#[source] std::io::Error),

    #[error("Failed to read float: {0}")]
    ReadFloat(#[source] std::io::Error),

    #[error("Failed to read double: {0}")]
    ReadDouble(#[source] std::io::Error),

    #[error("Failed to read fixed number of bytes {1}: {0}")]
    ReadFixed(#[source] std::io::Error, usize),

    #[error("Failed to read variable-length integer bytes: {0}")]
    ReadVariableIntegerBytes(#[source] std::io::Error),

    #[error("Overflow when decoding variable-length integer")]
    IntegerOverflow,

    #[error("Long value {1} does not fit in an int: {0}")]
    ZagI32(#[source] std::num::TryFromIntError, i64),

    #[error("Invalid utf-8 string")]
    ConvertToUtf8(#[source] std::string::FromUtf8Error),

    #[error("Invalid utf-8 string")]
    ConvertToUtf8Error(#[source] std::str::Utf8Error),

    #[error("Unable to allocate {desired} bytes (maximum allowed: {maximum})")]
    MemoryAllocation { desired: usize, maximum: usize },

    #[error("Negative length: {0}")]
    NegativeLength(i64),

    #[error("Block count {count} exceeds the configured maximum of {maximum}")]
    BlockCountOverflow { count: i64, maximum: i64 },

    #[error("Block size {size} exceeds the configured maximum of {maximum}")]
    BlockSizeOverflow { size: i64, maximum: i64 },

    #[error("Union index {index} out of bounds: {num_variants}")]
    GetUnionVariant { index: i64, num_variants: usize },

    #[error("Enum value index {index} is out of bounds: {nsymbols}")]
    GetEnumValue { index: i64, nsymbols: usize },

    #[error("Duplicate map key: {0}")]
    DuplicateMapKey(String),

    #[error("Cannot convert i64 to usize: {1}")]
    ConvertI64ToUsize(#[source] std::num::TryFromIntError, i64),

    #[error("Cannot convert length to i64: {1}")]
    ConvertLengthToI64(#[source] std::num::TryFromIntError, usize),

    // ---- encoding ----
    #[error("Value of kind {value_kind:?} cannot be encoded with schema of kind {supported_schema:?}")]
    EncodeValueAsSchemaError {
        value_kind: ValueKind,
        supported_schema: Vec<SchemaKind>,
    },

    #[error("Enum symbol not found: {0}")]
    GetEnumSymbol(String),

    #[error("Fixed size mismatch, expected: {size}, got: {n}")]
    CompareFixedSizes { size: usize, n: usize },

    #[error("Missing field in record: {0}")]
    GetField(String),

    #[error("Record value has a field {0} that is not in the schema")]
    RecordFieldUnknown(String),

    #[error("Cannot losslessly convert {value:?} to {target}")]
    LossyNumericConversion { value: Value, target: &'static str },

    #[error("Failed to encode field {field} of record {record}")]
    EncodeRecordField {
        record: String,
        field: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to decode field {field} of record {record}")]
    DecodeRecordField {
        record: String,
        field: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to write bytes: {0}")]
    WriteBytes(#[source] std::io::Error),

    // ---- textual surface ----
    #[error("Unexpected end of textual input")]
    TextShortBuffer,

    #[error("Expected: {expected:?}; actual: {found:?}")]
    TextExpectedByte { expected: char, found: char },

    #[error("Expected the literal `{0}`")]
    TextExpectedLiteral(&'static str),

    #[error("Unexpected byte in number: {0:?}")]
    TextUnexpectedNumberByte(char),

    #[error("Failed to parse textual float")]
    ParseTextFloat(#[source] std::num::ParseFloatError),

    #[error("Failed to parse textual integer")]
    ParseTextInt(#[source] std::num::ParseIntError),

    #[error("Invalid hexadecimal digit: {0:?}")]
    TextInvalidHexDigit(char),

    #[error("Missing second half of surrogate pair for: \\u{0:04X}")]
    TextMissingSurrogate(u32),

    #[error("Second half of surrogate pair is invalid: \\u{0:04X}")]
    TextInvalidSurrogate(u32),

    #[error("Escaped byte in a bytes value must have a zero high byte: \\u{0:04X}")]
    TextBytesEscapeRange(u32),

    #[error("Cannot determine codec for key: {0}")]
    CannotDetermineCodec(String),

    #[error("Only found {found} of {expected} record fields")]
    TextRecordFieldCount { found: usize, expected: usize },

    #[error("Record field {0} appears more than once")]
    DuplicateRecordField(String),

    // ---- object container files ----
    #[error("Failed to read OCF header: {0}")]
    ReadHeader(#[source] std::io::Error),

    #[error("Wrong header magic")]
    HeaderMagic,

    #[error("OCF header metadata must be a map")]
    GetHeaderMetadata,

    #[error("No `avro.schema` in OCF header metadata")]
    GetAvroSchemaFromMap,

    #[error("`avro.codec` metadata is not valid")]
    BadCodecMetadata,

    #[error("Compression codec not supported: {0}")]
    CodecNotSupported(String),

    #[error("Failed to read sync marker: {0}")]
    ReadMarker(#[source] std::io::Error),

    #[error("Failed to read block sync marker: {0}")]
    ReadBlockMarker(#[source] std::io::Error),

    #[error("Sync marker does not match the header sync marker")]
    GetBlockMarker,

    #[error("Failed to read block data: {0}")]
    ReadIntoBuf(#[source] std::io::Error),

    #[error("Block decode made no progress")]
    ReadBlock,

    #[error("Failed to flush the writer: {0}")]
    FlushWriter(#[source] std::io::Error),

    #[error("Failed to write sync marker: {0}")]
    WriteMarker(#[source] std::io::Error),

    #[error("Failed to serialize schema to JSON")]
    ConvertJsonToString(#[source] serde_json::Error),

    #[error("User metadata keys must not start with `avro.`: {0}")]
    InvalidMetadataKey(String),

    #[error("The OCF header has already been written")]
    FileHeaderAlreadyWritten,

    // ---- compression ----
    #[error("Failed to inflate a deflate-compressed block: {0}")]
    DeflateDecompress(#[source] std::io::Error),

    #[cfg(feature = "snappy")]
    #[error("Failed to compress with snappy: {0}")]
    SnappyCompress(#[source] snap::Error),

    #[cfg(feature = "snappy")]
    #[error("Failed to get snappy decompression length: {0}")]
    GetSnappyDecompressLen(#[source] snap::Error),

    #[cfg(feature = "snappy")]
    #[error("Failed to decompress with snappy: {0}")]
    SnappyDecompress(#[source] snap::Error),

    #[cfg(feature = "snappy")]
    #[error("Bad snappy CRC32; expected {expected:x} but got {actual:x}")]
    SnappyCrc32 { expected: u32, actual: u32 },

    #[cfg(feature = "snappy")]
    #[error("Snappy block is too short to hold a CRC32 checksum")]
    SnappyCrcMissing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_is_boxed_and_small() {
        assert_eq!(
            std::mem::size_of::<Error>(),
            std::mem::size_of::<usize>()
        );
    }

    #[test]
    fn details_round_trip_through_error() {
        let err: Error = Details::HeaderMagic.into();
        assert!(matches!(err.into_details(), Details::HeaderMagic));
    }
}
