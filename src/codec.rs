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

//! The compiled codec: one immutable artifact per schema, exposing the four
//! symmetric conversions between native values and the two wire forms.

use crate::decode::decode_internal;
use crate::encode::encode_internal;
use crate::error::Details;
use crate::schema::{Names, Schema, resolve_names};
use crate::textual::{decode_textual, encode_textual};
use crate::types::Value;
use crate::AvroResult;
use std::collections::HashMap;

/// A compiled schema plus its frozen symbol table.
///
/// A `Codec` is created once from a schema document and is immutable
/// afterwards: it holds no buffers or I/O handles, and all four operations
/// may be invoked concurrently on a shared instance.
///
/// Decoders borrow the input slice and return the unconsumed tail next to
/// the decoded value. Encoders append to a caller-provided buffer and return
/// the number of bytes written; when an encoder fails the buffer is
/// truncated back to its pre-call length, so the caller can retry with a
/// different value without rebuilding state.
#[derive(Debug, Clone)]
pub struct Codec {
    schema: Schema,
    names: Names,
    schema_json: String,
}

impl Codec {
    /// Compile a codec from the JSON text of an Avro schema.
    ///
    /// The input may also be a bare primitive type name such as `long`,
    /// which is not valid JSON but is a valid schema.
    pub fn new(schema_text: &str) -> AvroResult<Self> {
        Self::from_schema(Schema::parse_str(schema_text)?)
    }

    /// Compile a codec from an already parsed [`Schema`].
    pub fn from_schema(schema: Schema) -> AvroResult<Self> {
        let mut names = HashMap::new();
        resolve_names(&schema, &mut names, &None)?;
        let schema_json = serde_json::to_string(&schema).map_err(Details::ConvertJsonToString)?;
        Ok(Self {
            schema,
            names,
            schema_json,
        })
    }

    /// The compiled schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// A compact JSON rendering of the compiled schema.
    pub fn schema_json(&self) -> &str {
        &self.schema_json
    }

    pub(crate) fn names(&self) -> &Names {
        &self.names
    }

    /// Decode one value from the Avro binary format.
    ///
    /// Returns the decoded value and the unconsumed tail of `buffer`. On
    /// error the caller's slice is untouched.
    pub fn native_from_binary<'a>(&self, buffer: &'a [u8]) -> AvroResult<(Value, &'a [u8])> {
        let mut reader = buffer;
        let value = decode_internal(&self.schema, &self.names, &None, &mut reader)?;
        Ok((value, reader))
    }

    /// Encode a value into the Avro binary format, appending to `buffer`.
    ///
    /// Returns the number of bytes written. On error `buffer` is restored to
    /// its pre-call contents.
    pub fn binary_from_native(&self, value: &Value, buffer: &mut Vec<u8>) -> AvroResult<usize> {
        let original_len = buffer.len();
        match encode_internal(value, &self.schema, &self.names, &None, buffer) {
            Ok(n) => Ok(n),
            Err(e) => {
                buffer.truncate(original_len);
                Err(e)
            }
        }
    }

    /// Decode one value from the textual (JSON) format.
    ///
    /// Returns the decoded value and the unconsumed tail of `buffer`. On
    /// error the caller's slice is untouched.
    pub fn native_from_textual<'a>(&self, buffer: &'a [u8]) -> AvroResult<(Value, &'a [u8])> {
        decode_textual(&self.schema, &self.names, &None, buffer)
    }

    /// Encode a value into the textual (JSON) format, appending to `buffer`.
    ///
    /// Returns the number of bytes written. On error `buffer` is restored to
    /// its pre-call contents.
    ///
    /// **NOTE** NaN and the infinities are written as `null`, `1e999` and
    /// `-1e999` so the IEEE sentinels survive JSON; strict JSON parsers will
    /// not accept the last two.
    pub fn textual_from_native(&self, value: &Value, buffer: &mut Vec<u8>) -> AvroResult<usize> {
        let original_len = buffer.len();
        match encode_textual(value, &self.schema, &self.names, &None, buffer) {
            Ok(()) => Ok(buffer.len() - original_len),
            Err(e) => {
                buffer.truncate(original_len);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn helium_map() -> Value {
        let mut map = HashMap::new();
        map.insert("Helium".to_string(), Value::Int(2));
        Value::Map(map)
    }

    /// Schema, native value, binary wire bytes, textual wire bytes.
    fn seed_scenarios() -> Vec<(&'static str, Value, Vec<u8>, &'static str)> {
        vec![
            ("\"int\"", Value::Int(-1), vec![0x01], "-1"),
            (
                r#"{"type":"array","items":"int"}"#,
                Value::Array(vec![Value::Int(1), Value::Int(2)]),
                vec![0x04, 0x02, 0x04, 0x00],
                "[1,2]",
            ),
            (
                r#"{"type":"map","values":"int"}"#,
                helium_map(),
                vec![
                    0x02, 0x0c, b'H', b'e', b'l', b'i', b'u', b'm', 0x04, 0x00,
                ],
                r#"{"Helium":2}"#,
            ),
            (
                r#"{"type":"record","name":"r","fields":[{"name":"a","type":"string"},{"name":"b","type":"int"}]}"#,
                Value::Record(vec![
                    ("a".to_string(), Value::String("hi".into())),
                    ("b".to_string(), Value::Int(13)),
                ]),
                vec![0x04, b'h', b'i', 0x1a],
                r#"{"a":"hi","b":13}"#,
            ),
            (
                r#"{"type":"enum","name":"E","symbols":["x","y"]}"#,
                Value::Enum(1, "y".to_string()),
                vec![0x02],
                "\"y\"",
            ),
            (
                r#"["null","int"]"#,
                Value::Union(0, Box::new(Value::Null)),
                vec![0x00],
                "null",
            ),
            (
                r#"["null","int"]"#,
                Value::Union(1, Box::new(Value::Int(3))),
                vec![0x02, 0x06],
                r#"{"int":3}"#,
            ),
            (
                r#"{"type":"fixed","name":"F","size":4}"#,
                Value::Fixed(4, vec![0x61, 0x62, 0x63, 0x64]),
                vec![0x61, 0x62, 0x63, 0x64],
                "\"abcd\"",
            ),
        ]
    }

    #[test]
    fn test_seed_scenarios_binary() -> TestResult {
        for (schema_text, native, binary, _) in seed_scenarios() {
            let codec = Codec::new(schema_text)?;

            let mut encoded = Vec::new();
            codec.binary_from_native(&native, &mut encoded)?;
            assert_eq!(encoded, binary, "schema: {schema_text}");

            let (decoded, tail) = codec.native_from_binary(&binary)?;
            assert_eq!(decoded, native, "schema: {schema_text}");
            assert!(tail.is_empty(), "schema: {schema_text}");
        }
        Ok(())
    }

    #[test]
    fn test_seed_scenarios_textual() -> TestResult {
        for (schema_text, native, _, textual) in seed_scenarios() {
            let codec = Codec::new(schema_text)?;

            let mut encoded = Vec::new();
            codec.textual_from_native(&native, &mut encoded)?;
            assert_eq!(
                String::from_utf8(encoded.clone())?,
                textual,
                "schema: {schema_text}"
            );

            let (decoded, tail) = codec.native_from_textual(textual.as_bytes())?;
            assert_eq!(decoded, native, "schema: {schema_text}");
            assert!(tail.is_empty(), "schema: {schema_text}");
        }
        Ok(())
    }

    #[test]
    fn test_cross_surface_equivalence() -> TestResult {
        for (schema_text, native, _, _) in seed_scenarios() {
            let codec = Codec::new(schema_text)?;

            let mut binary = Vec::new();
            codec.binary_from_native(&native, &mut binary)?;
            let (from_binary, _) = codec.native_from_binary(&binary)?;

            let mut textual = Vec::new();
            codec.textual_from_native(&native, &mut textual)?;
            let (from_textual, _) = codec.native_from_textual(&textual)?;

            assert_eq!(from_binary, from_textual, "schema: {schema_text}");
        }
        Ok(())
    }

    #[test]
    fn test_encoders_append_to_existing_buffers() -> TestResult {
        let codec = Codec::new("\"int\"")?;
        let mut buffer = vec![0xaa, 0xbb];
        let n = codec.binary_from_native(&Value::Int(-1), &mut buffer)?;
        assert_eq!(n, 1);
        assert_eq!(buffer, vec![0xaa, 0xbb, 0x01]);
        Ok(())
    }

    #[test]
    fn test_error_leaves_encode_buffer_untouched() -> TestResult {
        let codec = Codec::new(
            r#"{"type":"record","name":"r","fields":[{"name":"a","type":"string"},{"name":"b","type":"int"}]}"#,
        )?;
        // fails after the first field already produced bytes
        let bad = Value::Record(vec![
            ("a".to_string(), Value::String("hi".into())),
            ("b".to_string(), Value::String("not an int".into())),
        ]);

        let mut buffer = vec![0x42];
        assert!(codec.binary_from_native(&bad, &mut buffer).is_err());
        assert_eq!(buffer, vec![0x42]);

        let mut buffer = vec![0x42];
        assert!(codec.textual_from_native(&bad, &mut buffer).is_err());
        assert_eq!(buffer, vec![0x42]);
        Ok(())
    }

    #[test]
    fn test_decode_returns_tail() -> TestResult {
        let codec = Codec::new("\"int\"")?;
        let (value, tail) = codec.native_from_binary(&[0x01, 0xde, 0xad])?;
        assert_eq!(value, Value::Int(-1));
        assert_eq!(tail, &[0xde, 0xad]);

        let (value, tail) = codec.native_from_textual(b"-1 xyz")?;
        assert_eq!(value, Value::Int(-1));
        assert_eq!(tail, b" xyz");
        Ok(())
    }

    #[test]
    fn test_compile_is_idempotent() -> TestResult {
        let schema_text = r#"
            {
                "type": "record",
                "name": "LongList",
                "fields": [
                    {"name": "value", "type": "long"},
                    {"name": "next", "type": ["null", "LongList"]}
                ]
            }
        "#;
        let a = Codec::new(schema_text)?;
        let b = Codec::new(schema_text)?;
        assert_eq!(a.schema(), b.schema());
        assert_eq!(a.schema_json(), b.schema_json());

        let value = Value::Record(vec![
            ("value".to_string(), Value::Long(7)),
            ("next".to_string(), Value::Union(0, Box::new(Value::Null))),
        ]);
        let mut encoded_a = Vec::new();
        let mut encoded_b = Vec::new();
        a.binary_from_native(&value, &mut encoded_a)?;
        b.binary_from_native(&value, &mut encoded_b)?;
        assert_eq!(encoded_a, encoded_b);
        Ok(())
    }

    #[test]
    fn test_codec_is_shareable_across_threads() -> TestResult {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Codec>();

        let codec = std::sync::Arc::new(Codec::new(r#"{"type":"array","items":"long"}"#)?);
        let value = Value::Array((0..100).map(Value::Long).collect());

        let mut expected = Vec::new();
        codec.binary_from_native(&value, &mut expected)?;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let codec = std::sync::Arc::clone(&codec);
                let value = value.clone();
                let expected = expected.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let mut encoded = Vec::new();
                        codec.binary_from_native(&value, &mut encoded).unwrap();
                        assert_eq!(encoded, expected);
                        let (decoded, tail) = codec.native_from_binary(&encoded).unwrap();
                        assert_eq!(decoded, value);
                        assert!(tail.is_empty());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread must not panic");
        }
        Ok(())
    }

    #[test]
    fn test_schema_json_is_reparseable() -> TestResult {
        let codec = Codec::new("long")?;
        assert_eq!(codec.schema_json(), "\"long\"");
        let again = Codec::new(codec.schema_json())?;
        assert_eq!(again.schema(), codec.schema());
        Ok(())
    }
}
