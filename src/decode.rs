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

use crate::error::Details;
use crate::schema::{
    EnumSchema, FixedSchema, Names, Namespace, RecordSchema, Schema, UnionSchema, resolve_names,
};
use crate::types::Value;
use crate::util::{
    DEFAULT_MAX_ALLOCATION_BYTES, max_allocation_bytes, safe_block_count, safe_len, zag_i32,
    zag_i64,
};
use crate::{AvroResult, Error};
use std::collections::HashMap;
use std::io::Read;

/// Decode a `Value` from Avro binary format given its `Schema`.
pub fn decode<R: Read>(schema: &Schema, reader: &mut R) -> AvroResult<Value> {
    let mut names = HashMap::new();
    resolve_names(schema, &mut names, &None)?;
    decode_internal(schema, &names, &None, reader)
}

fn decode_len<R: Read>(reader: &mut R) -> AvroResult<usize> {
    let len = zag_i64(reader)?;
    if len < 0 {
        return Err(Details::NegativeLength(len).into());
    }
    safe_len(usize::try_from(len).map_err(|e| Details::ConvertI64ToUsize(e, len))?)
}

/// Decode the count of the next block of a blocked container (array or map).
///
/// A negative count means its absolute value is the count and the byte size
/// of the block follows; the size is informational and discarded here.
fn decode_block_count<R: Read>(reader: &mut R) -> AvroResult<usize> {
    let count = zag_i64(reader)?;
    let count = if count < 0 {
        // drop the byte size of the block
        let _block_size = zag_i64(reader)?;
        count.checked_neg().ok_or(Details::IntegerOverflow)?
    } else {
        count
    };
    safe_block_count(count)
}

/// Clamp a pre-allocation so a hostile count that passes the block limit
/// still cannot exhaust memory before any item bytes were read.
fn safe_reserve<T>(container_len: usize) -> usize {
    let max = max_allocation_bytes(DEFAULT_MAX_ALLOCATION_BYTES);
    if container_len.saturating_mul(std::mem::size_of::<T>()) <= max {
        container_len
    } else {
        0
    }
}

pub(crate) fn decode_internal<R: Read>(
    schema: &Schema,
    names: &Names,
    enclosing_namespace: &Namespace,
    reader: &mut R,
) -> AvroResult<Value> {
    match schema {
        Schema::Null => Ok(Value::Null),
        Schema::Boolean => {
            let mut buf = [0u8; 1];
            match reader.read_exact(&mut buf[..]) {
                Ok(_) => match buf[0] {
                    0u8 => Ok(Value::Boolean(false)),
                    1u8 => Ok(Value::Boolean(true)),
                    _ => Err(Details::BoolValue(buf[0]).into()),
                },
                Err(io_err) => Err(Details::ReadBoolean(io_err).into()),
            }
        }
        Schema::Int => zag_i32(reader).map(Value::Int),
        Schema::Long => zag_i64(reader).map(Value::Long),
        Schema::Float => {
            let mut buf = [0u8; std::mem::size_of::<f32>()];
            reader
                .read_exact(&mut buf[..])
                .map_err(Details::ReadFloat)?;
            Ok(Value::Float(f32::from_le_bytes(buf)))
        }
        Schema::Double => {
            let mut buf = [0u8; std::mem::size_of::<f64>()];
            reader
                .read_exact(&mut buf[..])
                .map_err(Details::ReadDouble)?;
            Ok(Value::Double(f64::from_le_bytes(buf)))
        }
        Schema::Bytes => {
            let len = decode_len(reader)?;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf).map_err(Details::ReadBytes)?;
            Ok(Value::Bytes(buf))
        }
        Schema::String => {
            let len = decode_len(reader)?;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf).map_err(Details::ReadString)?;

            String::from_utf8(buf)
                .map(Value::String)
                .map_err(|e| Details::ConvertToUtf8(e).into())
        }
        Schema::Fixed(FixedSchema { size, .. }) => {
            let mut buf = vec![0u8; *size];
            reader
                .read_exact(&mut buf)
                .map_err(|e| Details::ReadFixed(e, *size))?;
            Ok(Value::Fixed(*size, buf))
        }
        Schema::Array(inner) => {
            let mut items = Vec::new();

            loop {
                let len = decode_block_count(reader)?;
                if len == 0 {
                    break;
                }

                items.reserve(safe_reserve::<Value>(len));
                for _ in 0..len {
                    items.push(decode_internal(inner, names, enclosing_namespace, reader)?);
                }
            }

            Ok(Value::Array(items))
        }
        Schema::Map(inner) => {
            let mut items = HashMap::new();

            loop {
                let len = decode_block_count(reader)?;
                if len == 0 {
                    break;
                }

                items.reserve(safe_reserve::<(String, Value)>(len));
                for _ in 0..len {
                    match decode_internal(&Schema::String, names, enclosing_namespace, reader)? {
                        Value::String(key) => {
                            let value =
                                decode_internal(inner, names, enclosing_namespace, reader)?;
                            if items.insert(key.clone(), value).is_some() {
                                return Err(Details::DuplicateMapKey(key).into());
                            }
                        }
                        value => unreachable!("Schema::String decodes a string, got {value:?}"),
                    }
                }
            }

            Ok(Value::Map(items))
        }
        Schema::Union(UnionSchema { schemas, .. }) => {
            let index = zag_i64(reader)?;
            let variants = schemas;
            if index < 0 || index as usize >= variants.len() {
                return Err(Details::GetUnionVariant {
                    index,
                    num_variants: variants.len(),
                }
                .into());
            }
            let value = decode_internal(
                &variants[index as usize],
                names,
                enclosing_namespace,
                reader,
            )?;
            Ok(Value::Union(index as u32, Box::new(value)))
        }
        Schema::Record(RecordSchema { name, fields, .. }) => {
            let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
            let record_namespace = fully_qualified_name.namespace.clone();

            // fields are encoded in declaration order, without any framing
            let mut items = Vec::with_capacity(fields.len());
            for field in fields {
                let value = decode_internal(&field.schema, names, &record_namespace, reader)
                    .map_err(|e| {
                        Details::DecodeRecordField {
                            record: fully_qualified_name.fullname(&None),
                            field: field.name.clone(),
                            source: Box::new(e),
                        }
                    })?;
                items.push((field.name.clone(), value));
            }
            Ok(Value::Record(items))
        }
        Schema::Enum(EnumSchema { symbols, .. }) => {
            let index = zag_i64(reader)?;
            if index >= 0 && (index as usize) < symbols.len() {
                let symbol = symbols[index as usize].clone();
                Ok(Value::Enum(index as u32, symbol))
            } else {
                Err(Details::GetEnumValue {
                    index,
                    nsymbols: symbols.len(),
                }
                .into())
            }
        }
        Schema::Ref { name } => {
            let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
            match names.get(&fully_qualified_name) {
                Some(resolved) => decode_internal(resolved, names, enclosing_namespace, reader),
                None => Err(Error::new(Details::SchemaResolutionError(
                    fully_qualified_name,
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_array_without_size() -> TestResult {
        let mut input: &[u8] = &[6, 2, 4, 6, 0];
        let result = decode(&Schema::Array(Box::new(Schema::Int)), &mut input)?;
        assert_eq!(
            result,
            Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        Ok(())
    }

    #[test]
    fn test_decode_array_with_size() -> TestResult {
        // count -3 (so a byte size follows), size 3, then the items
        let mut input: &[u8] = &[5, 6, 2, 4, 6, 0];
        let result = decode(&Schema::Array(Box::new(Schema::Int)), &mut input)?;
        assert_eq!(
            result,
            Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        Ok(())
    }

    #[test]
    fn test_decode_map_without_size() -> TestResult {
        let mut input: &[u8] = &[0x02, 0x08, 0x74, 0x65, 0x73, 0x74, 0x02, 0x00];
        let result = decode(&Schema::Map(Box::new(Schema::Int)), &mut input)?;
        let mut expected = HashMap::new();
        expected.insert(String::from("test"), Value::Int(1));
        assert_eq!(result, Value::Map(expected));
        Ok(())
    }

    #[test]
    fn test_decode_map_rejects_duplicate_keys() {
        // two blocks, each with the key "k"
        let mut input: &[u8] = &[0x02, 0x02, b'k', 0x02, 0x02, 0x02, b'k', 0x04, 0x00];
        let result = decode(&Schema::Map(Box::new(Schema::Int)), &mut input);
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::DuplicateMapKey(ref k)) if k == "k"
        ));
    }

    #[test]
    fn test_decode_rejects_excessive_block_count() {
        // block count of 2^40 must be rejected before any allocation
        let mut encoded = Vec::new();
        crate::util::zig_i64(1 << 40, &mut encoded).unwrap();
        let mut input = &encoded[..];
        let result = decode(&Schema::Array(Box::new(Schema::Int)), &mut input);
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::BlockCountOverflow { .. })
        ));
    }

    #[test]
    fn test_decode_boolean_rejects_other_bytes() {
        let mut input: &[u8] = &[2];
        assert!(matches!(
            decode(&Schema::Boolean, &mut input).map_err(Error::into_details),
            Err(Details::BoolValue(2))
        ));
    }

    #[test]
    fn test_decode_bytes_rejects_negative_length() {
        let mut input: &[u8] = &[1];
        assert!(matches!(
            decode(&Schema::Bytes, &mut input).map_err(Error::into_details),
            Err(Details::NegativeLength(-1))
        ));
    }

    #[test]
    fn test_decode_enum_rejects_out_of_range_index() -> TestResult {
        let schema =
            Schema::parse_str(r#"{"type": "enum", "name": "E", "symbols": ["x", "y"]}"#)?;

        // an index equal to the symbol count is invalid
        let mut input: &[u8] = &[4];
        assert!(matches!(
            decode(&schema, &mut input).map_err(Error::into_details),
            Err(Details::GetEnumValue { index: 2, nsymbols: 2 })
        ));

        let mut input: &[u8] = &[1];
        assert!(matches!(
            decode(&schema, &mut input).map_err(Error::into_details),
            Err(Details::GetEnumValue { index: -1, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_decode_union_rejects_unknown_index() -> TestResult {
        let schema = Schema::parse_str(r#"["null", "int"]"#)?;
        let mut input: &[u8] = &[4, 6];
        assert!(matches!(
            decode(&schema, &mut input).map_err(Error::into_details),
            Err(Details::GetUnionVariant { index: 2, num_variants: 2 })
        ));
        Ok(())
    }

    #[test]
    fn test_decode_fixed_needs_all_bytes() -> TestResult {
        let schema = Schema::parse_str(r#"{"type": "fixed", "name": "F", "size": 4}"#)?;
        let mut input: &[u8] = &[1, 2, 3];
        assert!(matches!(
            decode(&schema, &mut input).map_err(Error::into_details),
            Err(Details::ReadFixed(_, 4))
        ));
        Ok(())
    }

    #[test]
    fn test_decode_recursive_record_through_array() -> TestResult {
        let schema = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "Tree",
                "fields": [
                    {"name": "label", "type": "int"},
                    {"name": "children", "type": {"type": "array", "items": "Tree"}}
                ]
            }
        "#,
        )?;
        // label=1, one child (label=2, no children), terminator
        let mut input: &[u8] = &[2, 2, 4, 0, 0];
        let result = decode(&schema, &mut input)?;
        assert_eq!(
            result,
            Value::Record(vec![
                ("label".to_string(), Value::Int(1)),
                (
                    "children".to_string(),
                    Value::Array(vec![Value::Record(vec![
                        ("label".to_string(), Value::Int(2)),
                        ("children".to_string(), Value::Array(vec![])),
                    ])])
                ),
            ])
        );
        assert!(input.is_empty());
        Ok(())
    }
}
