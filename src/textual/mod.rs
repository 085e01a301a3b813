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

//! The textual surface: JSON with Avro-specific rules.
//!
//! This is deliberately not routed through a general-purpose JSON library:
//! the float sentinels (`null`, `1e999`, `-1e999`), the `\u00XX` escape rule
//! for `bytes`, the tagged union objects and the consumed-prefix/tail
//! contract all differ from plain JSON handling.

mod escape;
mod number;

use crate::error::Details;
use crate::schema::{
    EnumSchema, FixedSchema, Names, Namespace, RecordSchema, Schema, SchemaKind, UnionSchema,
};
use crate::types::{Value, ValueKind};
use crate::{AvroResult, Error};
use escape::{decode_bytes_text, decode_string_text, encode_bytes_text, encode_string_text};
use number::number_length;
use std::collections::HashMap;

/// Consume bytes from `buf` until a non-whitespace character is found.
/// It is an error to run out of bytes, because the caller is always scanning
/// ahead to a token.
fn advance_to_non_whitespace(buf: &[u8]) -> AvroResult<&[u8]> {
    for (i, b) in buf.iter().enumerate() {
        if !matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
            return Ok(&buf[i..]);
        }
    }
    Err(Details::TextShortBuffer.into())
}

/// Advance to the next non-whitespace byte and consume it if it is the
/// expected one.
fn advance_and_consume(buf: &[u8], expected: u8) -> AvroResult<&[u8]> {
    let buf = advance_to_non_whitespace(buf)?;
    if buf[0] != expected {
        return Err(Details::TextExpectedByte {
            expected: expected as char,
            found: buf[0] as char,
        }
        .into());
    }
    Ok(&buf[1..])
}

fn expect_literal<'a>(buf: &'a [u8], literal: &'static str) -> AvroResult<&'a [u8]> {
    if buf.starts_with(literal.as_bytes()) {
        Ok(&buf[literal.len()..])
    } else {
        Err(Details::TextExpectedLiteral(literal).into())
    }
}

fn append_float_text(buffer: &mut Vec<u8>, x: f64) -> AvroResult<()> {
    if x.is_nan() {
        buffer.extend_from_slice(b"null");
    } else if x == f64::INFINITY {
        buffer.extend_from_slice(b"1e999");
    } else if x == f64::NEG_INFINITY {
        buffer.extend_from_slice(b"-1e999");
    } else {
        let rendered = serde_json::to_string(&x).map_err(Details::ConvertJsonToString)?;
        buffer.extend_from_slice(rendered.as_bytes());
    }
    Ok(())
}

fn encode_numeric_text(value: &Value, schema: &Schema, buffer: &mut Vec<u8>) -> AvroResult<()> {
    fn lossy(value: &Value, target: &'static str) -> Error {
        Details::LossyNumericConversion {
            value: value.clone(),
            target,
        }
        .into()
    }

    match *schema {
        Schema::Int => match value.as_int_lossless() {
            Some(i) => {
                buffer.extend_from_slice(i.to_string().as_bytes());
                Ok(())
            }
            None => Err(lossy(value, "int")),
        },
        Schema::Long => match value.as_long_lossless() {
            Some(i) => {
                buffer.extend_from_slice(i.to_string().as_bytes());
                Ok(())
            }
            None => Err(lossy(value, "long")),
        },
        Schema::Float => match value.as_float_lossless() {
            Some(x) => append_float_text(buffer, x as f64),
            None => Err(lossy(value, "float")),
        },
        Schema::Double => match value.as_double_lossless() {
            Some(x) => append_float_text(buffer, x),
            None => Err(lossy(value, "double")),
        },
        _ => Err(Details::EncodeValueAsSchemaError {
            value_kind: ValueKind::from(value),
            supported_schema: vec![
                SchemaKind::Int,
                SchemaKind::Long,
                SchemaKind::Float,
                SchemaKind::Double,
            ],
        }
        .into()),
    }
}

/// Encode a `Value` into the textual format guided by `schema`, appending to
/// `buffer`.
pub(crate) fn encode_textual(
    value: &Value,
    schema: &Schema,
    names: &Names,
    enclosing_namespace: &Namespace,
    buffer: &mut Vec<u8>,
) -> AvroResult<()> {
    if let Schema::Ref { name } = schema {
        let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
        let resolved = names
            .get(&fully_qualified_name)
            .ok_or(Details::SchemaResolutionError(fully_qualified_name))?;
        return encode_textual(value, resolved, names, enclosing_namespace, buffer);
    }

    match value {
        Value::Null => match schema {
            Schema::Null => {
                buffer.extend_from_slice(b"null");
                Ok(())
            }
            Schema::Union(union) => match union.null_index() {
                Some(_) => {
                    buffer.extend_from_slice(b"null");
                    Ok(())
                }
                None => Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Null,
                    supported_schema: vec![SchemaKind::Null, SchemaKind::Union],
                }
                .into()),
            },
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Null,
                supported_schema: vec![SchemaKind::Null, SchemaKind::Union],
            }
            .into()),
        },
        Value::Boolean(b) => {
            if let Schema::Boolean = schema {
                buffer.extend_from_slice(if *b { b"true" } else { b"false" });
                Ok(())
            } else {
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Boolean,
                    supported_schema: vec![SchemaKind::Boolean],
                }
                .into())
            }
        }
        Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Double(_) => {
            encode_numeric_text(value, schema, buffer)
        }
        Value::Bytes(bytes) => match *schema {
            Schema::Bytes => {
                encode_bytes_text(buffer, bytes);
                Ok(())
            }
            Schema::String => {
                let s = std::str::from_utf8(bytes).map_err(Details::ConvertToUtf8Error)?;
                encode_string_text(buffer, s);
                Ok(())
            }
            Schema::Fixed(FixedSchema { size, .. }) => {
                if size != bytes.len() {
                    return Err(Details::CompareFixedSizes {
                        size,
                        n: bytes.len(),
                    }
                    .into());
                }
                encode_bytes_text(buffer, bytes);
                Ok(())
            }
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Bytes,
                supported_schema: vec![SchemaKind::Bytes, SchemaKind::String, SchemaKind::Fixed],
            }
            .into()),
        },
        Value::String(s) => match *schema {
            Schema::String => {
                encode_string_text(buffer, s);
                Ok(())
            }
            Schema::Bytes => {
                encode_bytes_text(buffer, s.as_bytes());
                Ok(())
            }
            Schema::Enum(EnumSchema { ref symbols, .. }) => {
                if symbols.iter().any(|item| item == s) {
                    encode_string_text(buffer, s);
                    Ok(())
                } else {
                    Err(Details::GetEnumSymbol(s.clone()).into())
                }
            }
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::String,
                supported_schema: vec![SchemaKind::String, SchemaKind::Bytes, SchemaKind::Enum],
            }
            .into()),
        },
        Value::Fixed(n, bytes) => match *schema {
            Schema::Fixed(FixedSchema { size, .. }) => {
                if *n != size || bytes.len() != size {
                    return Err(Details::CompareFixedSizes { size, n: *n }.into());
                }
                encode_bytes_text(buffer, bytes);
                Ok(())
            }
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Fixed,
                supported_schema: vec![SchemaKind::Fixed],
            }
            .into()),
        },
        Value::Enum(_, s) => match *schema {
            Schema::Enum(EnumSchema { ref symbols, .. }) => {
                if symbols.iter().any(|item| item == s) {
                    encode_string_text(buffer, s);
                    Ok(())
                } else {
                    Err(Details::GetEnumSymbol(s.clone()).into())
                }
            }
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Enum,
                supported_schema: vec![SchemaKind::Enum],
            }
            .into()),
        },
        Value::Union(idx, item) => {
            if let Schema::Union(ref inner) = *schema {
                let member = inner.variants().get(*idx as usize).ok_or_else(|| {
                    Error::new(Details::GetUnionVariant {
                        index: *idx as i64,
                        num_variants: inner.variants().len(),
                    })
                })?;
                if matches!(member, Schema::Null) {
                    buffer.extend_from_slice(b"null");
                    return Ok(());
                }
                buffer.push(b'{');
                encode_string_text(buffer, &member.union_member_name());
                buffer.push(b':');
                encode_textual(item, member, names, enclosing_namespace, buffer)?;
                buffer.push(b'}');
                Ok(())
            } else {
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Union,
                    supported_schema: vec![SchemaKind::Union],
                }
                .into())
            }
        }
        Value::Array(items) => {
            if let Schema::Array(ref inner) = *schema {
                buffer.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        buffer.push(b',');
                    }
                    encode_textual(item, inner, names, enclosing_namespace, buffer)?;
                }
                buffer.push(b']');
                Ok(())
            } else {
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Array,
                    supported_schema: vec![SchemaKind::Array],
                }
                .into())
            }
        }
        Value::Map(items) => {
            if let Schema::Map(ref inner) = *schema {
                buffer.push(b'{');
                for (i, (key, item)) in items.iter().enumerate() {
                    if i > 0 {
                        buffer.push(b',');
                    }
                    encode_string_text(buffer, key);
                    buffer.push(b':');
                    encode_textual(item, inner, names, enclosing_namespace, buffer)?;
                }
                buffer.push(b'}');
                Ok(())
            } else {
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Map,
                    supported_schema: vec![SchemaKind::Map],
                }
                .into())
            }
        }
        Value::Record(value_fields) => {
            if let Schema::Record(RecordSchema {
                ref name,
                fields: ref schema_fields,
                ref lookup,
                ..
            }) = *schema
            {
                let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
                let record_namespace = fully_qualified_name.namespace.clone();

                for (field_name, _) in value_fields.iter() {
                    if !lookup.contains_key(field_name) {
                        return Err(Details::RecordFieldUnknown(field_name.clone()).into());
                    }
                }

                let by_name: HashMap<&str, &Value> = value_fields
                    .iter()
                    .map(|(name, value)| (name.as_str(), value))
                    .collect();

                buffer.push(b'{');
                for (i, schema_field) in schema_fields.iter().enumerate() {
                    if i > 0 {
                        buffer.push(b',');
                    }
                    let value = by_name
                        .get(schema_field.name.as_str())
                        .ok_or_else(|| Error::new(Details::GetField(schema_field.name.clone())))?;
                    encode_string_text(buffer, &schema_field.name);
                    buffer.push(b':');
                    encode_textual(value, &schema_field.schema, names, &record_namespace, buffer)
                        .map_err(|e| {
                            Details::EncodeRecordField {
                                record: fully_qualified_name.fullname(&None),
                                field: schema_field.name.clone(),
                                source: Box::new(e),
                            }
                        })?;
                }
                buffer.push(b'}');
                Ok(())
            } else {
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Record,
                    supported_schema: vec![SchemaKind::Record],
                }
                .into())
            }
        }
    }
}

fn decode_float_text(buf: &[u8]) -> AvroResult<(f64, &[u8])> {
    // sentinels standing in for the IEEE values JSON cannot carry
    if buf.starts_with(b"null") {
        return Ok((f64::NAN, &buf[4..]));
    }
    if buf.starts_with(b"1e999") {
        return Ok((f64::INFINITY, &buf[5..]));
    }
    if buf.starts_with(b"-1e999") {
        return Ok((f64::NEG_INFINITY, &buf[6..]));
    }

    let len = number_length(buf, true)?;
    let text = std::str::from_utf8(&buf[..len]).map_err(Details::ConvertToUtf8Error)?;
    let parsed = text.parse::<f64>().map_err(Details::ParseTextFloat)?;
    Ok((parsed, &buf[len..]))
}

/// Decode a `Value` from the textual format guided by `schema`, returning
/// the value and the unconsumed tail of `buf`.
pub(crate) fn decode_textual<'a>(
    schema: &Schema,
    names: &Names,
    enclosing_namespace: &Namespace,
    buf: &'a [u8],
) -> AvroResult<(Value, &'a [u8])> {
    let buf = advance_to_non_whitespace(buf)?;

    match schema {
        Schema::Null => expect_literal(buf, "null").map(|tail| (Value::Null, tail)),
        Schema::Boolean => match buf[0] {
            b't' => expect_literal(buf, "true").map(|tail| (Value::Boolean(true), tail)),
            _ => expect_literal(buf, "false").map(|tail| (Value::Boolean(false), tail)),
        },
        Schema::Int => {
            let len = number_length(buf, false)?;
            let text = std::str::from_utf8(&buf[..len]).map_err(Details::ConvertToUtf8Error)?;
            let parsed = text.parse::<i32>().map_err(Details::ParseTextInt)?;
            Ok((Value::Int(parsed), &buf[len..]))
        }
        Schema::Long => {
            let len = number_length(buf, false)?;
            let text = std::str::from_utf8(&buf[..len]).map_err(Details::ConvertToUtf8Error)?;
            let parsed = text.parse::<i64>().map_err(Details::ParseTextInt)?;
            Ok((Value::Long(parsed), &buf[len..]))
        }
        Schema::Float => {
            let (parsed, tail) = decode_float_text(buf)?;
            Ok((Value::Float(parsed as f32), tail))
        }
        Schema::Double => {
            let (parsed, tail) = decode_float_text(buf)?;
            Ok((Value::Double(parsed), tail))
        }
        Schema::Bytes => {
            let (bytes, tail) = decode_bytes_text(buf)?;
            Ok((Value::Bytes(bytes), tail))
        }
        Schema::String => {
            let (s, tail) = decode_string_text(buf)?;
            Ok((Value::String(s), tail))
        }
        Schema::Fixed(FixedSchema { size, .. }) => {
            let (bytes, tail) = decode_bytes_text(buf)?;
            if bytes.len() != *size {
                return Err(Details::CompareFixedSizes {
                    size: *size,
                    n: bytes.len(),
                }
                .into());
            }
            Ok((Value::Fixed(*size, bytes), tail))
        }
        Schema::Enum(EnumSchema { symbols, .. }) => {
            let (s, tail) = decode_string_text(buf)?;
            match symbols.iter().position(|symbol| *symbol == s) {
                Some(index) => Ok((Value::Enum(index as u32, s), tail)),
                None => Err(Details::GetEnumSymbol(s).into()),
            }
        }
        Schema::Array(inner) => {
            let mut buf = advance_and_consume(buf, b'[')?;
            let mut items = Vec::new();

            let peeked = advance_to_non_whitespace(buf)?;
            if peeked[0] == b']' {
                return Ok((Value::Array(items), &peeked[1..]));
            }

            loop {
                let (item, tail) = decode_textual(inner, names, enclosing_namespace, buf)?;
                items.push(item);

                let tail = advance_to_non_whitespace(tail)?;
                match tail[0] {
                    b',' => buf = &tail[1..],
                    b']' => return Ok((Value::Array(items), &tail[1..])),
                    found => {
                        return Err(Details::TextExpectedByte {
                            expected: ',',
                            found: found as char,
                        }
                        .into());
                    }
                }
            }
        }
        Schema::Map(inner) => {
            let mut buf = advance_and_consume(buf, b'{')?;
            let mut items = HashMap::new();

            let peeked = advance_to_non_whitespace(buf)?;
            if peeked[0] == b'}' {
                return Ok((Value::Map(items), &peeked[1..]));
            }

            loop {
                let key_start = advance_to_non_whitespace(buf)?;
                let (key, tail) = decode_string_text(key_start)?;
                let tail = advance_and_consume(tail, b':')?;
                let (value, tail) = decode_textual(inner, names, enclosing_namespace, tail)?;
                if items.insert(key.clone(), value).is_some() {
                    return Err(Details::DuplicateMapKey(key).into());
                }

                let tail = advance_to_non_whitespace(tail)?;
                match tail[0] {
                    b',' => buf = &tail[1..],
                    b'}' => return Ok((Value::Map(items), &tail[1..])),
                    found => {
                        return Err(Details::TextExpectedByte {
                            expected: ',',
                            found: found as char,
                        }
                        .into());
                    }
                }
            }
        }
        Schema::Record(RecordSchema {
            name,
            fields,
            lookup,
            ..
        }) => {
            let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
            let record_namespace = fully_qualified_name.namespace.clone();

            let mut buf = advance_and_consume(buf, b'{')?;
            let mut decoded: HashMap<String, Value> = HashMap::with_capacity(fields.len());

            let peeked = advance_to_non_whitespace(buf)?;
            let tail = if peeked[0] == b'}' {
                &peeked[1..]
            } else {
                loop {
                    let key_start = advance_to_non_whitespace(buf)?;
                    let (key, rest) = decode_string_text(key_start)?;
                    let field = match lookup.get(&key) {
                        Some(&position) => &fields[position],
                        None => return Err(Details::CannotDetermineCodec(key).into()),
                    };
                    let rest = advance_and_consume(rest, b':')?;
                    let (value, rest) =
                        decode_textual(&field.schema, names, &record_namespace, rest).map_err(
                            |e| {
                                Details::DecodeRecordField {
                                    record: fully_qualified_name.fullname(&None),
                                    field: field.name.clone(),
                                    source: Box::new(e),
                                }
                            },
                        )?;
                    if decoded.insert(key.clone(), value).is_some() {
                        return Err(Details::DuplicateRecordField(key).into());
                    }

                    let rest = advance_to_non_whitespace(rest)?;
                    match rest[0] {
                        b',' => buf = &rest[1..],
                        b'}' => break &rest[1..],
                        found => {
                            return Err(Details::TextExpectedByte {
                                expected: ',',
                                found: found as char,
                            }
                            .into());
                        }
                    }
                }
            };

            if decoded.len() != fields.len() {
                return Err(Details::TextRecordFieldCount {
                    found: decoded.len(),
                    expected: fields.len(),
                }
                .into());
            }

            let items = fields
                .iter()
                .map(|field| {
                    let value = decoded
                        .remove(&field.name)
                        .expect("every declared field was decoded");
                    (field.name.clone(), value)
                })
                .collect();

            Ok((Value::Record(items), tail))
        }
        Schema::Union(inner) => decode_union_textual(inner, names, enclosing_namespace, buf),
        Schema::Ref { name } => {
            let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
            match names.get(&fully_qualified_name) {
                Some(resolved) => decode_textual(resolved, names, enclosing_namespace, buf),
                None => Err(Error::new(Details::SchemaResolutionError(
                    fully_qualified_name,
                ))),
            }
        }
    }
}

fn decode_union_textual<'a>(
    union: &UnionSchema,
    names: &Names,
    enclosing_namespace: &Namespace,
    buf: &'a [u8],
) -> AvroResult<(Value, &'a [u8])> {
    if buf.starts_with(b"null") {
        if let Some(index) = union.null_index() {
            return Ok((
                Value::Union(index as u32, Box::new(Value::Null)),
                &buf[4..],
            ));
        }
    }

    let tail = advance_and_consume(buf, b'{')?;
    let key_start = advance_to_non_whitespace(tail)?;
    let (key, tail) = decode_string_text(key_start)?;
    let (index, member) = union
        .variant_by_fullname(&key)
        .ok_or_else(|| Error::new(Details::CannotDetermineCodec(key.clone())))?;
    let tail = advance_and_consume(tail, b':')?;
    let (value, tail) = decode_textual(member, names, enclosing_namespace, tail)?;
    // the discriminating object has exactly one entry
    let tail = advance_and_consume(tail, b'}')?;
    Ok((Value::Union(index as u32, Box::new(value)), tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap as StdHashMap;

    fn roundtrip(schema_text: &str, value: &Value) -> TestResult {
        let schema = Schema::parse_str(schema_text)?;
        let mut names = StdHashMap::new();
        crate::schema::resolve_names(&schema, &mut names, &None)?;

        let mut buffer = Vec::new();
        encode_textual(value, &schema, &names, &None, &mut buffer)?;
        let (decoded, tail) = decode_textual(&schema, &names, &None, &buffer)?;
        assert!(tail.is_empty(), "tail not consumed: {tail:?}");
        assert_eq!(&decoded, value);
        Ok(())
    }

    fn text_of(schema_text: &str, value: &Value) -> String {
        let schema = Schema::parse_str(schema_text).unwrap();
        let mut names = StdHashMap::new();
        crate::schema::resolve_names(&schema, &mut names, &None).unwrap();
        let mut buffer = Vec::new();
        encode_textual(value, &schema, &names, &None, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_primitive_texts() {
        assert_eq!(text_of("\"null\"", &Value::Null), "null");
        assert_eq!(text_of("\"boolean\"", &Value::Boolean(false)), "false");
        assert_eq!(text_of("\"int\"", &Value::Int(-1)), "-1");
        assert_eq!(text_of("\"long\"", &Value::Long(42)), "42");
        assert_eq!(text_of("\"string\"", &Value::String("hi".into())), "\"hi\"");
    }

    #[test]
    fn test_float_sentinels() {
        assert_eq!(text_of("\"double\"", &Value::Double(f64::NAN)), "null");
        assert_eq!(text_of("\"double\"", &Value::Double(f64::INFINITY)), "1e999");
        assert_eq!(
            text_of("\"float\"", &Value::Float(f32::NEG_INFINITY)),
            "-1e999"
        );
    }

    #[test]
    fn test_float_sentinels_decode() -> TestResult {
        let schema = Schema::parse_str("\"double\"")?;
        let names = StdHashMap::new();

        let (value, tail) = decode_textual(&schema, &names, &None, b"null,")?;
        assert!(matches!(value, Value::Double(d) if d.is_nan()));
        assert_eq!(tail, b",");

        let (value, _) = decode_textual(&schema, &names, &None, b"1e999")?;
        assert_eq!(value, Value::Double(f64::INFINITY));

        let (value, _) = decode_textual(&schema, &names, &None, b"-1e999")?;
        assert_eq!(value, Value::Double(f64::NEG_INFINITY));
        Ok(())
    }

    #[test]
    fn test_whitespace_tolerated_everywhere() -> TestResult {
        let schema = Schema::parse_str(r#"{"type": "array", "items": "int"}"#)?;
        let names = StdHashMap::new();
        let (value, tail) =
            decode_textual(&schema, &names, &None, b" [ 1 ,\t2 ,\n3 ] !")?;
        assert_eq!(
            value,
            Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert_eq!(tail, b" !");
        Ok(())
    }

    #[test]
    fn test_array_round_trip() -> TestResult {
        roundtrip(
            r#"{"type": "array", "items": "int"}"#,
            &Value::Array(vec![Value::Int(1), Value::Int(2)]),
        )?;
        roundtrip(r#"{"type": "array", "items": "int"}"#, &Value::Array(vec![]))
    }

    #[test]
    fn test_map_round_trip() -> TestResult {
        let mut map = StdHashMap::new();
        map.insert("Helium".to_string(), Value::Int(2));
        roundtrip(r#"{"type": "map", "values": "int"}"#, &Value::Map(map))?;
        roundtrip(
            r#"{"type": "map", "values": "int"}"#,
            &Value::Map(HashMap::new()),
        )
    }

    #[test]
    fn test_record_text_in_declared_order() {
        let text = text_of(
            r#"{"type":"record","name":"r","fields":[
                {"name":"a","type":"string"},{"name":"b","type":"int"}]}"#,
            &Value::Record(vec![
                ("a".to_string(), Value::String("hi".into())),
                ("b".to_string(), Value::Int(13)),
            ]),
        );
        assert_eq!(text, r#"{"a":"hi","b":13}"#);
    }

    #[test]
    fn test_record_decode_any_order_but_exactly_once() -> TestResult {
        let schema = Schema::parse_str(
            r#"{"type":"record","name":"r","fields":[
                {"name":"a","type":"string"},{"name":"b","type":"int"}]}"#,
        )?;
        let names = StdHashMap::new();

        let (value, _) =
            decode_textual(&schema, &names, &None, br#"{"b": 13, "a": "hi"}"#)?;
        assert_eq!(
            value,
            Value::Record(vec![
                ("a".to_string(), Value::String("hi".into())),
                ("b".to_string(), Value::Int(13)),
            ])
        );

        // missing field
        let result = decode_textual(&schema, &names, &None, br#"{"a": "hi"}"#);
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::TextRecordFieldCount {
                found: 1,
                expected: 2
            })
        ));

        // unknown field
        let result =
            decode_textual(&schema, &names, &None, br#"{"a": "hi", "x": 1, "b": 2}"#);
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::CannotDetermineCodec(ref key)) if key == "x"
        ));

        // duplicate field
        let result =
            decode_textual(&schema, &names, &None, br#"{"a": "hi", "a": "ho", "b": 2}"#);
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::DuplicateRecordField(ref key)) if key == "a"
        ));
        Ok(())
    }

    #[test]
    fn test_union_tagged_object() -> TestResult {
        let schema = Schema::parse_str(r#"["null", "int"]"#)?;
        let names = StdHashMap::new();

        let mut buffer = Vec::new();
        encode_textual(
            &Value::Union(1, Box::new(Value::Int(3))),
            &schema,
            &names,
            &None,
            &mut buffer,
        )?;
        assert_eq!(buffer, br#"{"int":3}"#);

        let (value, tail) = decode_textual(&schema, &names, &None, &buffer)?;
        assert_eq!(value, Value::Union(1, Box::new(Value::Int(3))));
        assert!(tail.is_empty());

        buffer.clear();
        encode_textual(&Value::Null, &schema, &names, &None, &mut buffer)?;
        assert_eq!(buffer, b"null");

        let (value, _) = decode_textual(&schema, &names, &None, b"null")?;
        assert_eq!(value, Value::Union(0, Box::new(Value::Null)));
        Ok(())
    }

    #[test]
    fn test_union_with_zero_int() -> TestResult {
        roundtrip(
            r#"["null", "int"]"#,
            &Value::Union(1, Box::new(Value::Int(0))),
        )
    }

    #[test]
    fn test_union_unknown_member_key() -> TestResult {
        let schema = Schema::parse_str(r#"["null", "int"]"#)?;
        let names = StdHashMap::new();
        let result = decode_textual(&schema, &names, &None, br#"{"string":"x"}"#);
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::CannotDetermineCodec(ref key)) if key == "string"
        ));
        Ok(())
    }

    #[test]
    fn test_fixed_text() -> TestResult {
        let schema_text = r#"{"type": "fixed", "name": "F", "size": 4}"#;
        assert_eq!(
            text_of(schema_text, &Value::Fixed(4, b"abcd".to_vec())),
            "\"abcd\""
        );
        roundtrip(schema_text, &Value::Fixed(4, vec![0x00, 0x01, 0xfe, 0xff]))?;

        let schema = Schema::parse_str(schema_text)?;
        let names = StdHashMap::new();
        let result = decode_textual(&schema, &names, &None, b"\"abc\"");
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::CompareFixedSizes { size: 4, n: 3 })
        ));
        Ok(())
    }

    #[test]
    fn test_enum_text() -> TestResult {
        let schema_text = r#"{"type": "enum", "name": "E", "symbols": ["x", "y"]}"#;
        assert_eq!(text_of(schema_text, &Value::Enum(1, "y".into())), "\"y\"");
        roundtrip(schema_text, &Value::Enum(0, "x".into()))?;

        let schema = Schema::parse_str(schema_text)?;
        let names = StdHashMap::new();
        let result = decode_textual(&schema, &names, &None, b"\"z\"");
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::GetEnumSymbol(ref s)) if s == "z"
        ));
        Ok(())
    }

    #[test]
    fn test_recursive_record_text() -> TestResult {
        roundtrip(
            r#"
            {
                "type": "record",
                "name": "LongList",
                "fields": [
                    {"name": "value", "type": "long"},
                    {"name": "next", "type": ["null", "LongList"]}
                ]
            }
            "#,
            &Value::Record(vec![
                ("value".to_string(), Value::Long(1)),
                (
                    "next".to_string(),
                    Value::Union(
                        1,
                        Box::new(Value::Record(vec![
                            ("value".to_string(), Value::Long(2)),
                            ("next".to_string(), Value::Union(0, Box::new(Value::Null))),
                        ])),
                    ),
                ),
            ]),
        )
    }
}
