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
    EnumSchema, FixedSchema, Name, Names, Namespace, RecordSchema, Schema, SchemaKind,
    resolve_names,
};
use crate::types::{Value, ValueKind};
use crate::util::{DEFAULT_MAX_BLOCK_COUNT, max_block_count, zig_i32, zig_i64};
use crate::{AvroResult, Error};
use log::error;
use std::collections::HashMap;
use std::io::Write;

/// Encode a `Value` into Avro binary format.
///
/// The schema guides the encoding of complex values and the accepted
/// widening of numeric values; any value that does not fit its schema slot
/// losslessly is an error.
pub fn encode<W: Write>(value: &Value, schema: &Schema, writer: &mut W) -> AvroResult<usize> {
    let mut names = HashMap::new();
    resolve_names(schema, &mut names, &None)?;
    encode_internal(value, schema, &names, &None, writer)
}

pub(crate) fn encode_bytes<B: AsRef<[u8]> + ?Sized, W: Write>(
    s: &B,
    mut writer: W,
) -> AvroResult<usize> {
    let bytes = s.as_ref();
    let mut n = encode_long(bytes.len() as i64, &mut writer)?;
    n += writer.write(bytes).map_err(Details::WriteBytes)?;
    Ok(n)
}

pub(crate) fn encode_long<W: Write>(i: i64, writer: W) -> AvroResult<usize> {
    zig_i64(i, writer)
}

pub(crate) fn encode_int<W: Write>(i: i32, writer: W) -> AvroResult<usize> {
    zig_i32(i, writer)
}

fn lossy(value: &Value, target: &'static str) -> Error {
    Details::LossyNumericConversion {
        value: value.clone(),
        target,
    }
    .into()
}

/// Encode a numeric `Value` into the numeric schema slot `schema`, applying
/// the lossless widening rules.
fn encode_numeric<W: Write>(value: &Value, schema: &Schema, writer: &mut W) -> AvroResult<usize> {
    match *schema {
        Schema::Int => match value.as_int_lossless() {
            Some(i) => encode_int(i, writer),
            None => Err(lossy(value, "int")),
        },
        Schema::Long => match value.as_long_lossless() {
            Some(i) => encode_long(i, writer),
            None => Err(lossy(value, "long")),
        },
        Schema::Float => match value.as_float_lossless() {
            Some(x) => writer
                .write(&x.to_le_bytes())
                .map_err(|e| Details::WriteBytes(e).into()),
            None => Err(lossy(value, "float")),
        },
        Schema::Double => match value.as_double_lossless() {
            Some(x) => writer
                .write(&x.to_le_bytes())
                .map_err(|e| Details::WriteBytes(e).into()),
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

pub(crate) fn encode_internal<W: Write>(
    value: &Value,
    schema: &Schema,
    names: &Names,
    enclosing_namespace: &Namespace,
    writer: &mut W,
) -> AvroResult<usize> {
    if let Schema::Ref { name } = schema {
        let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
        let resolved = names
            .get(&fully_qualified_name)
            .ok_or(Details::SchemaResolutionError(fully_qualified_name))?;
        return encode_internal(value, resolved, names, enclosing_namespace, writer);
    }

    match value {
        Value::Null => match schema {
            Schema::Null => Ok(0),
            Schema::Union(union) => match union.null_index() {
                Some(p) => encode_long(p as i64, writer),
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
                writer
                    .write(&[u8::from(*b)])
                    .map_err(|e| Details::WriteBytes(e).into())
            } else {
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Boolean,
                    supported_schema: vec![SchemaKind::Boolean],
                }
                .into())
            }
        }
        Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Double(_) => {
            encode_numeric(value, schema, writer)
        }
        Value::Bytes(bytes) => match *schema {
            Schema::Bytes => encode_bytes(bytes, writer),
            Schema::String => {
                // only accepted when the payload is actual text
                std::str::from_utf8(bytes).map_err(Details::ConvertToUtf8Error)?;
                encode_bytes(bytes, writer)
            }
            Schema::Fixed(FixedSchema { size, .. }) => {
                if size != bytes.len() {
                    return Err(Details::CompareFixedSizes {
                        size,
                        n: bytes.len(),
                    }
                    .into());
                }
                writer
                    .write(bytes.as_slice())
                    .map_err(|e| Details::WriteBytes(e).into())
            }
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Bytes,
                supported_schema: vec![SchemaKind::Bytes, SchemaKind::String, SchemaKind::Fixed],
            }
            .into()),
        },
        Value::String(s) => match *schema {
            Schema::String => encode_bytes(s, writer),
            Schema::Bytes => encode_bytes(s.as_bytes(), writer),
            Schema::Enum(EnumSchema { ref symbols, .. }) => {
                if let Some(index) = symbols.iter().position(|item| item == s) {
                    encode_int(index as i32, writer)
                } else {
                    error!("Invalid symbol string {:?}.", &s[..]);
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
                writer
                    .write(bytes.as_slice())
                    .map_err(|e| Details::WriteBytes(e).into())
            }
            _ => Err(Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Fixed,
                supported_schema: vec![SchemaKind::Fixed],
            }
            .into()),
        },
        Value::Enum(_, s) => match *schema {
            Schema::Enum(EnumSchema { ref symbols, .. }) => {
                match symbols.iter().position(|item| item == s) {
                    Some(index) => encode_int(index as i32, writer),
                    None => Err(Details::GetEnumSymbol(s.clone()).into()),
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
                let inner_schema = inner.variants().get(*idx as usize).ok_or_else(|| {
                    Error::new(Details::GetUnionVariant {
                        index: *idx as i64,
                        num_variants: inner.variants().len(),
                    })
                })?;
                let mut n = encode_long(*idx as i64, &mut *writer)?;
                n +=
                    encode_internal(item, inner_schema, names, enclosing_namespace, &mut *writer)?;
                Ok(n)
            } else {
                error!("invalid schema type for Union: {schema:?}");
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Union,
                    supported_schema: vec![SchemaKind::Union],
                }
                .into())
            }
        }
        Value::Array(items) => {
            if let Schema::Array(ref inner) = *schema {
                let mut n = 0;
                for chunk in items.chunks(encoder_block_len()) {
                    n += encode_long(chunk.len() as i64, &mut *writer)?;
                    for item in chunk.iter() {
                        n += encode_internal(item, inner, names, enclosing_namespace, &mut *writer)?;
                    }
                }
                n += writer.write(&[0u8]).map_err(Details::WriteBytes)?;
                Ok(n)
            } else {
                error!("invalid schema type for Array: {schema:?}");
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Array,
                    supported_schema: vec![SchemaKind::Array],
                }
                .into())
            }
        }
        Value::Map(items) => {
            if let Schema::Map(ref inner) = *schema {
                let mut n = 0;
                let entries: Vec<(&String, &Value)> = items.iter().collect();
                for chunk in entries.chunks(encoder_block_len()) {
                    n += encode_long(chunk.len() as i64, &mut *writer)?;
                    for (key, value) in chunk.iter() {
                        n += encode_bytes(key.as_str(), &mut *writer)?;
                        n += encode_internal(value, inner, names, enclosing_namespace, &mut *writer)?;
                    }
                }
                n += writer.write(&[0u8]).map_err(Details::WriteBytes)?;
                Ok(n)
            } else {
                error!("invalid schema type for Map: {schema:?}");
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
                let record_namespace = record_namespace(name, enclosing_namespace);

                // Every value field must correspond to a schema field.
                for (field_name, _) in value_fields.iter() {
                    if !lookup.contains_key(field_name) {
                        return Err(Details::RecordFieldUnknown(field_name.clone()).into());
                    }
                }

                let by_name: HashMap<&str, &Value> = value_fields
                    .iter()
                    .map(|(name, value)| (name.as_str(), value))
                    .collect();

                let mut n = 0;
                for schema_field in schema_fields.iter() {
                    let value = by_name
                        .get(schema_field.name.as_str())
                        .ok_or_else(|| Error::new(Details::GetField(schema_field.name.clone())))?;
                    n += encode_internal(
                        value,
                        &schema_field.schema,
                        names,
                        &record_namespace,
                        &mut *writer,
                    )
                    .map_err(|e| {
                        Details::EncodeRecordField {
                            record: name.fullname(&None),
                            field: schema_field.name.clone(),
                            source: Box::new(e),
                        }
                    })?;
                }
                Ok(n)
            } else {
                error!("invalid schema type for Record: {schema:?}");
                Err(Details::EncodeValueAsSchemaError {
                    value_kind: ValueKind::Record,
                    supported_schema: vec![SchemaKind::Record],
                }
                .into())
            }
        }
    }
}

/// Largest number of items the encoder puts into a single container block.
fn encoder_block_len() -> usize {
    usize::try_from(max_block_count(DEFAULT_MAX_BLOCK_COUNT)).unwrap_or(usize::MAX)
}

pub(crate) fn record_namespace(name: &Name, enclosing_namespace: &Namespace) -> Namespace {
    name.fully_qualified_name(enclosing_namespace).namespace
}

pub(crate) fn encode_to_vec(value: &Value, schema: &Schema) -> AvroResult<Vec<u8>> {
    let mut buffer = Vec::new();
    encode(value, schema, &mut buffer)?;
    Ok(buffer)
}
