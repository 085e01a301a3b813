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

//! Logic for parsing and interacting with schemas in Avro format.

mod builders;
mod name;
mod parser;
mod resolve;
mod union;

pub use name::{Name, Names, NamesRef, Namespace};
pub(crate) use parser::Parser;
pub use resolve::resolve_names;
pub use union::UnionSchema;

use crate::AvroResult;
use crate::error::Details;
use crate::util::MapHelper;
use crate::validator::validate_record_field_name;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use strum_macros::EnumDiscriminants;

/// Documentation attached to a named schema or a record field.
pub type Documentation = Option<String>;

/// Represents any valid Avro schema.
///
/// More information about Avro schemas can be found in the
/// [Avro specification](https://avro.apache.org/docs/++version++/specification/#schema-declaration)
#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(SchemaKind), derive(Hash))]
pub enum Schema {
    /// A `null` Avro schema.
    Null,
    /// A `boolean` Avro schema.
    Boolean,
    /// An `int` Avro schema.
    Int,
    /// A `long` Avro schema.
    Long,
    /// A `float` Avro schema.
    Float,
    /// A `double` Avro schema.
    Double,
    /// A `bytes` Avro schema.
    ///
    /// `Bytes` represents a sequence of 8-bit unsigned bytes.
    Bytes,
    /// A `string` Avro schema.
    ///
    /// `String` represents a unicode character sequence.
    String,
    /// An `array` Avro schema.
    ///
    /// All items will have the same schema.
    Array(Box<Schema>),
    /// A `map` Avro schema.
    ///
    /// Keys are always a `Schema::String` and all values will have the same
    /// schema.
    Map(Box<Schema>),
    /// A `union` Avro schema.
    Union(UnionSchema),
    /// A `record` Avro schema.
    Record(RecordSchema),
    /// An `enum` Avro schema.
    Enum(EnumSchema),
    /// A `fixed` Avro schema.
    Fixed(FixedSchema),
    /// A reference to another schema that was defined earlier in the same
    /// document.
    Ref { name: Name },
}

/// A description of a record schema.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSchema {
    /// The name of the schema
    pub name: Name,
    /// The documentation of the schema
    pub doc: Documentation,
    /// The set of fields of the schema, in declaration order
    pub fields: Vec<RecordField>,
    /// The lookup table mapping a field name to its position in `fields`
    pub lookup: BTreeMap<String, usize>,
}

/// Represents a `field` in a `record` Avro schema.
#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct RecordField {
    /// Name of the field.
    #[builder(into)]
    pub name: String,
    /// Documentation of the field.
    #[builder(default)]
    pub doc: Documentation,
    /// Schema of the field.
    pub schema: Schema,
}

impl RecordField {
    /// Parse a `serde_json::Value` into a `RecordField`.
    pub(crate) fn parse(
        field: &Map<String, JsonValue>,
        parser: &mut Parser,
        enclosing_record: &Name,
    ) -> AvroResult<Self> {
        let name = field.name().ok_or(Details::GetNameFieldFromRecord)?;

        validate_record_field_name(&name)?;

        let ty = field.get("type").ok_or(Details::GetRecordFieldTypeField)?;
        let schema = parser.parse(ty, &enclosing_record.namespace)?;

        Ok(RecordField {
            name,
            doc: field.doc(),
            schema,
        })
    }
}

/// A description of an enum schema.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumSchema {
    /// The name of the schema
    pub name: Name,
    /// The documentation of the schema
    pub doc: Documentation,
    /// The set of symbols of the schema
    pub symbols: Vec<String>,
}

/// A description of a fixed schema.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedSchema {
    /// The name of the schema
    pub name: Name,
    /// The documentation of the schema
    pub doc: Documentation,
    /// The number of bytes of the fixed schema, always positive
    pub size: usize,
}

impl SchemaKind {
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            SchemaKind::Null
                | SchemaKind::Boolean
                | SchemaKind::Int
                | SchemaKind::Long
                | SchemaKind::Double
                | SchemaKind::Float
                | SchemaKind::Bytes
                | SchemaKind::String,
        )
    }
}

impl Schema {
    /// Create a `Schema` from a string representing a JSON Avro schema.
    pub fn parse_str(input: &str) -> AvroResult<Schema> {
        let mut parser = Parser::default();
        parser.parse_str(input)
    }

    /// Create a `Schema` from a reader yielding a JSON Avro schema.
    pub fn parse_reader(reader: &mut (impl Read + ?Sized)) -> AvroResult<Schema> {
        let mut buf = String::new();
        match reader.read_to_string(&mut buf) {
            Ok(_) => Self::parse_str(&buf),
            Err(e) => Err(Details::ReadBytes(e).into()),
        }
    }

    /// Create a `Schema` from a `serde_json::Value` representing a JSON Avro
    /// schema.
    pub fn parse(value: &JsonValue) -> AvroResult<Schema> {
        let mut parser = Parser::default();
        parser.parse(value, &None)
    }

    /// Returns the name of the schema if it is a named type.
    pub fn name(&self) -> Option<&Name> {
        match self {
            Schema::Record(RecordSchema { ref name, .. })
            | Schema::Enum(EnumSchema { ref name, .. })
            | Schema::Fixed(FixedSchema { ref name, .. })
            | Schema::Ref { ref name } => Some(name),
            _ => None,
        }
    }

    /// Returns the namespace of the schema if it is a named type.
    pub fn namespace(&self) -> Namespace {
        self.name().and_then(|n| n.namespace.clone())
    }

    /// Returns true if the schema is a named type: `record`, `enum` or
    /// `fixed`, or a reference to one.
    pub fn is_named(&self) -> bool {
        matches!(
            self,
            Schema::Record(_) | Schema::Enum(_) | Schema::Fixed(_) | Schema::Ref { .. }
        )
    }

    /// The name that identifies this schema as a union member and as the key
    /// of the textual union form: the fullname for named types, the bare type
    /// name for everything else.
    pub fn union_member_name(&self) -> String {
        match self {
            Schema::Null => "null".to_string(),
            Schema::Boolean => "boolean".to_string(),
            Schema::Int => "int".to_string(),
            Schema::Long => "long".to_string(),
            Schema::Float => "float".to_string(),
            Schema::Double => "double".to_string(),
            Schema::Bytes => "bytes".to_string(),
            Schema::String => "string".to_string(),
            Schema::Array(_) => "array".to_string(),
            Schema::Map(_) => "map".to_string(),
            Schema::Union(_) => "union".to_string(),
            Schema::Record(RecordSchema { name, .. })
            | Schema::Enum(EnumSchema { name, .. })
            | Schema::Fixed(FixedSchema { name, .. })
            | Schema::Ref { name } => name.fullname(&None),
        }
    }

    /// Converts `self` into its [Parsing Canonical Form].
    ///
    /// [Parsing Canonical Form]:
    /// https://avro.apache.org/docs/++version++/specification/#parsing-canonical-form-for-schemas
    pub fn canonical_form(&self) -> String {
        let json = serde_json::to_value(self)
            .unwrap_or_else(|e| panic!("Cannot serialize Schema to JSON: {e}"));
        let mut defined_names = HashSet::new();
        parsing_canonical_form(&json, &None, &mut defined_names)
    }
}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Schema::Null => serializer.serialize_str("null"),
            Schema::Boolean => serializer.serialize_str("boolean"),
            Schema::Int => serializer.serialize_str("int"),
            Schema::Long => serializer.serialize_str("long"),
            Schema::Float => serializer.serialize_str("float"),
            Schema::Double => serializer.serialize_str("double"),
            Schema::Bytes => serializer.serialize_str("bytes"),
            Schema::String => serializer.serialize_str("string"),
            Schema::Array(ref inner) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", inner.as_ref())?;
                map.end()
            }
            Schema::Map(ref inner) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "map")?;
                map.serialize_entry("values", inner.as_ref())?;
                map.end()
            }
            Schema::Union(ref inner) => {
                let variants = inner.variants();
                let mut seq = serializer.serialize_seq(Some(variants.len()))?;
                for v in variants {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Schema::Record(RecordSchema {
                ref name,
                ref doc,
                ref fields,
                ..
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "record")?;
                if let Some(ref n) = name.namespace {
                    map.serialize_entry("namespace", n)?;
                }
                map.serialize_entry("name", &name.name)?;
                if let Some(ref docstr) = doc {
                    map.serialize_entry("doc", docstr)?;
                }
                map.serialize_entry("fields", fields)?;
                map.end()
            }
            Schema::Enum(EnumSchema {
                ref name,
                ref doc,
                ref symbols,
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "enum")?;
                if let Some(ref n) = name.namespace {
                    map.serialize_entry("namespace", n)?;
                }
                map.serialize_entry("name", &name.name)?;
                if let Some(ref docstr) = doc {
                    map.serialize_entry("doc", docstr)?;
                }
                map.serialize_entry("symbols", symbols)?;
                map.end()
            }
            Schema::Fixed(FixedSchema {
                ref name,
                ref doc,
                ref size,
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "fixed")?;
                if let Some(ref n) = name.namespace {
                    map.serialize_entry("namespace", n)?;
                }
                map.serialize_entry("name", &name.name)?;
                if let Some(ref docstr) = doc {
                    map.serialize_entry("doc", docstr)?;
                }
                map.serialize_entry("size", size)?;
                map.end()
            }
            Schema::Ref { ref name } => serializer.serialize_str(&name.fullname(&None)),
        }
    }
}

impl Serialize for RecordField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("type", &self.schema)?;

        if let Some(ref doc) = self.doc {
            map.serialize_entry("doc", doc)?;
        }

        map.end()
    }
}

// Fields of a named type in the order mandated by the Parsing Canonical Form.
const PCF_FIELD_ORDER: [&str; 7] = [
    "name", "type", "fields", "symbols", "items", "values", "size",
];

/// Transform the JSON rendering of a schema into the Parsing Canonical Form:
/// strip attributes that do not affect the encoding, fully qualify names and
/// fix the attribute order.
fn parsing_canonical_form(
    schema: &JsonValue,
    enclosing_namespace: &Namespace,
    defined_names: &mut HashSet<String>,
) -> String {
    match schema {
        JsonValue::Object(map) => pcf_map(map, enclosing_namespace, defined_names),
        JsonValue::String(s) => pcf_string(s),
        JsonValue::Array(v) => pcf_array(v, enclosing_namespace, defined_names),
        json => panic!("got invalid JSON value for canonical form of schema: {json}"),
    }
}

fn pcf_map(
    schema: &Map<String, JsonValue>,
    enclosing_namespace: &Namespace,
    defined_names: &mut HashSet<String>,
) -> String {
    // Look up the namespace, either on this type or inherited.
    let namespace = schema
        .get("namespace")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .or_else(|| enclosing_namespace.clone());

    // Only record, enum and fixed introduce names; a record field also has a
    // `name` attribute but it is never qualified.
    let is_named_type = matches!(
        schema.get("type").and_then(|t| t.as_str()),
        Some("record" | "enum" | "fixed")
    );

    let fullname = if is_named_type {
        schema.get("name").and_then(|v| v.as_str()).map(|name| {
            if name.contains('.') {
                name.to_string()
            } else {
                match namespace {
                    Some(ref ns) if !ns.is_empty() => format!("{ns}.{name}"),
                    _ => name.to_string(),
                }
            }
        })
    } else {
        None
    };

    if let Some(ref fullname) = fullname {
        // A second occurrence of a name is replaced by a plain reference.
        if !defined_names.insert(fullname.clone()) {
            return pcf_string(fullname);
        }
    }

    let mut fields = Vec::new();
    for &field in PCF_FIELD_ORDER.iter() {
        let value = match schema.get(field) {
            Some(value) => value,
            None => continue,
        };

        let field_value = match (field, value) {
            // Fully qualify the name of a named type.
            ("name", JsonValue::String(s)) => match fullname {
                Some(ref fullname) => pcf_string(fullname),
                None => pcf_string(s),
            },
            // Sizes stay numbers.
            ("size", JsonValue::Number(n)) => n.to_string(),
            _ => parsing_canonical_form(value, &namespace, defined_names),
        };

        fields.push(format!("{}:{}", pcf_string(field), field_value));
    }

    format!("{{{}}}", fields.join(","))
}

fn pcf_array(
    arr: &[JsonValue],
    enclosing_namespace: &Namespace,
    defined_names: &mut HashSet<String>,
) -> String {
    let inter = arr
        .iter()
        .map(|a| parsing_canonical_form(a, enclosing_namespace, defined_names))
        .collect::<Vec<String>>()
        .join(",");
    format!("[{inter}]")
}

fn pcf_string(s: &str) -> String {
    format!("\"{s}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestResult;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_primitive_strings() -> TestResult {
        for (text, expected) in [
            ("\"null\"", Schema::Null),
            ("\"boolean\"", Schema::Boolean),
            ("\"int\"", Schema::Int),
            ("\"long\"", Schema::Long),
            ("\"float\"", Schema::Float),
            ("\"double\"", Schema::Double),
            ("\"bytes\"", Schema::Bytes),
            ("\"string\"", Schema::String),
        ] {
            assert_eq!(Schema::parse_str(text)?, expected);
        }
        Ok(())
    }

    #[test]
    fn test_bare_primitive_names_are_valid_schemas() -> TestResult {
        // not valid JSON, but a valid schema
        assert_eq!(Schema::parse_str("long")?, Schema::Long);
        Ok(())
    }

    #[test]
    fn test_wrapper_type_object() -> TestResult {
        assert_eq!(Schema::parse_str(r#"{"type": {"type": "string"}}"#)?, Schema::String);
        Ok(())
    }

    #[test]
    fn test_array_schema() -> TestResult {
        let schema = Schema::parse_str(r#"{"type": "array", "items": "string"}"#)?;
        assert_eq!(schema, Schema::Array(Box::new(Schema::String)));
        Ok(())
    }

    #[test]
    fn test_map_schema() -> TestResult {
        let schema = Schema::parse_str(r#"{"type": "map", "values": "double"}"#)?;
        assert_eq!(schema, Schema::Map(Box::new(Schema::Double)));
        Ok(())
    }

    #[test]
    fn test_record_schema() -> TestResult {
        let schema = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long"},
                    {"name": "b", "type": "string"}
                ]
            }
        "#,
        )?;

        let mut lookup = BTreeMap::new();
        lookup.insert("a".to_owned(), 0);
        lookup.insert("b".to_owned(), 1);

        let expected = Schema::Record(RecordSchema {
            name: Name::new("test")?,
            doc: None,
            fields: vec![
                RecordField {
                    name: "a".to_string(),
                    doc: None,
                    schema: Schema::Long,
                },
                RecordField {
                    name: "b".to_string(),
                    doc: None,
                    schema: Schema::String,
                },
            ],
            lookup,
        });

        assert_eq!(schema, expected);
        Ok(())
    }

    #[test]
    fn test_duplicate_record_field_is_an_error() {
        let result = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": "long"},
                    {"name": "a", "type": "string"}
                ]
            }
        "#,
        );
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::FieldNameDuplicate(ref name)) if name == "a"
        ));
    }

    #[test]
    fn test_enum_schema() -> TestResult {
        let schema = Schema::parse_str(
            r#"{"type": "enum", "name": "Suit", "symbols": ["diamonds", "spades", "clubs", "hearts"]}"#,
        )?;
        match schema {
            Schema::Enum(EnumSchema { name, symbols, .. }) => {
                assert_eq!(name, Name::new("Suit")?);
                assert_eq!(symbols, vec!["diamonds", "spades", "clubs", "hearts"]);
            }
            other => panic!("Expected an enum schema, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_enum_schema_duplicate_symbol() {
        let result = Schema::parse_str(
            r#"{"type": "enum", "name": "Suit", "symbols": ["diamonds", "diamonds"]}"#,
        );
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::EnumSymbolDuplicate(_))
        ));
    }

    #[test]
    fn test_enum_schema_without_symbols() {
        let result = Schema::parse_str(r#"{"type": "enum", "name": "Suit", "symbols": []}"#);
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::GetEnumSymbolsEmpty)
        ));
    }

    #[test]
    fn test_enum_schema_invalid_symbol() {
        let result =
            Schema::parse_str(r#"{"type": "enum", "name": "Suit", "symbols": ["not-valid"]}"#);
        assert!(matches!(
            result.map_err(Error::into_details),
            Err(Details::InvalidEnumSymbolName(_, _))
        ));
    }

    #[test]
    fn test_fixed_schema() -> TestResult {
        let schema = Schema::parse_str(r#"{"type": "fixed", "name": "md5", "size": 16}"#)?;
        assert_eq!(
            schema,
            Schema::Fixed(FixedSchema {
                name: Name::new("md5")?,
                doc: None,
                size: 16,
            })
        );
        Ok(())
    }

    #[test]
    fn test_fixed_schema_size_must_be_positive() {
        for text in [
            r#"{"type": "fixed", "name": "md5", "size": 0}"#,
            r#"{"type": "fixed", "name": "md5", "size": -16}"#,
            r#"{"type": "fixed", "name": "md5"}"#,
        ] {
            assert!(Schema::parse_str(text).is_err(), "{text}");
        }
    }

    #[test]
    fn test_recursive_record_schema() -> TestResult {
        let schema = Schema::parse_str(
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
        )?;

        match schema {
            Schema::Record(RecordSchema { fields, .. }) => {
                let next = &fields[1];
                match next.schema {
                    Schema::Union(ref union) => {
                        assert_eq!(
                            union.variants()[1],
                            Schema::Ref {
                                name: Name::new("LongList")?
                            }
                        );
                    }
                    ref other => panic!("Expected a union, got {other:?}"),
                }
            }
            other => panic!("Expected a record, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_namespace_inherited_by_children() -> TestResult {
        let schema = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "com.example.Outer",
                "fields": [
                    {"name": "inner", "type": {
                        "type": "record",
                        "name": "Inner",
                        "fields": [{"name": "x", "type": "int"}]
                    }}
                ]
            }
        "#,
        )?;

        match schema {
            Schema::Record(RecordSchema { name, fields, .. }) => {
                assert_eq!(name.fullname(&None), "com.example.Outer");
                match fields[0].schema {
                    Schema::Record(RecordSchema { ref name, .. }) => {
                        assert_eq!(name.fullname(&None), "com.example.Inner");
                    }
                    ref other => panic!("Expected a record, got {other:?}"),
                }
            }
            other => panic!("Expected a record, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_same_name_twice_is_an_error() {
        let result = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "test",
                "fields": [
                    {"name": "a", "type": {"type": "fixed", "name": "F", "size": 2}},
                    {"name": "b", "type": {"type": "fixed", "name": "F", "size": 4}}
                ]
            }
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_round_trips_through_parse() -> TestResult {
        let raw = r#"
            {
                "type": "record",
                "namespace": "com.example",
                "name": "Outer",
                "fields": [
                    {"name": "tags", "type": {"type": "array", "items": "string"}},
                    {"name": "code", "type": {"type": "enum", "name": "Code", "symbols": ["A", "B"]}},
                    {"name": "again", "type": "Code"}
                ]
            }
        "#;
        let schema = Schema::parse_str(raw)?;
        let serialized = serde_json::to_string(&schema)?;
        let reparsed = Schema::parse_str(&serialized)?;
        assert_eq!(schema, reparsed);
        Ok(())
    }

    #[test]
    fn test_canonical_form_strips_extras() -> TestResult {
        let schema = Schema::parse_str(
            r#"
            {
                "type": "record",
                "name": "test",
                "doc": "some docs",
                "fields": [
                    {"name": "a", "type": "long", "doc": "a field"}
                ]
            }
        "#,
        )?;
        assert_eq!(
            schema.canonical_form(),
            r#"{"name":"test","type":"record","fields":[{"name":"a","type":"long"}]}"#
        );
        Ok(())
    }

    #[test]
    fn test_canonical_form_qualifies_names() -> TestResult {
        let schema = Schema::parse_str(
            r#"{"type": "fixed", "namespace": "com.example", "name": "F", "size": 4}"#,
        )?;
        assert_eq!(
            schema.canonical_form(),
            r#"{"name":"com.example.F","type":"fixed","size":4}"#
        );
        Ok(())
    }
}
