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
    EnumSchema, FixedSchema, Name, Names, Namespace, RecordField, RecordSchema, Schema,
    UnionSchema,
};
use crate::util::MapHelper;
use crate::validator::validate_enum_symbol_name;
use crate::{AvroResult, Error};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

#[derive(Default)]
pub(crate) struct Parser {
    /// Used to resolve cyclic references, i.e. when a
    /// field's type is a reference to its record's type
    resolving_schemas: Names,
    /// Used to avoid parsing the same schema twice
    parsed_schemas: Names,
}

impl Parser {
    /// Create a `Schema` from a string representing a JSON Avro schema.
    pub(super) fn parse_str(&mut self, input: &str) -> AvroResult<Schema> {
        // Some clients hand over an unadorned primitive type name for the
        // schema, e.g. `long`. While that is not valid JSON, it is a valid
        // schema.
        if let Some(primitive) = parse_primitive_name(input.trim()) {
            return Ok(primitive);
        }

        let value = serde_json::from_str(input).map_err(Details::ParseSchemaJson)?;
        self.parse(&value, &None)
    }

    /// Create a `Schema` from a `serde_json::Value` representing a JSON Avro
    /// schema.
    pub(super) fn parse(
        &mut self,
        value: &Value,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        match *value {
            Value::String(ref t) => self.parse_known_schema(t.as_str(), enclosing_namespace),
            Value::Object(ref data) => self.parse_complex(data, enclosing_namespace),
            Value::Array(ref data) => self.parse_union(data, enclosing_namespace),
            _ => Err(Details::ParseSchemaFromValidJson.into()),
        }
    }

    /// Parse a string as a primitive type or a reference to a previously
    /// defined named type.
    fn parse_known_schema(
        &mut self,
        name: &str,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        match parse_primitive_name(name) {
            Some(primitive) => Ok(primitive),
            None => self.fetch_schema_ref(name, enclosing_namespace),
        }
    }

    /// Given a name, try to retrieve the parsed schema from `parsed_schemas`.
    ///
    /// If a parsed schema is not found, it checks if a currently resolving
    /// schema with that name exists; this is what makes direct and mutual
    /// recursion work.
    fn fetch_schema_ref(
        &mut self,
        name: &str,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        let fully_qualified_name =
            Name::new(name)?.fully_qualified_name(enclosing_namespace);

        if self.parsed_schemas.contains_key(&fully_qualified_name) {
            return Ok(Schema::Ref {
                name: fully_qualified_name,
            });
        }
        if let Some(resolving_schema) = self.resolving_schemas.get(&fully_qualified_name) {
            return Ok(resolving_schema.clone());
        }

        // For good error reporting we add this check
        match fully_qualified_name.name.as_str() {
            "record" | "enum" | "fixed" => {
                Err(Details::InvalidSchemaRecord(fully_qualified_name.name.clone()).into())
            }
            _ => {
                let full_name = fully_qualified_name.fullname(&None);
                if full_name == "bool" {
                    Err(Details::ParsePrimitiveSimilar(full_name, "boolean").into())
                } else {
                    Err(Details::ParsePrimitive(full_name).into())
                }
            }
        }
    }

    /// Parse a `serde_json::Value` representing a complex Avro type into a
    /// `Schema`.
    ///
    /// Avro supports "recursive" definition of types.
    /// e.g: `{"type": {"type": "string"}}`
    fn parse_complex(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        match complex.get("type") {
            Some(Value::String(t)) => match t.as_str() {
                "record" => self.parse_record(complex, enclosing_namespace),
                "enum" => self.parse_enum(complex, enclosing_namespace),
                "array" => self.parse_array(complex, enclosing_namespace),
                "map" => self.parse_map(complex, enclosing_namespace),
                "fixed" => self.parse_fixed(complex, enclosing_namespace),
                other => self.parse_known_schema(other, enclosing_namespace),
            },
            Some(Value::Object(data)) => self.parse_complex(data, enclosing_namespace),
            Some(Value::Array(variants)) => self.parse_union(variants, enclosing_namespace),
            Some(unknown) => Err(Details::GetComplexType(unknown.clone()).into()),
            None => Err(Details::GetComplexTypeField.into()),
        }
    }

    /// Register a placeholder reference before a named type's children are
    /// compiled, so the children may legally refer to this name.
    fn register_resolving_schema(&mut self, name: &Name) -> AvroResult<()> {
        if self.parsed_schemas.contains_key(name) || self.resolving_schemas.contains_key(name) {
            return Err(Details::NameCollision(name.fullname(&None)).into());
        }
        self.resolving_schemas
            .insert(name.clone(), Schema::Ref { name: name.clone() });
        Ok(())
    }

    fn register_parsed_schema(&mut self, fully_qualified_name: &Name, schema: &Schema) {
        self.parsed_schemas
            .insert(fully_qualified_name.clone(), schema.clone());
        self.resolving_schemas.remove(fully_qualified_name);
    }

    /// Returns an already parsed schema or a schema that is currently being
    /// resolved, for objects like `{"type": "ExistingName"}` that carry no
    /// definition of their own.
    fn get_already_seen_schema(
        &self,
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> Option<&Schema> {
        match complex.get("type") {
            Some(Value::String(typ)) => {
                let name = Name::new(typ.as_str())
                    .ok()?
                    .fully_qualified_name(enclosing_namespace);
                self.resolving_schemas
                    .get(&name)
                    .or_else(|| self.parsed_schemas.get(&name))
            }
            _ => None,
        }
    }

    /// Parse a `serde_json::Value` representing an Avro record type into a
    /// `Schema`.
    fn parse_record(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        let fields_opt = complex.get("fields");

        if fields_opt.is_none() {
            if let Some(seen) = self.get_already_seen_schema(complex, enclosing_namespace) {
                return Ok(seen.clone());
            }
        }

        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;

        self.register_resolving_schema(&fully_qualified_name)?;

        debug!("Going to parse record schema: {:?}", &fully_qualified_name);

        let field_objects = fields_opt
            .and_then(|fields| fields.as_array())
            .ok_or_else(|| Error::new(Details::GetRecordFieldsJson))?;

        let mut fields: Vec<RecordField> = Vec::with_capacity(field_objects.len());
        for (position, field) in field_objects.iter().enumerate() {
            let field = field
                .as_object()
                .ok_or_else(|| Error::new(Details::GetRecordFieldsJson))?;
            let field = RecordField::parse(field, self, &fully_qualified_name).map_err(|e| {
                Details::RecordFieldType {
                    record: fully_qualified_name.fullname(&None),
                    position,
                    source: Box::new(e),
                }
            })?;
            fields.push(field);
        }

        let mut lookup = BTreeMap::new();
        for (position, field) in fields.iter().enumerate() {
            if lookup.insert(field.name.clone(), position).is_some() {
                return Err(Details::FieldNameDuplicate(field.name.clone()).into());
            }
        }

        let schema = Schema::Record(RecordSchema {
            name: fully_qualified_name.clone(),
            doc: complex.doc(),
            fields,
            lookup,
        });

        self.register_parsed_schema(&fully_qualified_name, &schema);
        Ok(schema)
    }

    /// Parse a `serde_json::Value` representing an Avro enum type into a
    /// `Schema`.
    fn parse_enum(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        let symbols_opt = complex.get("symbols");

        if symbols_opt.is_none() {
            if let Some(seen) = self.get_already_seen_schema(complex, enclosing_namespace) {
                return Ok(seen.clone());
            }
        }

        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;

        let symbols: Vec<String> = symbols_opt
            .and_then(|v| v.as_array())
            .ok_or_else(|| Error::from(Details::GetEnumSymbolsField))
            .and_then(|symbols| {
                symbols
                    .iter()
                    .map(|symbol| symbol.as_str().map(|s| s.to_string()))
                    .collect::<Option<_>>()
                    .ok_or_else(|| Error::from(Details::GetEnumSymbols))
            })?;

        if symbols.is_empty() {
            return Err(Details::GetEnumSymbolsEmpty.into());
        }

        let mut existing_symbols: HashSet<&String> = HashSet::with_capacity(symbols.len());
        for symbol in symbols.iter() {
            validate_enum_symbol_name(symbol)?;

            // Ensure there are no duplicate symbols
            if existing_symbols.contains(&symbol) {
                return Err(Details::EnumSymbolDuplicate(symbol.to_string()).into());
            }

            existing_symbols.insert(symbol);
        }

        let schema = Schema::Enum(EnumSchema {
            name: fully_qualified_name.clone(),
            doc: complex.doc(),
            symbols,
        });

        self.register_resolving_schema(&fully_qualified_name)?;
        self.register_parsed_schema(&fully_qualified_name, &schema);

        Ok(schema)
    }

    /// Parse a `serde_json::Value` representing an Avro array type into a
    /// `Schema`.
    fn parse_array(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        complex
            .get("items")
            .ok_or_else(|| Details::GetArrayItemsField.into())
            .and_then(|items| self.parse(items, enclosing_namespace))
            .map(|items| Schema::Array(Box::new(items)))
    }

    /// Parse a `serde_json::Value` representing an Avro map type into a
    /// `Schema`.
    fn parse_map(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        complex
            .get("values")
            .ok_or_else(|| Details::GetMapValuesField.into())
            .and_then(|values| self.parse(values, enclosing_namespace))
            .map(|values| Schema::Map(Box::new(values)))
    }

    /// Parse a `serde_json::Value` representing an Avro union type into a
    /// `Schema`.
    fn parse_union(
        &mut self,
        items: &[Value],
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        items
            .iter()
            .map(|v| self.parse(v, enclosing_namespace))
            .collect::<Result<Vec<_>, _>>()
            .and_then(|schemas| {
                if schemas.len() == 1 {
                    warn!("Union schema with just one member! Consider dropping the union!");
                }
                Ok(Schema::Union(UnionSchema::new(schemas)?))
            })
    }

    /// Parse a `serde_json::Value` representing an Avro fixed type into a
    /// `Schema`.
    fn parse_fixed(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Schema> {
        let size_opt = complex.get("size");
        if size_opt.is_none() {
            if let Some(seen) = self.get_already_seen_schema(complex, enclosing_namespace) {
                return Ok(seen.clone());
            }
        }

        let size = match size_opt {
            Some(size) => size
                .as_u64()
                .filter(|s| *s > 0)
                .ok_or_else(|| Details::GetFixedSizeFieldPositive(size.clone())),
            None => Err(Details::GetFixedSizeField),
        }?;

        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;

        let schema = Schema::Fixed(FixedSchema {
            name: fully_qualified_name.clone(),
            doc: complex.doc(),
            size: size as usize,
        });

        self.register_resolving_schema(&fully_qualified_name)?;
        self.register_parsed_schema(&fully_qualified_name, &schema);

        Ok(schema)
    }
}

fn parse_primitive_name(name: &str) -> Option<Schema> {
    match name {
        "null" => Some(Schema::Null),
        "boolean" => Some(Schema::Boolean),
        "int" => Some(Schema::Int),
        "long" => Some(Schema::Long),
        "float" => Some(Schema::Float),
        "double" => Some(Schema::Double),
        "bytes" => Some(Schema::Bytes),
        "string" => Some(Schema::String),
        _ => None,
    }
}
