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

//! Lexical validation of names, namespaces, enum symbols and record field
//! names, following the rules of the
//! [Avro specification](https://avro.apache.org/docs/++version++/specification/#names).

use crate::AvroResult;
use crate::error::Details;
use crate::schema::Namespace;
use regex_lite::Regex;
use std::sync::OnceLock;

// An optional namespace (with optional dots) followed by a name without any
// dots in it.
const SCHEMA_NAME_PATTERN: &str = r"^((?P<namespace>([A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)?)\.)?(?P<name>[A-Za-z_][A-Za-z0-9_]*)$";
const NAMESPACE_PATTERN: &str = r"^([A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)?$";
const COMPONENT_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

fn schema_name_regex() -> &'static Regex {
    static SCHEMA_NAME_ONCE: OnceLock<Regex> = OnceLock::new();
    SCHEMA_NAME_ONCE.get_or_init(|| Regex::new(SCHEMA_NAME_PATTERN).unwrap())
}

fn namespace_regex() -> &'static Regex {
    static NAMESPACE_ONCE: OnceLock<Regex> = OnceLock::new();
    NAMESPACE_ONCE.get_or_init(|| Regex::new(NAMESPACE_PATTERN).unwrap())
}

fn component_regex() -> &'static Regex {
    static COMPONENT_ONCE: OnceLock<Regex> = OnceLock::new();
    COMPONENT_ONCE.get_or_init(|| Regex::new(COMPONENT_PATTERN).unwrap())
}

/// Validate a schema name, which may be either a short name or a dotted
/// fullname. Returns the short name and the namespace embedded in the input
/// (`None` when the input was not dotted).
pub(crate) fn validate_schema_name(schema_name: &str) -> AvroResult<(String, Namespace)> {
    let caps = schema_name_regex()
        .captures(schema_name)
        .ok_or_else(|| Details::InvalidSchemaName(schema_name.to_string(), SCHEMA_NAME_PATTERN))?;
    let name = caps
        .name("name")
        .expect("Regex has a group named `name`")
        .as_str()
        .to_string();
    let namespace = caps
        .name("namespace")
        .map(|ns| ns.as_str())
        .filter(|ns| !ns.is_empty())
        .map(|ns| ns.to_string());
    Ok((name, namespace))
}

pub(crate) fn validate_namespace(namespace: &str) -> AvroResult<()> {
    if namespace_regex().is_match(namespace) {
        Ok(())
    } else {
        Err(Details::InvalidNamespace(namespace.to_string(), NAMESPACE_PATTERN).into())
    }
}

pub(crate) fn validate_enum_symbol_name(symbol: &str) -> AvroResult<()> {
    if component_regex().is_match(symbol) {
        Ok(())
    } else {
        Err(Details::InvalidEnumSymbolName(symbol.to_string(), COMPONENT_PATTERN).into())
    }
}

pub(crate) fn validate_record_field_name(field_name: &str) -> AvroResult<()> {
    if component_regex().is_match(field_name) {
        Ok(())
    } else {
        Err(Details::InvalidRecordFieldName(field_name.to_string(), COMPONENT_PATTERN).into())
    }
}
