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

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::{
    AvroResult, Error, Schema,
    error::Details,
    util::MapHelper,
    validator::{validate_namespace, validate_schema_name},
};

/// Represents names for `record`, `enum` and `fixed` Avro schemas.
///
/// Each of these `Schema`s has a `fullname` composed of two parts:
///   * a name
///   * a namespace
///
/// More information about schema names can be found in the
/// [Avro specification](https://avro.apache.org/docs/++version++/specification/#names)
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Name {
    /// The name part of the fullname.
    pub name: String,
    /// The optional namespace. `None` is the null namespace.
    pub namespace: Namespace,
}

/// Represents the symbol table built while compiling a schema: a lookup from
/// fullname to the named schema it refers to.
pub type Names = HashMap<Name, Schema>;
/// Represents schema lookup by reference within an already-compiled schema.
pub type NamesRef<'a> = HashMap<Name, &'a Schema>;
/// Represents the namespace of a named schema.
pub type Namespace = Option<String>;

impl Name {
    /// Create a new `Name`, parsing an optional namespace out of a dotted
    /// `name` string.
    pub fn new(name: &str) -> AvroResult<Self> {
        let (name, namespace) = validate_schema_name(name)?;
        Ok(Self { name, namespace })
    }

    /// Parse a `serde_json::Value` into a `Name`, applying Avro's precedence
    /// rules: a dotted `name` wins over the `namespace` attribute, which wins
    /// over the enclosing namespace.
    pub(crate) fn parse(
        complex: &Map<String, Value>,
        enclosing_namespace: &Namespace,
    ) -> AvroResult<Self> {
        let (name, namespace_from_name) = complex
            .name()
            .ok_or(Details::GetNameField)
            .and_then(|name| validate_schema_name(&name).map_err(Error::into_details))?;

        let namespace = namespace_from_name
            .or_else(|| complex.string("namespace"))
            .or_else(|| enclosing_namespace.clone());
        if let Some(ref ns) = namespace {
            validate_namespace(ns)?;
        }

        Ok(Self {
            name,
            namespace: namespace.filter(|ns| !ns.is_empty()),
        })
    }

    /// Return the `fullname` of this `Name`.
    ///
    /// More information about fullnames can be found in the
    /// [Avro specification](https://avro.apache.org/docs/++version++/specification/#names)
    pub fn fullname(&self, default_namespace: &Namespace) -> String {
        if self.name.contains('.') {
            self.name.clone()
        } else {
            let namespace = self.namespace.as_ref().or(default_namespace.as_ref());
            match namespace {
                Some(ref namespace) if !namespace.is_empty() => {
                    format!("{namespace}.{}", self.name)
                }
                _ => self.name.clone(),
            }
        }
    }

    /// Construct the fully qualified name, inheriting the enclosing namespace
    /// when this name does not carry one of its own.
    pub fn fully_qualified_name(&self, enclosing_namespace: &Namespace) -> Name {
        Name {
            name: self.name.clone(),
            namespace: self
                .namespace
                .clone()
                .or_else(|| enclosing_namespace.clone())
                .filter(|ns| !ns.is_empty()),
        }
    }
}

impl TryFrom<&str> for Name {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.fullname(&None))
    }
}
