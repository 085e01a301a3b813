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

//! Logic handling the intermediate representation of Avro values.

use std::collections::HashMap;
use strum_macros::EnumDiscriminants;

/// Represents any valid Avro value.
///
/// More information about Avro values can be found in the
/// [Avro specification](https://avro.apache.org/docs/++version++/specification/#schema-declaration)
#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(ValueKind), derive(Hash))]
pub enum Value {
    /// A `null` Avro value.
    Null,
    /// A `boolean` Avro value.
    Boolean(bool),
    /// An `int` Avro value.
    Int(i32),
    /// A `long` Avro value.
    Long(i64),
    /// A `float` Avro value.
    Float(f32),
    /// A `double` Avro value.
    Double(f64),
    /// A `bytes` Avro value.
    Bytes(Vec<u8>),
    /// A `string` Avro value.
    String(String),
    /// A `fixed` Avro value, carrying the declared size and exactly that many
    /// bytes.
    Fixed(usize, Vec<u8>),
    /// An `enum` Avro value: the zero-based position of the symbol within the
    /// schema's symbol list, plus the symbol itself.
    Enum(u32, String),
    /// A `union` Avro value: the zero-based position of the selected member
    /// within the union, plus the member value.
    ///
    /// The member position for a fullname can be obtained from
    /// [`UnionSchema::variant_by_fullname`](crate::schema::UnionSchema::variant_by_fullname);
    /// encoders never guess a member from the value's shape.
    Union(u32, Box<Value>),
    /// An `array` Avro value.
    Array(Vec<Value>),
    /// A `map` Avro value.
    Map(HashMap<String, Value>),
    /// A `record` Avro value, as a vector of (field name, field value) in
    /// schema declaration order.
    Record(Vec<(String, Value)>),
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(value: HashMap<String, Value>) -> Self {
        Self::Map(value)
    }
}

// Lossless numeric coercions for the convenience widening on encode: the
// accepted native input set is broader than what decode produces, provided
// the conversion preserves the value exactly.
impl Value {
    pub(crate) fn as_int_lossless(&self) -> Option<i32> {
        match *self {
            Value::Int(i) => Some(i),
            Value::Long(l) => i32::try_from(l).ok(),
            Value::Float(f) => {
                let i = f as i64;
                if i as f32 == f { i32::try_from(i).ok() } else { None }
            }
            Value::Double(d) => {
                let i = d as i64;
                if i as f64 == d { i32::try_from(i).ok() } else { None }
            }
            _ => None,
        }
    }

    pub(crate) fn as_long_lossless(&self) -> Option<i64> {
        match *self {
            Value::Int(i) => Some(i as i64),
            Value::Long(l) => Some(l),
            Value::Float(f) => {
                let i = f as i64;
                if i as f32 == f { Some(i) } else { None }
            }
            Value::Double(d) => {
                let i = d as i64;
                if i as f64 == d { Some(i) } else { None }
            }
            _ => None,
        }
    }

    pub(crate) fn as_float_lossless(&self) -> Option<f32> {
        match *self {
            Value::Int(i) => {
                let f = i as f32;
                if f as i64 == i as i64 { Some(f) } else { None }
            }
            Value::Long(l) => {
                let f = l as f32;
                if f.is_finite() && f as i64 == l { Some(f) } else { None }
            }
            Value::Float(f) => Some(f),
            Value::Double(d) => {
                let f = d as f32;
                // special values survive the round trip by definition
                if d.is_nan() || f as f64 == d { Some(f) } else { None }
            }
            _ => None,
        }
    }

    pub(crate) fn as_double_lossless(&self) -> Option<f64> {
        match *self {
            Value::Int(i) => Some(i as f64),
            Value::Long(l) => {
                let d = l as f64;
                if d as i64 == l { Some(d) } else { None }
            }
            Value::Float(f) => Some(f as f64),
            Value::Double(d) => Some(d),
            _ => None,
        }
    }
}
