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

use crate::AvroResult;
use crate::error::Details;
use crate::schema::Schema;
use std::collections::HashMap;

/// A description of a Union schema.
#[derive(Debug, Clone)]
pub struct UnionSchema {
    /// The schemas that make up this union
    pub(crate) schemas: Vec<Schema>,
    // Constant-time lookup from a member's discriminating name to its
    // position, used by the textual form and to reject duplicate members.
    variant_lookup: HashMap<String, usize>,
}

impl UnionSchema {
    /// Creates a new UnionSchema from a vector of schemas.
    ///
    /// # Errors
    /// Will return an error if `schemas` is empty, contains a union, or
    /// contains two members with the same discriminating name (which also
    /// covers two members with the same primitive wire form).
    pub fn new(schemas: Vec<Schema>) -> AvroResult<Self> {
        if schemas.is_empty() {
            return Err(Details::EmptyUnion.into());
        }

        let mut variant_lookup = HashMap::with_capacity(schemas.len());
        for (i, schema) in schemas.iter().enumerate() {
            if let Schema::Union(_) = schema {
                return Err(Details::GetNestedUnion.into());
            }
            let key = schema.union_member_name();
            if variant_lookup.insert(key.clone(), i).is_some() {
                return Err(Details::GetUnionDuplicate(key).into());
            }
        }
        Ok(UnionSchema {
            schemas,
            variant_lookup,
        })
    }

    /// Returns a slice to all variants of this schema.
    pub fn variants(&self) -> &[Schema] {
        &self.schemas
    }

    /// Returns true if any of the variants of this `UnionSchema` is `Null`.
    pub fn is_nullable(&self) -> bool {
        self.schemas.iter().any(|x| matches!(x, Schema::Null))
    }

    /// Returns the position of the `null` member, if the union has one.
    pub(crate) fn null_index(&self) -> Option<usize> {
        self.variant_lookup.get("null").copied()
    }

    /// Look up a member by the name that discriminates it: the fullname for
    /// named members, the type name (`"int"`, `"array"`, ...) otherwise.
    ///
    /// This is the supported way to build a [`Value::Union`] for encoding:
    /// find the index for the intended member instead of guessing from the
    /// value's shape.
    ///
    /// [`Value::Union`]: crate::types::Value::Union
    pub fn variant_by_fullname(&self, fullname: &str) -> Option<(usize, &Schema)> {
        self.variant_lookup
            .get(fullname)
            .map(|&i| (i, &self.schemas[i]))
    }
}

// No need to compare variant_lookup, it is derivative of schemas.
impl PartialEq for UnionSchema {
    fn eq(&self, other: &UnionSchema) -> bool {
        self.schemas.eq(&other.schemas)
    }
}
