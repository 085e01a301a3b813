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

//! Builders to construct schemas programmatically instead of parsing JSON.

use crate::schema::{
    EnumSchema, FixedSchema, Name, RecordField, RecordSchema, Schema,
};
use bon::bon;
use std::collections::BTreeMap;

#[bon]
impl Schema {
    /// Returns a `Schema::Map` with the given values schema.
    #[builder(finish_fn = build)]
    pub fn map(#[builder(start_fn)] values: Schema) -> Self {
        Schema::Map(Box::new(values))
    }

    /// Returns a `Schema::Array` with the given items schema.
    #[builder(finish_fn = build)]
    pub fn array(#[builder(start_fn)] items: Schema) -> Self {
        Schema::Array(Box::new(items))
    }

    /// Returns a `Schema::Enum` with the given name, symbols and optional
    /// doc.
    #[builder(finish_fn = build)]
    pub fn r#enum(
        #[builder(start_fn)] name: Name,
        #[builder(start_fn)] symbols: Vec<impl Into<String>>,
        doc: Option<String>,
    ) -> Self {
        let symbols = symbols.into_iter().map(Into::into).collect();
        Schema::Enum(EnumSchema { name, doc, symbols })
    }

    /// Returns a `Schema::Fixed` with the given name, size and optional doc.
    #[builder(finish_fn = build)]
    pub fn fixed(
        #[builder(start_fn)] name: Name,
        #[builder(start_fn)] size: usize,
        doc: Option<String>,
    ) -> Self {
        Schema::Fixed(FixedSchema { name, doc, size })
    }

    /// Returns a `Schema::Record` with the given name, fields and optional
    /// doc. The field lookup table is derived from the field order.
    #[builder(finish_fn = build)]
    pub fn record(
        #[builder(start_fn)] name: Name,
        #[builder(default)] fields: Vec<RecordField>,
        doc: Option<String>,
    ) -> Self {
        let lookup: BTreeMap<String, usize> = fields
            .iter()
            .enumerate()
            .map(|(position, field)| (field.name.clone(), position))
            .collect();
        Schema::Record(RecordSchema {
            name,
            doc,
            fields,
            lookup,
        })
    }
}
