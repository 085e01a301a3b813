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

//! Schema-driven codecs for **[Apache Avro](https://avro.apache.org/)** data.
//!
//! A JSON schema document compiles into a [`Codec`]: an immutable artifact
//! exposing four symmetric byte-level operations between the dynamic
//! [`Value`](types::Value) representation and the two Avro wire forms,
//! the compact binary encoding and the JSON textual encoding.
//!
//! ```
//! use avroglot::{Codec, types::Value};
//!
//! # fn main() -> Result<(), avroglot::Error> {
//! let codec = Codec::new(r#"{"type": "array", "items": "long"}"#)?;
//! let value = Value::Array(vec![Value::Long(1), Value::Long(2)]);
//!
//! let mut binary = Vec::new();
//! codec.binary_from_native(&value, &mut binary)?;
//! assert_eq!(binary, &[4, 2, 4, 0]);
//!
//! let (decoded, tail) = codec.native_from_binary(&binary)?;
//! assert_eq!(decoded, value);
//! assert!(tail.is_empty());
//!
//! let mut textual = Vec::new();
//! codec.textual_from_native(&value, &mut textual)?;
//! assert_eq!(textual, b"[1,2]");
//! # Ok(())
//! # }
//! ```
//!
//! Avro data is usually stored in *Object Container Files*, which frame the
//! encoded values with a self-describing header and optional per-block
//! compression; see [`Writer`] and [`Reader`].
//!
//! # Features
//!
//! - `snappy` (default): enable support for the Snappy compression codec
//!
//! # Resource limits
//!
//! Decoding untrusted data is bounded by the process-wide limits in
//! [`util`]: [`util::max_allocation_bytes`], [`util::max_block_count`] and
//! [`util::max_block_size`].

mod codec;
mod compression;
mod decode;
mod encode;
mod reader;
mod textual;
mod validator;
mod writer;

pub mod error;
pub mod schema;
pub mod types;
pub mod util;

pub use codec::Codec;
pub use compression::{Compression, DeflateSettings};
pub use error::Error;
pub use reader::Reader;
pub use schema::Schema;
pub use writer::Writer;

/// A convenience type alias for `Result`s with `Error`s.
pub type AvroResult<T> = Result<T, Error>;

#[cfg(test)]
pub(crate) type TestResult = Result<(), Box<dyn std::error::Error>>;
