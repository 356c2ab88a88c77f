// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value, json};

/// A value as seen by the store.
///
/// Unlike plain JSON, a `Val` keeps the distinctions the store cares about: an identifier token
/// is not a string, and a big integer or a date-time travels in an extended form.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Null,
    Bool(bool),
    Int(i64),
    BigInt(i64),
    Float(f64),
    String(String),
    /// Opaque store-native identifier token
    Id(String),
    DateTime(DateTime<Utc>),
    Json(Value),
    List(Vec<Val>),
    Object(IndexMap<String, Val>),
}

impl Val {
    pub fn is_null(&self) -> bool {
        matches!(self, Val::Null)
    }

    /// Short description of the value's kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Val::Null => "null",
            Val::Bool(_) => "boolean",
            Val::Int(_) => "integer",
            Val::BigInt(_) => "big integer",
            Val::Float(_) => "float",
            Val::String(_) => "string",
            Val::Id(_) => "identifier",
            Val::DateTime(_) => "date-time",
            Val::Json(_) => "json",
            Val::List(_) => "list",
            Val::Object(_) => "object",
        }
    }

    /// The extended-JSON form sent over the wire
    pub fn to_wire(&self) -> Value {
        match self {
            Val::Null => Value::Null,
            Val::Bool(value) => Value::Bool(*value),
            Val::Int(value) => json!(value),
            Val::BigInt(value) => json!({ "$numberLong": value.to_string() }),
            Val::Float(value) => json!(value),
            Val::String(value) => Value::String(value.clone()),
            Val::Id(token) => json!({ "$oid": token }),
            Val::DateTime(value) => {
                json!({ "$date": value.to_rfc3339_opts(SecondsFormat::Millis, true) })
            }
            Val::Json(value) => value.clone(),
            Val::List(values) => Value::Array(values.iter().map(Val::to_wire).collect()),
            Val::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_wire()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    /// The plain-JSON form handed to application code: identifiers and big integers lose their
    /// wrappers and date-times become RFC 3339 strings.
    pub fn to_plain_json(&self) -> Value {
        match self {
            Val::Null => Value::Null,
            Val::Bool(value) => Value::Bool(*value),
            Val::Int(value) | Val::BigInt(value) => json!(value),
            Val::Float(value) => json!(value),
            Val::String(value) | Val::Id(value) => Value::String(value.clone()),
            Val::DateTime(value) => {
                Value::String(value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Val::Json(value) => value.clone(),
            Val::List(values) => Value::Array(values.iter().map(Val::to_plain_json).collect()),
            Val::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_plain_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    /// A key usable for grouping values that compare equal on the wire
    pub fn grouping_key(&self) -> String {
        self.to_wire().to_string()
    }
}

impl From<bool> for Val {
    fn from(value: bool) -> Self {
        Val::Bool(value)
    }
}

impl From<i64> for Val {
    fn from(value: i64) -> Self {
        Val::Int(value)
    }
}

impl From<i32> for Val {
    fn from(value: i32) -> Self {
        Val::Int(value.into())
    }
}

impl From<f64> for Val {
    fn from(value: f64) -> Self {
        Val::Float(value)
    }
}

impl From<&str> for Val {
    fn from(value: &str) -> Self {
        Val::String(value.to_string())
    }
}

impl From<String> for Val {
    fn from(value: String) -> Self {
        Val::String(value)
    }
}

impl From<DateTime<Utc>> for Val {
    fn from(value: DateTime<Utc>) -> Self {
        Val::DateTime(value)
    }
}

impl From<Value> for Val {
    fn from(value: Value) -> Self {
        Val::Json(value)
    }
}

impl<T: Into<Val>> From<Option<T>> for Val {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Val::Null)
    }
}

impl<T: Into<Val>> From<Vec<T>> for Val {
    fn from(values: Vec<T>) -> Self {
        Val::List(values.into_iter().map(Into::into).collect())
    }
}
