// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, Utc};
use core_model::{
    scalar_type::ScalarType,
    schema::SchemaGraph,
    types::{EnumType, Field, Model},
};
use doc_query::Val;
use serde_json::Value;

use crate::{error::ExecutionError, value::Record};

/// Decode a store document into a record of `model`'s persisted fields.
///
/// A missing or null value for a non-nullable field, or a value of the wrong type, is an error.
/// So is a number outside the field's range and a string that is not a value of the field's enum.
/// Fields the model does not declare are ignored.
pub(crate) fn decode_document(
    schema: &SchemaGraph,
    model: &Model,
    document: &Value,
) -> Result<Record, ExecutionError> {
    let decode_error = |message: String| ExecutionError::Decode {
        model: model.name.clone(),
        message,
    };

    let Value::Object(fields) = document else {
        return Err(decode_error(format!(
            "expected a document, got `{document}`"
        )));
    };

    model
        .persisted_fields()
        .map(|field| {
            let value = match fields.get(&field.storage_name) {
                None | Some(Value::Null) if field.nullable => Ok(Val::Null),
                None => Err(format!("field `{}` is missing", field.name)),
                Some(Value::Null) => Err(format!("field `{}` is null", field.name)),
                Some(value) => decode_field(schema, field, value),
            };

            value
                .map(|value| (field.name.clone(), value))
                .map_err(decode_error)
        })
        .collect()
}

fn decode_field(schema: &SchemaGraph, field: &Field, value: &Value) -> Result<Val, String> {
    let Some(scalar_type) = field.scalar_type() else {
        return Err(format!("field `{}` is not persisted", field.name));
    };
    let enum_type = match field.enum_name() {
        Some(name) => Some(
            schema
                .enum_type(name)
                .ok_or_else(|| format!("field `{}` refers to the unknown enum `{name}`", field.name))?,
        ),
        None => None,
    };

    if field.list {
        let Value::Array(elements) = value else {
            return Err(type_error(field, "a list", value));
        };
        return elements
            .iter()
            .map(|element| decode_element(field, enum_type, scalar_type, element))
            .collect::<Result<Vec<_>, _>>()
            .map(Val::List);
    }

    decode_element(field, enum_type, scalar_type, value)
}

fn decode_element(
    field: &Field,
    enum_type: Option<&EnumType>,
    scalar_type: ScalarType,
    value: &Value,
) -> Result<Val, String> {
    let Some(enum_type) = enum_type else {
        return decode_scalar(field, scalar_type, value);
    };

    match value.as_str() {
        Some(name) if enum_type.has_value(name) => Ok(Val::String(name.to_string())),
        Some(name) => Err(format!(
            "field `{}` holds `{name}`, which is not a value of enum `{}`",
            field.name, enum_type.name
        )),
        None => Err(type_error(field, &enum_type.name, value)),
    }
}

fn decode_scalar(field: &Field, scalar_type: ScalarType, value: &Value) -> Result<Val, String> {
    let decoded = match scalar_type {
        ScalarType::String if field.is_identifier() => match value {
            Value::String(token) => Some(Val::Id(token.clone())),
            Value::Object(wrapper) => match wrapper.get("$oid") {
                Some(Value::String(token)) => Some(Val::Id(token.clone())),
                _ => None,
            },
            _ => None,
        },
        ScalarType::String => value.as_str().map(|value| Val::String(value.to_string())),
        ScalarType::Int => match integer(value, "$numberInt") {
            Some(number) if i32::try_from(number).is_err() => {
                return Err(type_error(field, "a 32-bit Int", value));
            }
            number => number.map(Val::Int),
        },
        ScalarType::BigInt => integer(value, "$numberLong").map(Val::BigInt),
        ScalarType::Float => match value {
            Value::Number(number) => number.as_f64().map(Val::Float),
            Value::Object(wrapper) => wrapper
                .get("$numberDouble")
                .and_then(Value::as_str)
                .and_then(|digits| digits.parse().ok())
                .map(Val::Float),
            _ => None,
        }
        .filter(|value| matches!(value, Val::Float(number) if number.is_finite())),
        ScalarType::Boolean => value.as_bool().map(Val::Bool),
        ScalarType::DateTime => date_time(value).map(Val::DateTime),
        ScalarType::Json => Some(Val::Json(value.clone())),
    };

    decoded.ok_or_else(|| type_error(field, scalar_type.name(), value))
}

/// A plain integer, or one wrapped as `{"<wrapper>": "<digits>"}`
fn integer(value: &Value, wrapper: &str) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::Object(fields) => fields
            .get(wrapper)
            .and_then(Value::as_str)
            .and_then(|digits| digits.parse().ok()),
        _ => None,
    }
}

/// `{"$date": "<rfc3339>"}`, `{"$date": {"$numberLong": "<millis>"}}`, `{"$date": <millis>}` or a
/// bare RFC 3339 string
fn date_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|value| value.with_timezone(&Utc)),
        Value::Object(fields) => match fields.get("$date")? {
            Value::String(text) => date_time(&Value::String(text.clone())),
            millis => integer(millis, "$numberLong").and_then(DateTime::from_timestamp_millis),
        },
        _ => None,
    }
}

fn type_error(field: &Field, expected: &str, value: &Value) -> String {
    format!("field `{}` expects {expected}, got `{value}`", field.name)
}
