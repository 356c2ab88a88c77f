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
    types::{EnumType, Field},
};
use doc_query::Val;

/// Bring a caller-supplied value into the form the field stores: strings become identifier
/// tokens for identifier fields, integers widen to floats or big integers, RFC 3339 strings parse
/// as date-times. `Null` passes through; whether it is acceptable is up to the caller.
pub(crate) fn coerce(schema: &SchemaGraph, field: &Field, value: Val) -> Result<Val, String> {
    let Some(scalar_type) = field.scalar_type() else {
        return Err(format!("`{}` is not a scalar field", field.name));
    };
    let enum_type = field_enum(schema, field)?;

    match value {
        Val::Null => Ok(Val::Null),
        Val::List(values) if field.list => values
            .into_iter()
            .map(|value| match value {
                Val::Null => Err(format!("`{}` cannot hold null elements", field.name)),
                value => coerce_scalar(field, enum_type, scalar_type, value),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Val::List),
        value if field.list => Err(mismatch(field, "a list", &value)),
        value => coerce_scalar(field, enum_type, scalar_type, value),
    }
}

/// Coerce a single element (of a list field, or of a scalar field)
pub(crate) fn coerce_element(
    schema: &SchemaGraph,
    field: &Field,
    value: Val,
) -> Result<Val, String> {
    match (field.scalar_type(), value) {
        (_, Val::Null) => Err(format!("`{}` cannot be compared with null here", field.name)),
        (Some(scalar_type), value) => {
            coerce_scalar(field, field_enum(schema, field)?, scalar_type, value)
        }
        (None, _) => Err(format!("`{}` is not a scalar field", field.name)),
    }
}

fn field_enum<'a>(schema: &'a SchemaGraph, field: &Field) -> Result<Option<&'a EnumType>, String> {
    match field.enum_name() {
        Some(name) => schema
            .enum_type(name)
            .map(Some)
            .ok_or_else(|| format!("`{}` refers to the unknown enum `{name}`", field.name)),
        None => Ok(None),
    }
}

fn coerce_scalar(
    field: &Field,
    enum_type: Option<&EnumType>,
    scalar_type: ScalarType,
    value: Val,
) -> Result<Val, String> {
    if let Some(enum_type) = enum_type {
        return match value {
            Val::String(value) if enum_type.has_value(&value) => Ok(Val::String(value)),
            Val::String(value) => Err(format!(
                "`{value}` is not a value of enum `{}` for `{}`",
                enum_type.name, field.name
            )),
            value => Err(mismatch(field, &enum_type.name, &value)),
        };
    }

    match (scalar_type, value) {
        (ScalarType::String, Val::String(value) | Val::Id(value)) => {
            if field.is_identifier() {
                Ok(Val::Id(value))
            } else {
                Ok(Val::String(value))
            }
        }
        (ScalarType::Int, Val::Int(value) | Val::BigInt(value)) => i32::try_from(value)
            .map(|_| Val::Int(value))
            .map_err(|_| format!("`{}` expects a 32-bit Int, got {value}", field.name)),
        (ScalarType::BigInt, Val::Int(value) | Val::BigInt(value)) => Ok(Val::BigInt(value)),
        (ScalarType::Float, Val::Float(value)) if value.is_finite() => Ok(Val::Float(value)),
        (ScalarType::Float, Val::Float(value)) => Err(format!(
            "`{}` expects a finite Float, got {value}",
            field.name
        )),
        (ScalarType::Float, Val::Int(value)) => Ok(Val::Float(value as f64)),
        (ScalarType::Boolean, Val::Bool(value)) => Ok(Val::Bool(value)),
        (ScalarType::DateTime, Val::DateTime(value)) => Ok(Val::DateTime(value)),
        (ScalarType::DateTime, Val::String(value)) => DateTime::parse_from_rfc3339(&value)
            .map(|value| Val::DateTime(value.with_timezone(&Utc)))
            .map_err(|err| {
                format!(
                    "`{}` expects an RFC 3339 date-time, got `{value}` ({err})",
                    field.name
                )
            }),
        (ScalarType::Json, Val::Json(value)) => Ok(Val::Json(value)),
        (ScalarType::Json, value) => Ok(Val::Json(value.to_plain_json())),
        (scalar_type, value) => Err(mismatch(field, scalar_type.name(), &value)),
    }
}

fn mismatch(field: &Field, expected: &str, value: &Val) -> String {
    format!(
        "`{}` expects {expected}, got {}",
        field.name,
        value.kind()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::types::{DefaultPolicy, EnumValue, FieldKind};
    use multiplatform_test::multiplatform_test;

    fn field(scalar_type: ScalarType, list: bool, native_type: Option<&str>) -> Field {
        Field {
            name: "f".to_string(),
            storage_name: "f".to_string(),
            kind: FieldKind::Scalar(scalar_type),
            nullable: false,
            list,
            default: DefaultPolicy::None,
            unique: false,
            native_type: native_type.map(str::to_string),
            doc: None,
        }
    }

    fn schema() -> SchemaGraph {
        let mut schema = SchemaGraph::default();
        schema.enums.add(
            "Color",
            EnumType {
                name: "Color".to_string(),
                values: ["RED", "GREEN"]
                    .into_iter()
                    .map(|name| EnumValue {
                        name: name.to_string(),
                        doc: None,
                    })
                    .collect(),
                doc: None,
            },
        );
        schema
    }

    fn coerce(field: &Field, value: Val) -> Result<Val, String> {
        super::coerce(&schema(), field, value)
    }

    fn coerce_element(field: &Field, value: Val) -> Result<Val, String> {
        super::coerce_element(&schema(), field, value)
    }

    #[multiplatform_test]
    fn identifier_strings_become_tokens() {
        let id_field = field(ScalarType::String, false, Some("ObjectId"));
        let plain_field = field(ScalarType::String, false, None);

        assert_eq!(
            coerce(&id_field, Val::from("42")),
            Ok(Val::Id("42".to_string()))
        );
        assert_eq!(
            coerce(&plain_field, Val::from("42")),
            Ok(Val::String("42".to_string()))
        );
    }

    #[multiplatform_test]
    fn numeric_widening() {
        assert_eq!(
            coerce(&field(ScalarType::Float, false, None), Val::Int(2)),
            Ok(Val::Float(2.0))
        );
        assert_eq!(
            coerce(&field(ScalarType::BigInt, false, None), Val::Int(2)),
            Ok(Val::BigInt(2))
        );
        assert_eq!(
            coerce(&field(ScalarType::Int, false, None), Val::Float(2.5)),
            Err("`f` expects Int, got float".to_string())
        );
    }

    #[multiplatform_test]
    fn non_finite_floats_are_rejected() {
        let ratio = field(ScalarType::Float, false, None);
        assert_eq!(
            coerce(&ratio, Val::Float(f64::NAN)),
            Err("`f` expects a finite Float, got NaN".to_string())
        );
        assert_eq!(
            coerce(&ratio, Val::Float(f64::INFINITY)),
            Err("`f` expects a finite Float, got inf".to_string())
        );
        assert_eq!(
            coerce_element(&ratio, Val::Float(f64::NEG_INFINITY)),
            Err("`f` expects a finite Float, got -inf".to_string())
        );
        assert_eq!(coerce(&ratio, Val::Float(-0.5)), Ok(Val::Float(-0.5)));
    }

    #[multiplatform_test]
    fn ints_are_32_bit() {
        let count = field(ScalarType::Int, false, None);
        assert_eq!(
            coerce(&count, Val::Int(i32::MAX as i64)),
            Ok(Val::Int(i32::MAX as i64))
        );
        assert_eq!(
            coerce(&count, Val::Int(i32::MAX as i64 + 1)),
            Err("`f` expects a 32-bit Int, got 2147483648".to_string())
        );
        assert_eq!(
            coerce(&count, Val::BigInt(i32::MIN as i64 - 1)),
            Err("`f` expects a 32-bit Int, got -2147483649".to_string())
        );

        let big = field(ScalarType::BigInt, false, None);
        assert_eq!(coerce(&big, Val::Int(1 << 40)), Ok(Val::BigInt(1 << 40)));
    }

    #[multiplatform_test]
    fn enum_values() {
        let color = Field {
            kind: FieldKind::Enum("Color".to_string()),
            ..field(ScalarType::String, true, None)
        };

        assert_eq!(
            coerce(&color, Val::from(vec!["RED", "GREEN"])),
            Ok(Val::from(vec!["RED", "GREEN"]))
        );
        assert_eq!(
            coerce_element(&color, Val::from("BLUE")),
            Err("`BLUE` is not a value of enum `Color` for `f`".to_string())
        );
        assert_eq!(
            coerce_element(&color, Val::Int(1)),
            Err("`f` expects Color, got integer".to_string())
        );

        let unknown = Field {
            kind: FieldKind::Enum("Shade".to_string()),
            ..field(ScalarType::String, false, None)
        };
        assert_eq!(
            coerce(&unknown, Val::from("DARK")),
            Err("`f` refers to the unknown enum `Shade`".to_string())
        );
    }

    #[multiplatform_test]
    fn lists() {
        let tags = field(ScalarType::String, true, None);
        assert_eq!(
            coerce(&tags, Val::from(vec!["a", "b"])),
            Ok(Val::List(vec![Val::from("a"), Val::from("b")]))
        );
        assert_eq!(
            coerce(&tags, Val::from("a")),
            Err("`f` expects a list, got string".to_string())
        );
        assert_eq!(coerce_element(&tags, Val::from("a")), Ok(Val::from("a")));
    }

    #[multiplatform_test]
    fn date_times_parse() {
        let date = field(ScalarType::DateTime, false, None);
        assert!(matches!(
            coerce(&date, Val::from("2024-03-01T12:30:00+01:00")),
            Ok(Val::DateTime(_))
        ));
        assert!(coerce(&date, Val::from("yesterday")).is_err());
    }
}
