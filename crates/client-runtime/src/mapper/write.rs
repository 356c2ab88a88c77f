// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::Utc;
use core_model::{
    scalar_type::ScalarType,
    schema::SchemaGraph,
    types::{DefaultLiteral, DefaultPolicy, Field, FieldKind, Model},
};
use doc_query::Val;
use indexmap::IndexMap;

use crate::{
    error::ExecutionError,
    id::IdGenerator,
    value::{Patch, Record, RecordPatch},
};

use super::coerce::coerce;

/// A document ready to insert, along with the record it represents
pub(crate) struct StagedDocument {
    /// Keyed by storage name
    pub document: IndexMap<String, Val>,
    /// Keyed by field name
    pub record: Record,
}

/// Stage every persisted field of `model` for insertion. Fields left out of `data` take their
/// default; nullable fields without a default are stored as null and list fields as empty lists.
pub(crate) fn stage_create(
    schema: &SchemaGraph,
    model: &Model,
    mut data: Record,
    id_generator: &dyn IdGenerator,
) -> Result<StagedDocument, ExecutionError> {
    for name in data.keys() {
        writable_field(model, name)?;
    }

    let mut document = IndexMap::new();
    let mut record = Record::new();

    for field in model.persisted_fields() {
        let value = match data.shift_remove(&field.name) {
            Some(Val::Null) if !field.nullable => {
                return Err(validation(model, field, "cannot be null"));
            }
            Some(value) => coerce(schema, field, value).map_err(ExecutionError::Validation)?,
            None => default_value(schema, model, field, id_generator)?,
        };

        document.insert(field.storage_name.clone(), value.clone());
        record.insert(field.name.clone(), value);
    }

    Ok(StagedDocument { document, record })
}

fn default_value(
    schema: &SchemaGraph,
    model: &Model,
    field: &Field,
    id_generator: &dyn IdGenerator,
) -> Result<Val, ExecutionError> {
    Ok(match &field.default {
        DefaultPolicy::GeneratedId if field.is_identifier() => Val::Id(id_generator.object_id()),
        DefaultPolicy::GeneratedId => Val::String(id_generator.object_id()),
        DefaultPolicy::Uuid => Val::String(id_generator.uuid()),
        DefaultPolicy::Now => Val::DateTime(Utc::now()),
        DefaultPolicy::Literal(literal) => {
            let value = match (literal, field.scalar_type()) {
                (DefaultLiteral::Int(value), Some(ScalarType::BigInt)) => Val::BigInt(*value),
                (DefaultLiteral::Int(value), Some(ScalarType::Float)) => Val::Float(*value as f64),
                (DefaultLiteral::Int(value), _) => Val::Int(*value),
                (DefaultLiteral::Float(value), _) => Val::Float(*value),
                (DefaultLiteral::String(value), _) => Val::String(value.clone()),
                (DefaultLiteral::Boolean(value), _) => Val::Bool(*value),
            };
            coerce(schema, field, value).map_err(ExecutionError::Validation)?
        }
        DefaultPolicy::None if field.list => Val::List(vec![]),
        DefaultPolicy::None if field.nullable => Val::Null,
        DefaultPolicy::None => return Err(validation(model, field, "is required")),
    })
}

/// Fields to assign (`$set`, keyed by storage name) and to remove (`$unset`)
pub(crate) struct StagedUpdate {
    pub set: IndexMap<String, Val>,
    pub unset: Vec<String>,
}

pub(crate) fn stage_update(
    schema: &SchemaGraph,
    model: &Model,
    patch: RecordPatch,
) -> Result<StagedUpdate, ExecutionError> {
    let mut set = IndexMap::new();
    let mut unset = vec![];

    for (name, change) in patch {
        let field = writable_field(model, &name)?;

        if change.is_keep() {
            continue;
        }
        if field.name == model.pk_field {
            return Err(validation(model, field, "is the primary key and cannot be updated"));
        }

        match change {
            Patch::Keep => {}
            Patch::Set(Val::Null) | Patch::Unset if !field.nullable => {
                return Err(validation(model, field, "cannot be null"));
            }
            Patch::Set(value) => {
                let value = coerce(schema, field, value).map_err(ExecutionError::Validation)?;
                set.insert(field.storage_name.clone(), value);
            }
            Patch::Unset => unset.push(field.storage_name.clone()),
        }
    }

    Ok(StagedUpdate { set, unset })
}

fn writable_field<'a>(model: &'a Model, name: &str) -> Result<&'a Field, ExecutionError> {
    let field = model.field(name).ok_or_else(|| {
        ExecutionError::Validation(format!("Model `{}` has no field `{name}`", model.name))
    })?;

    match field.kind {
        FieldKind::Scalar(_) | FieldKind::Enum(_) => Ok(field),
        FieldKind::Relation(_) => Err(validation(
            model,
            field,
            "is a relation; write its foreign key instead",
        )),
        FieldKind::BackCollection(_) => Err(validation(
            model,
            field,
            "is a back-collection and cannot be written",
        )),
    }
}

fn validation(model: &Model, field: &Field, problem: &str) -> ExecutionError {
    ExecutionError::Validation(format!("`{}.{}` {problem}", model.name, field.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{id::SequentialIdGenerator, test_util::sample_schema};
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn create_fills_defaults_and_nulls() {
        let schema = sample_schema();
        let (_, c) = schema.model("C").unwrap();

        let staged = stage_create(
            &schema,
            c,
            Record::from([("bId".to_string(), Val::from("42"))]),
            &SequentialIdGenerator::default(),
        )
        .unwrap();

        assert_eq!(
            staged.document,
            IndexMap::from([
                ("_id".to_string(), Val::Id("000000000000000000000001".to_string())),
                ("b_id".to_string(), Val::Null),
                ("bId".to_string(), Val::from("42")),
            ])
        );
        assert_eq!(
            staged.record.keys().collect::<Vec<_>>(),
            vec!["id", "b_id", "bId"]
        );
    }

    #[multiplatform_test]
    fn create_rejects_bad_data() {
        let schema = sample_schema();
        let (_, b) = schema.model("B").unwrap();
        let generator = SequentialIdGenerator::default();

        let missing = stage_create(&schema, b, Record::new(), &generator);
        assert_eq!(
            missing.err().map(|e| e.to_string()),
            Some("Invalid input: `B.a_id` is required".to_string())
        );

        let relation = stage_create(
            &schema,
            b,
            Record::from([("a".to_string(), Val::from("x"))]),
            &generator,
        );
        assert_eq!(
            relation.err().map(|e| e.to_string()),
            Some("Invalid input: `B.a` is a relation; write its foreign key instead".to_string())
        );

        let unknown = stage_create(
            &schema,
            b,
            Record::from([("nope".to_string(), Val::from("x"))]),
            &generator,
        );
        assert_eq!(
            unknown.err().map(|e| e.to_string()),
            Some("Invalid input: Model `B` has no field `nope`".to_string())
        );
    }

    #[multiplatform_test]
    fn enum_fields_take_declared_values() {
        let schema = builder::build_system_from_str(
            "enum Plan {\n  FREE\n  PRO\n}\nmodel S {\n  id   String @id\n  plan Plan   @default(FREE)\n  ratio Float?\n}",
            "plans.prisma".to_string(),
        )
        .unwrap();
        let (_, s) = schema.model("S").unwrap();
        let generator = SequentialIdGenerator::default();

        let staged = stage_create(
            &schema,
            s,
            Record::from([("id".to_string(), Val::from("s1"))]),
            &generator,
        )
        .unwrap();
        assert_eq!(staged.record["plan"], Val::from("FREE"));

        let invalid = stage_create(
            &schema,
            s,
            Record::from([
                ("id".to_string(), Val::from("s2")),
                ("plan".to_string(), Val::from("GOLD")),
            ]),
            &generator,
        );
        assert_eq!(
            invalid.err().map(|e| e.to_string()),
            Some("Invalid input: `GOLD` is not a value of enum `Plan` for `plan`".to_string())
        );

        let not_finite = stage_update(
            &schema,
            s,
            RecordPatch::from([("ratio".to_string(), Patch::Set(Val::Float(f64::NAN)))]),
        );
        assert_eq!(
            not_finite.err().map(|e| e.to_string()),
            Some("Invalid input: `ratio` expects a finite Float, got NaN".to_string())
        );
    }

    #[multiplatform_test]
    fn update_sets_and_unsets() {
        let schema = sample_schema();
        let (_, c) = schema.model("C").unwrap();

        let staged = stage_update(
            &schema,
            c,
            RecordPatch::from([
                ("bId".to_string(), Patch::Set(Val::from("7"))),
                ("b_id".to_string(), Patch::Unset),
                ("id".to_string(), Patch::Keep),
            ]),
        )
        .unwrap();

        assert_eq!(
            staged.set,
            IndexMap::from([("bId".to_string(), Val::from("7"))])
        );
        assert_eq!(staged.unset, vec!["b_id".to_string()]);
    }

    #[multiplatform_test]
    fn update_rejects_required_unset_and_key_changes() {
        let schema = sample_schema();
        let (_, b) = schema.model("B").unwrap();

        let unset = stage_update(
            &schema,
            b,
            RecordPatch::from([("a_id".to_string(), Patch::Unset)]),
        );
        assert_eq!(
            unset.err().map(|e| e.to_string()),
            Some("Invalid input: `B.a_id` cannot be null".to_string())
        );

        let key = stage_update(
            &schema,
            b,
            RecordPatch::from([("id".to_string(), Patch::Set(Val::from("x")))]),
        );
        assert_eq!(
            key.err().map(|e| e.to_string()),
            Some("Invalid input: `B.id` is the primary key and cannot be updated".to_string())
        );
    }
}
