// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use core_model::{
    scalar_type::ScalarType,
    schema::SchemaGraph,
    types::{Field, FieldKind, Model},
};
use doc_query::{AbstractPredicate, RelationLink, RelationQuantifier, Val};

use crate::{
    error::ExecutionError,
    filter::{FieldOp, Filter, RelationOp},
};

use super::coerce::{coerce, coerce_element};

/// Map a filter on `model` to a store predicate, checking every condition against the schema.
pub(crate) fn to_predicate(
    schema: &SchemaGraph,
    model: &Model,
    filter: &Filter,
) -> Result<AbstractPredicate, ExecutionError> {
    match filter {
        Filter::Field { field, op } => {
            let field = lookup_field(model, field)?;
            field_predicate(schema, model, field, op)
        }
        Filter::Relation { field, op, filter } => {
            let field = lookup_field(model, field)?;
            relation_predicate(schema, model, field, *op, filter)
        }
        Filter::And(filters) => filters.iter().try_fold(AbstractPredicate::True, |acc, f| {
            Ok(AbstractPredicate::and(acc, to_predicate(schema, model, f)?))
        }),
        Filter::Or(filters) => filters.iter().try_fold(AbstractPredicate::False, |acc, f| {
            Ok(AbstractPredicate::or(acc, to_predicate(schema, model, f)?))
        }),
        Filter::Not(filter) => Ok(!to_predicate(schema, model, filter)?),
    }
}

fn lookup_field<'a>(model: &'a Model, name: &str) -> Result<&'a Field, ExecutionError> {
    model.field(name).ok_or_else(|| {
        ExecutionError::UnsupportedPredicate(format!(
            "Model `{}` has no field `{name}`",
            model.name
        ))
    })
}

fn field_predicate(
    schema: &SchemaGraph,
    model: &Model,
    field: &Field,
    op: &FieldOp,
) -> Result<AbstractPredicate, ExecutionError> {
    let unsupported = |reason: String| {
        ExecutionError::UnsupportedPredicate(format!("`{}.{}`: {reason}", model.name, field.name))
    };

    let Some(scalar_type) = field.scalar_type() else {
        return Err(unsupported(
            "relation fields are filtered with `is`, `some`, `none` or `every`".to_string(),
        ));
    };
    let storage = field.storage_name.clone();

    // Equality against null is only meaningful on a field that can hold null
    let equality_operand = |value: &Val| -> Result<Val, ExecutionError> {
        if value.is_null() {
            if field.nullable {
                Ok(Val::Null)
            } else {
                Err(unsupported(
                    "a non-nullable field cannot be compared with null".to_string(),
                ))
            }
        } else {
            coerce(schema, field, value.clone()).map_err(unsupported)
        }
    };

    let membership_operands = |values: &[Val]| -> Result<Vec<Val>, ExecutionError> {
        if field.list {
            return Err(unsupported(
                "list fields do not support `in`; use `has`".to_string(),
            ));
        }
        values.iter().map(equality_operand).collect()
    };

    let ordered_operand = |value: &Val| -> Result<Val, ExecutionError> {
        if field.list || field.enum_name().is_some() || !scalar_type.is_ordered() {
            return Err(unsupported(format!(
                "ordering comparisons are not supported on {}",
                type_description(field)
            )));
        }
        coerce_element(schema, field, value.clone()).map_err(unsupported)
    };

    let pattern = |value: &str| -> Result<String, ExecutionError> {
        if field.list
            || field.is_identifier()
            || field.enum_name().is_some()
            || scalar_type != ScalarType::String
        {
            return Err(unsupported(format!(
                "string matching is not supported on {}",
                type_description(field)
            )));
        }
        Ok(regex::escape(value))
    };

    Ok(match op {
        FieldOp::Equals(value) => AbstractPredicate::Eq(storage, equality_operand(value)?),
        FieldOp::NotEquals(value) => AbstractPredicate::Neq(storage, equality_operand(value)?),
        FieldOp::In(values) => AbstractPredicate::in_list(storage, membership_operands(values)?),
        FieldOp::NotIn(values) => {
            AbstractPredicate::not_in_list(storage, membership_operands(values)?)
        }
        FieldOp::Lt(value) => AbstractPredicate::Lt(storage, ordered_operand(value)?),
        FieldOp::Lte(value) => AbstractPredicate::Lte(storage, ordered_operand(value)?),
        FieldOp::Gt(value) => AbstractPredicate::Gt(storage, ordered_operand(value)?),
        FieldOp::Gte(value) => AbstractPredicate::Gte(storage, ordered_operand(value)?),
        FieldOp::Contains(value) => AbstractPredicate::Regex(storage, pattern(value)?),
        FieldOp::StartsWith(value) => {
            AbstractPredicate::Regex(storage, format!("^{}", pattern(value)?))
        }
        FieldOp::EndsWith(value) => {
            AbstractPredicate::Regex(storage, format!("{}$", pattern(value)?))
        }
        FieldOp::Has(value) => {
            if !field.list {
                return Err(unsupported("`has` needs a list field".to_string()));
            }
            AbstractPredicate::Has(
                storage,
                coerce_element(schema, field, value.clone()).map_err(unsupported)?,
            )
        }
    })
}

fn relation_predicate(
    schema: &SchemaGraph,
    model: &Model,
    field: &Field,
    op: RelationOp,
    filter: &Filter,
) -> Result<AbstractPredicate, ExecutionError> {
    let unsupported = |reason: &str| {
        ExecutionError::UnsupportedPredicate(format!("`{}.{}`: {reason}", model.name, field.name))
    };

    match (&field.kind, op) {
        (FieldKind::Relation(relation_id), RelationOp::Is) => {
            let relation = schema.relation(*relation_id);
            let target = related(schema, field)?;
            let fk = lookup_field(model, &relation.fk_field)?;
            let target_pk = lookup_field(target, &relation.referenced_field)?;

            let link = RelationLink {
                from: target.collection_name.clone(),
                local_field: fk.storage_name.clone(),
                foreign_field: target_pk.storage_name.clone(),
                name: field.name.clone(),
            };
            let inner = to_predicate(schema, target, filter)?;

            Ok(AbstractPredicate::relation(
                link,
                RelationQuantifier::Some,
                inner,
            ))
        }
        (
            FieldKind::BackCollection(relation_id),
            RelationOp::Some | RelationOp::None | RelationOp::Every,
        ) => {
            let relation = schema.relation(*relation_id);
            let owner = related(schema, field)?;
            let fk = lookup_field(owner, &relation.fk_field)?;
            let pk = lookup_field(model, &relation.referenced_field)?;

            let link = RelationLink {
                from: owner.collection_name.clone(),
                local_field: pk.storage_name.clone(),
                foreign_field: fk.storage_name.clone(),
                name: field.name.clone(),
            };
            let inner = to_predicate(schema, owner, filter)?;

            Ok(match op {
                RelationOp::Some => {
                    AbstractPredicate::relation(link, RelationQuantifier::Some, inner)
                }
                RelationOp::None => {
                    AbstractPredicate::relation(link, RelationQuantifier::None, inner)
                }
                // Every member matches: no member fails to match
                _ => AbstractPredicate::relation(link, RelationQuantifier::None, !inner),
            })
        }
        (FieldKind::Relation(_), _) => Err(unsupported("a to-one relation is filtered with `is`")),
        (FieldKind::BackCollection(_), _) => Err(unsupported(
            "a back-collection is filtered with `some`, `none` or `every`",
        )),
        (FieldKind::Scalar(_) | FieldKind::Enum(_), _) => Err(unsupported(
            "scalar fields cannot be filtered as relations",
        )),
    }
}

fn related<'a>(schema: &'a SchemaGraph, field: &Field) -> Result<&'a Model, ExecutionError> {
    schema.related_model(field).ok_or_else(|| {
        ExecutionError::UnsupportedPredicate(format!(
            "Relation field `{}` points to no model",
            field.name
        ))
    })
}

fn type_description(field: &Field) -> String {
    let type_name = field
        .enum_name()
        .or_else(|| field.scalar_type().map(|t| t.name()))
        .unwrap_or("relation");
    if field.list {
        format!("{type_name}[] fields")
    } else if field.is_identifier() {
        "identifier fields".to_string()
    } else {
        format!("{type_name} fields")
    }
}
