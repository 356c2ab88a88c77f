// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde_json::{Map, Value, json};

use crate::asql::predicate::{AbstractPredicate, RelationQuantifier};

/// A predicate rendered for the store: the join stages it needs, the aliases those joins add to
/// each document, and the filter document itself.
#[derive(Debug, Default)]
pub(crate) struct FilterDocument {
    pub lookups: Vec<Value>,
    pub aliases: Vec<String>,
    pub filter: Value,
}

pub(crate) fn to_filter(predicate: &AbstractPredicate) -> FilterDocument {
    let mut builder = FilterBuilder::default();
    let mut lookups = vec![];
    let mut aliases = vec![];
    let filter = builder.build(predicate, &mut lookups, &mut aliases);

    FilterDocument {
        lookups,
        aliases,
        filter,
    }
}

#[derive(Default)]
struct FilterBuilder {
    next_alias: usize,
}

impl FilterBuilder {
    fn build(
        &mut self,
        predicate: &AbstractPredicate,
        lookups: &mut Vec<Value>,
        aliases: &mut Vec<String>,
    ) -> Value {
        match predicate {
            AbstractPredicate::True => json!({}),
            AbstractPredicate::False => json!({ "$expr": false }),
            AbstractPredicate::Eq(field, value) => comparison(field, "$eq", value.to_wire()),
            AbstractPredicate::Neq(field, value) => comparison(field, "$ne", value.to_wire()),
            AbstractPredicate::Lt(field, value) => comparison(field, "$lt", value.to_wire()),
            AbstractPredicate::Lte(field, value) => comparison(field, "$lte", value.to_wire()),
            AbstractPredicate::Gt(field, value) => comparison(field, "$gt", value.to_wire()),
            AbstractPredicate::Gte(field, value) => comparison(field, "$gte", value.to_wire()),
            AbstractPredicate::In(field, values) => comparison(
                field,
                "$in",
                Value::Array(values.iter().map(|value| value.to_wire()).collect()),
            ),
            AbstractPredicate::NotIn(field, values) => comparison(
                field,
                "$nin",
                Value::Array(values.iter().map(|value| value.to_wire()).collect()),
            ),
            AbstractPredicate::Regex(field, pattern) => {
                comparison(field, "$regex", Value::String(pattern.clone()))
            }
            AbstractPredicate::Has(field, value) => {
                comparison(field, "$elemMatch", json!({ "$eq": value.to_wire() }))
            }
            AbstractPredicate::Relation {
                link,
                quantifier,
                predicate,
            } => {
                let alias = format!("__{}_{}", link.name, self.next_alias);
                self.next_alias += 1;

                // Joins needed by the inner predicate run inside this join's pipeline, so their
                // aliases live on the joined documents and vanish with this alias.
                let mut nested_lookups = vec![];
                let inner = self.build(predicate, &mut nested_lookups, &mut vec![]);

                let mut lookup = Map::new();
                lookup.insert("from".into(), json!(link.from));
                lookup.insert("localField".into(), json!(link.local_field));
                lookup.insert("foreignField".into(), json!(link.foreign_field));
                lookup.insert("as".into(), json!(alias));
                if !nested_lookups.is_empty() {
                    lookup.insert("pipeline".into(), Value::Array(nested_lookups));
                }
                lookups.push(json!({ "$lookup": lookup }));
                aliases.push(alias.clone());

                let matches_any = predicate.as_ref() == &AbstractPredicate::True;
                match (quantifier, matches_any) {
                    (RelationQuantifier::Some, true) => comparison(&alias, "$ne", json!([])),
                    (RelationQuantifier::None, true) => comparison(&alias, "$eq", json!([])),
                    (RelationQuantifier::Some, false) => {
                        comparison(&alias, "$elemMatch", inner)
                    }
                    (RelationQuantifier::None, false) => {
                        comparison(&alias, "$not", json!({ "$elemMatch": inner }))
                    }
                }
            }
            AbstractPredicate::And(..) => {
                let mut operands = vec![];
                flatten_and(predicate, &mut operands);
                let clauses: Vec<Value> = operands
                    .into_iter()
                    .map(|operand| self.build(operand, lookups, aliases))
                    .collect();
                json!({ "$and": clauses })
            }
            AbstractPredicate::Or(..) => {
                let mut operands = vec![];
                flatten_or(predicate, &mut operands);
                let clauses: Vec<Value> = operands
                    .into_iter()
                    .map(|operand| self.build(operand, lookups, aliases))
                    .collect();
                json!({ "$or": clauses })
            }
            AbstractPredicate::Not(inner) => {
                json!({ "$nor": [self.build(inner, lookups, aliases)] })
            }
        }
    }
}

fn comparison(field: &str, operator: &str, operand: Value) -> Value {
    let mut condition = Map::new();
    condition.insert(operator.to_string(), operand);

    let mut document = Map::new();
    document.insert(field.to_string(), Value::Object(condition));
    Value::Object(document)
}

fn flatten_and<'a>(predicate: &'a AbstractPredicate, operands: &mut Vec<&'a AbstractPredicate>) {
    match predicate {
        AbstractPredicate::And(lhs, rhs) => {
            flatten_and(lhs, operands);
            flatten_and(rhs, operands);
        }
        _ => operands.push(predicate),
    }
}

fn flatten_or<'a>(predicate: &'a AbstractPredicate, operands: &mut Vec<&'a AbstractPredicate>) {
    match predicate {
        AbstractPredicate::Or(lhs, rhs) => {
            flatten_or(lhs, operands);
            flatten_or(rhs, operands);
        }
        _ => operands.push(predicate),
    }
}
