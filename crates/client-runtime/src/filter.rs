// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Filters, includes and query arguments.
//!
//! [Filter]s name fields by their schema names and carry untyped values. They are checked
//! against the schema only when a call is made. The typed handles ([ScalarField],
//! [RelationField], [CollectionField]) are what generated code hands out, so most type errors
//! never get that far.

use std::marker::PhantomData;

use doc_query::{Ordering, Val};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    Equals(Val),
    NotEquals(Val),
    In(Vec<Val>),
    NotIn(Vec<Val>),
    Lt(Val),
    Lte(Val),
    Gt(Val),
    Gte(Val),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    /// The list field has an element equal to the value
    Has(Val),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationOp {
    /// The to-one related record exists and matches
    Is,
    /// Some record of the back-collection matches
    Some,
    /// No record of the back-collection matches
    None,
    /// Every record of the back-collection matches (vacuously true when empty)
    Every,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Field {
        field: String,
        op: FieldOp,
    },
    Relation {
        field: String,
        op: RelationOp,
        filter: Box<Filter>,
    },
    /// All filters match (an empty list matches everything)
    And(Vec<Filter>),
    /// Any filter matches (an empty list matches nothing)
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn field(field: impl Into<String>, op: FieldOp) -> Self {
        Filter::Field {
            field: field.into(),
            op,
        }
    }

    pub fn relation(field: impl Into<String>, op: RelationOp, filter: Filter) -> Self {
        Filter::Relation {
            field: field.into(),
            op,
            filter: Box::new(filter),
        }
    }

    /// Matches every record
    pub fn all() -> Self {
        Filter::And(vec![])
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }
}

impl std::ops::BitAnd for Filter {
    type Output = Filter;

    fn bitand(self, rhs: Filter) -> Filter {
        match self {
            Filter::And(mut filters) => {
                filters.push(rhs);
                Filter::And(filters)
            }
            lhs => Filter::And(vec![lhs, rhs]),
        }
    }
}

impl std::ops::BitOr for Filter {
    type Output = Filter;

    fn bitor(self, rhs: Filter) -> Filter {
        match self {
            Filter::Or(mut filters) => {
                filters.push(rhs);
                Filter::Or(filters)
            }
            lhs => Filter::Or(vec![lhs, rhs]),
        }
    }
}

impl std::ops::Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        match self {
            Filter::Not(inner) => *inner,
            filter => Filter::Not(Box::new(filter)),
        }
    }
}

/// Load a relation or back-collection along with the records, possibly with nested includes
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub field: String,
    pub include: Vec<Include>,
}

impl Include {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            include: vec![],
        }
    }

    pub fn with(mut self, nested: Include) -> Self {
        self.include.push(nested);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub ordering: Ordering,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindManyArgs {
    pub filter: Option<Filter>,
    pub include: Vec<Include>,
    pub order_by: Vec<OrderBy>,
    pub skip: Option<u64>,
    pub take: Option<u64>,
}

impl FindManyArgs {
    pub fn filter(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Default::default()
        }
    }

    pub fn include(mut self, include: Include) -> Self {
        self.include.push(include);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by.push(order_by);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }
}

/// A scalar field of values of type `T` (for list fields, `T` is a `Vec`)
pub struct ScalarField<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ScalarField<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ScalarField<T> {}

impl<T: Into<Val>> ScalarField<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn op(&self, op: FieldOp) -> Filter {
        Filter::field(self.name, op)
    }

    pub fn equals(&self, value: impl Into<T>) -> Filter {
        self.op(FieldOp::Equals(value.into().into()))
    }

    pub fn not_equals(&self, value: impl Into<T>) -> Filter {
        self.op(FieldOp::NotEquals(value.into().into()))
    }

    pub fn is_null(&self) -> Filter {
        self.op(FieldOp::Equals(Val::Null))
    }

    pub fn is_not_null(&self) -> Filter {
        self.op(FieldOp::NotEquals(Val::Null))
    }

    pub fn in_list<V: Into<T>>(&self, values: impl IntoIterator<Item = V>) -> Filter {
        self.op(FieldOp::In(
            values.into_iter().map(|v| v.into().into()).collect(),
        ))
    }

    pub fn not_in_list<V: Into<T>>(&self, values: impl IntoIterator<Item = V>) -> Filter {
        self.op(FieldOp::NotIn(
            values.into_iter().map(|v| v.into().into()).collect(),
        ))
    }

    pub fn lt(&self, value: impl Into<T>) -> Filter {
        self.op(FieldOp::Lt(value.into().into()))
    }

    pub fn lte(&self, value: impl Into<T>) -> Filter {
        self.op(FieldOp::Lte(value.into().into()))
    }

    pub fn gt(&self, value: impl Into<T>) -> Filter {
        self.op(FieldOp::Gt(value.into().into()))
    }

    pub fn gte(&self, value: impl Into<T>) -> Filter {
        self.op(FieldOp::Gte(value.into().into()))
    }

    pub fn asc(&self) -> OrderBy {
        OrderBy {
            field: self.name.to_string(),
            ordering: Ordering::Asc,
        }
    }

    pub fn desc(&self) -> OrderBy {
        OrderBy {
            field: self.name.to_string(),
            ordering: Ordering::Desc,
        }
    }
}

impl ScalarField<String> {
    pub fn contains(&self, value: impl Into<String>) -> Filter {
        self.op(FieldOp::Contains(value.into()))
    }

    pub fn starts_with(&self, value: impl Into<String>) -> Filter {
        self.op(FieldOp::StartsWith(value.into()))
    }

    pub fn ends_with(&self, value: impl Into<String>) -> Filter {
        self.op(FieldOp::EndsWith(value.into()))
    }
}

impl<T: Into<Val>> ScalarField<Vec<T>> {
    pub fn has(&self, value: impl Into<T>) -> Filter {
        self.op(FieldOp::Has(value.into().into()))
    }
}

/// The owning side of a relation
#[derive(Debug, Clone, Copy)]
pub struct RelationField {
    name: &'static str,
}

impl RelationField {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn is(&self, filter: Filter) -> Filter {
        Filter::relation(self.name, RelationOp::Is, filter)
    }

    pub fn is_not(&self, filter: Filter) -> Filter {
        !self.is(filter)
    }

    pub fn include(&self) -> Include {
        Include::field(self.name)
    }
}

/// A back-collection
#[derive(Debug, Clone, Copy)]
pub struct CollectionField {
    name: &'static str,
}

impl CollectionField {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn some(&self, filter: Filter) -> Filter {
        Filter::relation(self.name, RelationOp::Some, filter)
    }

    pub fn none(&self, filter: Filter) -> Filter {
        Filter::relation(self.name, RelationOp::None, filter)
    }

    pub fn every(&self, filter: Filter) -> Filter {
        Filter::relation(self.name, RelationOp::Every, filter)
    }

    pub fn include(&self) -> Include {
        Include::field(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    const GQL: ScalarField<String> = ScalarField::new("gql");
    const TAGS: ScalarField<Vec<String>> = ScalarField::new("tags");
    const A: RelationField = RelationField::new("a");

    #[multiplatform_test]
    fn typed_handles_build_filters() {
        assert_eq!(
            A.is(GQL.equals("x")),
            Filter::relation(
                "a",
                RelationOp::Is,
                Filter::field("gql", FieldOp::Equals(Val::from("x")))
            )
        );
        assert_eq!(
            TAGS.has("t"),
            Filter::field("tags", FieldOp::Has(Val::from("t")))
        );
        assert_eq!(
            GQL.in_list(["x", "y"]),
            Filter::field("gql", FieldOp::In(vec![Val::from("x"), Val::from("y")]))
        );
    }

    #[multiplatform_test]
    fn combinators_flatten() {
        let filter = GQL.equals("x") & GQL.equals("y") & GQL.is_null();
        assert!(matches!(&filter, Filter::And(filters) if filters.len() == 3));

        let double_negation = !!GQL.equals("x");
        assert_eq!(double_negation, GQL.equals("x"));
    }
}
