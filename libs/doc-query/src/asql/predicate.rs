// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::Val;

/// How the documents of a related collection are joined to the current one
#[derive(Debug, Clone, PartialEq)]
pub struct RelationLink {
    /// Collection holding the related documents
    pub from: String,
    /// Field of the current document
    pub local_field: String,
    /// Field of the related documents that must equal `local_field`
    pub foreign_field: String,
    /// Name of the relation field, used to derive a readable join alias
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationQuantifier {
    /// Some joined document matches (to-one "is", or to-many "some")
    Some,
    /// No joined document matches
    None,
}

/// A predicate over the documents of a collection, possibly reaching into related collections.
///
/// Field names are storage names. Use [AbstractPredicate::and], [AbstractPredicate::or] and
/// [AbstractPredicate::not] to combine predicates; they reduce trivially true or false operands.
#[derive(Debug, Clone, PartialEq)]
pub enum AbstractPredicate {
    True,
    False,

    Eq(String, Val),
    Neq(String, Val),
    Lt(String, Val),
    Lte(String, Val),
    Gt(String, Val),
    Gte(String, Val),
    In(String, Vec<Val>),
    NotIn(String, Vec<Val>),

    /// The string field matches the (already escaped) regular expression
    Regex(String, String),
    /// The list field has an element equal to the value
    Has(String, Val),

    Relation {
        link: RelationLink,
        quantifier: RelationQuantifier,
        predicate: Box<AbstractPredicate>,
    },

    // Prefer AbstractPredicate::and(), which simplifies the clause
    And(Box<AbstractPredicate>, Box<AbstractPredicate>),
    // Prefer AbstractPredicate::or(), which simplifies the clause
    Or(Box<AbstractPredicate>, Box<AbstractPredicate>),
    // Prefer AbstractPredicate::not(), which simplifies the clause
    Not(Box<AbstractPredicate>),
}

impl AbstractPredicate {
    pub fn eq(field: impl Into<String>, value: Val) -> Self {
        AbstractPredicate::Eq(field.into(), value)
    }

    /// Membership test, reducing to `False` for an empty list
    pub fn in_list(field: impl Into<String>, values: Vec<Val>) -> Self {
        if values.is_empty() {
            AbstractPredicate::False
        } else {
            AbstractPredicate::In(field.into(), values)
        }
    }

    /// Non-membership test, reducing to `True` for an empty list
    pub fn not_in_list(field: impl Into<String>, values: Vec<Val>) -> Self {
        if values.is_empty() {
            AbstractPredicate::True
        } else {
            AbstractPredicate::NotIn(field.into(), values)
        }
    }

    /// A match through a relation. A quantified `False` needs no join at all.
    pub fn relation(
        link: RelationLink,
        quantifier: RelationQuantifier,
        predicate: AbstractPredicate,
    ) -> Self {
        match (quantifier, predicate) {
            (RelationQuantifier::Some, AbstractPredicate::False) => AbstractPredicate::False,
            (RelationQuantifier::None, AbstractPredicate::False) => AbstractPredicate::True,
            (quantifier, predicate) => AbstractPredicate::Relation {
                link,
                quantifier,
                predicate: Box::new(predicate),
            },
        }
    }

    /// Logical and of two predicates, reducing to a simpler predicate if possible.
    pub fn and(lhs: AbstractPredicate, rhs: AbstractPredicate) -> AbstractPredicate {
        match (lhs, rhs) {
            (AbstractPredicate::False, _) | (_, AbstractPredicate::False) => {
                AbstractPredicate::False
            }
            (AbstractPredicate::True, rhs) => rhs,
            (lhs, AbstractPredicate::True) => lhs,
            (lhs, rhs) if lhs == rhs => lhs,
            (lhs, rhs) => AbstractPredicate::And(Box::new(lhs), Box::new(rhs)),
        }
    }

    /// Logical or of two predicates, reducing to a simpler predicate if possible.
    pub fn or(lhs: AbstractPredicate, rhs: AbstractPredicate) -> AbstractPredicate {
        match (lhs, rhs) {
            (AbstractPredicate::True, _) | (_, AbstractPredicate::True) => AbstractPredicate::True,
            (AbstractPredicate::False, rhs) => rhs,
            (lhs, AbstractPredicate::False) => lhs,
            (lhs, rhs) if lhs == rhs => lhs,
            (lhs, rhs) => AbstractPredicate::Or(Box::new(lhs), Box::new(rhs)),
        }
    }

    /// Does evaluating this predicate require joining another collection?
    pub fn needs_join(&self) -> bool {
        match self {
            AbstractPredicate::Relation { .. } => true,
            AbstractPredicate::And(lhs, rhs) | AbstractPredicate::Or(lhs, rhs) => {
                lhs.needs_join() || rhs.needs_join()
            }
            AbstractPredicate::Not(inner) => inner.needs_join(),
            _ => false,
        }
    }
}

impl std::ops::Not for AbstractPredicate {
    type Output = AbstractPredicate;

    fn not(self) -> Self::Output {
        match self {
            // Reduced to a simpler form when possible, else fall back to AbstractPredicate::Not
            AbstractPredicate::True => AbstractPredicate::False,
            AbstractPredicate::False => AbstractPredicate::True,
            AbstractPredicate::Eq(field, value) => AbstractPredicate::Neq(field, value),
            AbstractPredicate::Neq(field, value) => AbstractPredicate::Eq(field, value),
            AbstractPredicate::In(field, values) => AbstractPredicate::NotIn(field, values),
            AbstractPredicate::NotIn(field, values) => AbstractPredicate::In(field, values),
            AbstractPredicate::Not(inner) => *inner,
            predicate => AbstractPredicate::Not(Box::new(predicate)),
        }
    }
}

impl From<bool> for AbstractPredicate {
    fn from(b: bool) -> AbstractPredicate {
        if b {
            AbstractPredicate::True
        } else {
            AbstractPredicate::False
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    fn gql_eq(value: &str) -> AbstractPredicate {
        AbstractPredicate::eq("gql", Val::from(value))
    }

    #[multiplatform_test]
    fn and_or_reduce_constants() {
        assert_eq!(
            AbstractPredicate::and(AbstractPredicate::True, gql_eq("x")),
            gql_eq("x")
        );
        assert_eq!(
            AbstractPredicate::and(gql_eq("x"), AbstractPredicate::False),
            AbstractPredicate::False
        );
        assert_eq!(
            AbstractPredicate::or(AbstractPredicate::False, gql_eq("x")),
            gql_eq("x")
        );
        assert_eq!(
            AbstractPredicate::or(gql_eq("x"), AbstractPredicate::True),
            AbstractPredicate::True
        );
        assert_eq!(AbstractPredicate::and(gql_eq("x"), gql_eq("x")), gql_eq("x"));
    }

    #[multiplatform_test]
    fn negation_flips_comparisons() {
        assert_eq!(
            !gql_eq("x"),
            AbstractPredicate::Neq("gql".to_string(), Val::from("x"))
        );
        let regex = AbstractPredicate::Regex("gql".into(), "^x".into());
        assert_eq!(!!regex.clone(), regex);
        assert_eq!(!AbstractPredicate::True, AbstractPredicate::False);
    }

    #[multiplatform_test]
    fn empty_membership() {
        assert_eq!(
            AbstractPredicate::in_list("gql", vec![]),
            AbstractPredicate::False
        );
        assert_eq!(
            AbstractPredicate::not_in_list("gql", vec![]),
            AbstractPredicate::True
        );
    }

    #[multiplatform_test]
    fn quantified_false_relation() {
        let link = RelationLink {
            from: "A".to_string(),
            local_field: "a_id".to_string(),
            foreign_field: "_id".to_string(),
            name: "a".to_string(),
        };

        assert_eq!(
            AbstractPredicate::relation(
                link.clone(),
                RelationQuantifier::Some,
                AbstractPredicate::False
            ),
            AbstractPredicate::False
        );
        assert_eq!(
            AbstractPredicate::relation(link, RelationQuantifier::None, AbstractPredicate::False),
            AbstractPredicate::True
        );
    }
}
