// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use doc_query::Val;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ExecutionError;

/// Field name to value, in the model's field order. Included relations appear as
/// [Val::Object] (or [Val::Null]) and included back-collections as [Val::List] of objects.
pub type Record = IndexMap<String, Val>;

/// A change to one field in an update
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    /// Leave the field as is
    Keep,
    /// Assign a value
    Set(T),
    /// Remove the field (only for nullable fields)
    Unset,
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Keep => Patch::Keep,
            Patch::Set(value) => Patch::Set(f(value)),
            Patch::Unset => Patch::Unset,
        }
    }
}

// Not derived, so that `T` need not be `Default`
impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Set(value)
    }
}

/// Field name to change. Fields left out are kept.
pub type RecordPatch = IndexMap<String, Patch<Val>>;

/// Convert a record into a typed value through its plain-JSON form
pub fn from_record<T: DeserializeOwned>(model: &str, record: Record) -> Result<T, ExecutionError> {
    let json = Value::Object(
        record
            .iter()
            .map(|(key, value)| (key.clone(), value.to_plain_json()))
            .collect(),
    );

    serde_json::from_value(json).map_err(|err| ExecutionError::Decode {
        model: model.to_string(),
        message: err.to_string(),
    })
}

/// [from_record] over every record, failing on the first that does not convert
pub fn from_records<T: DeserializeOwned>(
    model: &str,
    records: Vec<Record>,
) -> Result<Vec<T>, ExecutionError> {
    records
        .into_iter()
        .map(|record| from_record(model, record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct B {
        id: String,
        #[serde(rename = "aId")]
        a_id: String,
        #[serde(default)]
        a: Option<Box<A>>,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct A {
        id: String,
        gql: Option<String>,
    }

    #[multiplatform_test]
    fn typed_records() {
        let record = Record::from([
            ("id".to_string(), Val::Id("b1".to_string())),
            ("aId".to_string(), Val::Id("a1".to_string())),
            (
                "a".to_string(),
                Val::Object(Record::from([
                    ("id".to_string(), Val::Id("a1".to_string())),
                    ("gql".to_string(), Val::Null),
                ])),
            ),
        ]);

        assert_eq!(
            from_record::<B>("B", record).unwrap(),
            B {
                id: "b1".to_string(),
                a_id: "a1".to_string(),
                a: Some(Box::new(A {
                    id: "a1".to_string(),
                    gql: None
                })),
            }
        );
    }

    #[multiplatform_test]
    fn mismatched_record() {
        let record = Record::from([("id".to_string(), Val::Int(1))]);
        assert!(matches!(
            from_record::<A>("A", record),
            Err(ExecutionError::Decode { model, .. }) if model == "A"
        ));
    }

    #[multiplatform_test]
    fn typed_record_lists() {
        let record = |id: &str| {
            Record::from([
                ("id".to_string(), Val::Id(id.to_string())),
                ("gql".to_string(), Val::from("q")),
            ])
        };

        let records: Vec<A> = from_records("A", vec![record("a1"), record("a2")]).unwrap();
        assert_eq!(
            records.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a1", "a2"]
        );

        let broken = Record::from([("id".to_string(), Val::Bool(true))]);
        assert!(from_records::<A>("A", vec![record("a1"), broken]).is_err());
    }

    #[multiplatform_test]
    fn patch_defaults_to_keep() {
        let patch: Patch<String> = Patch::default();
        assert!(patch.is_keep());

        struct NoDefault;
        assert!(Patch::<NoDefault>::default().is_keep());
        assert_eq!(
            Patch::from("x".to_string()).map(Val::from),
            Patch::Set(Val::from("x"))
        );
    }
}
