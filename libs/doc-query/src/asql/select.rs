// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{order_by::AbstractOrderBy, predicate::AbstractPredicate};

/// Represents an abstract select operation, but without specific details about how to execute it.
#[derive(Debug, Clone)]
pub struct AbstractSelect {
    /// The collection to select from
    pub collection: String,
    /// The predicate to filter documents. This is not an `Option` so that the caller makes a
    /// conscious decision between `True` and `False`.
    pub predicate: AbstractPredicate,
    pub order_by: AbstractOrderBy,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl AbstractSelect {
    /// Select every document of `collection` matching `predicate`
    pub fn new(collection: impl Into<String>, predicate: AbstractPredicate) -> Self {
        Self {
            collection: collection.into(),
            predicate,
            order_by: AbstractOrderBy::default(),
            offset: None,
            limit: None,
        }
    }
}
