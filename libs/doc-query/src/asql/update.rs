// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;

use crate::Val;

use super::predicate::AbstractPredicate;

/// Update the single document matching `predicate` and return its new state.
///
/// Only the listed fields are touched: `set` assigns values (including null) and `unset`
/// removes fields. An update that touches nothing reads the document instead.
#[derive(Debug, Clone)]
pub struct AbstractUpdate {
    pub collection: String,
    pub predicate: AbstractPredicate,
    pub set: IndexMap<String, Val>,
    pub unset: Vec<String>,
}

impl AbstractUpdate {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }
}
