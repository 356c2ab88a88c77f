// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::predicate::AbstractPredicate;

#[derive(Debug, Clone)]
pub struct AbstractDelete {
    pub collection: String,
    pub predicate: AbstractPredicate,
    /// Delete at most one matching document
    pub single: bool,
    /// Storage name of the primary key. Used to delete by key when the predicate needs a join,
    /// since delete commands cannot join.
    pub pk_field: String,
}
