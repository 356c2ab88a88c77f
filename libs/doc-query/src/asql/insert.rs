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

/// Insert fully staged documents. Keys are storage names.
#[derive(Debug, Clone)]
pub struct AbstractInsert {
    pub collection: String,
    pub documents: Vec<IndexMap<String, Val>>,
}
