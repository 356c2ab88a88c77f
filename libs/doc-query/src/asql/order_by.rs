// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    Asc,
    Desc,
}

/// Sort keys, most significant first. Field names are storage names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbstractOrderBy(pub Vec<(String, Ordering)>);

impl AbstractOrderBy {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
