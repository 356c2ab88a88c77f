// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Translation between the schema-level view (fields, filters, records) and the store-level view
//! (storage names, predicates, documents).

pub(crate) mod coerce;
pub(crate) mod decode;
pub(crate) mod predicate;
pub(crate) mod write;
