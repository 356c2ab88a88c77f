// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// The core idea in this library is that of [AbstractOperation], which declares the intention of
/// a store operation: which collection, which documents (an [AbstractPredicate]) and what to do
/// with them. [DatabaseExecutor] turns an operation into one or more database command documents
/// and ships them through an injected [Transport].
///
/// Predicates may reach into related collections through [RelationLink]s. Such predicates are
/// executed as an aggregation whose pipeline joins the related collections before matching, so
/// the caller never spells out the joins.
///
/// Wire documents use the store's extended JSON: identifiers travel as `{"$oid": ..}`, date-times
/// as `{"$date": ..}` and big integers as `{"$numberLong": ..}` (see [Val::to_wire]).
mod asql;
mod transform;
mod value;

#[cfg(any(feature = "test-support", test))]
pub mod testing;

pub mod database_error;
pub mod transport;

/// Public types at the root level of this crate
pub use asql::{
    abstract_operation::AbstractOperation,
    database_executor::DatabaseExecutor,
    delete::AbstractDelete,
    insert::AbstractInsert,
    order_by::{AbstractOrderBy, Ordering},
    predicate::{AbstractPredicate, RelationLink, RelationQuantifier},
    select::AbstractSelect,
    update::AbstractUpdate,
};

pub use transport::{CommandKind, Transport, TransportError, WireCommand, WireResponse};
pub use value::Val;
