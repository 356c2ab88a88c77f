// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Runtime support for generated data-access clients.
//!
//! A [ClientContext] holds the schema graph and an injected [Transport]. [ModelOps] turns typed
//! filters, includes and writes into store commands, and decodes the replies into records.

mod context;
mod error;
mod filter;
mod id;
mod mapper;
mod ops;
mod value;

pub use context::ClientContext;
pub use error::{ExecutionError, WithContext};
pub use filter::{
    CollectionField, FieldOp, Filter, FindManyArgs, Include, OrderBy, RelationField, RelationOp,
    ScalarField,
};
pub use id::{IdGenerator, ObjectIdGenerator, SequentialIdGenerator};
pub use ops::ModelOps;
pub use value::{Patch, Record, RecordPatch, from_record, from_records};

pub use doc_query::{Ordering, Transport, TransportError, Val, WireCommand, WireResponse};
pub use tokio_util::sync::CancellationToken;

// Generated code refers to these through the runtime crate
pub use chrono;
pub use serde;
pub use serde_json;
