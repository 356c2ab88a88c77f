// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The resolved schema graph shared by the builder, the code generator, and the client runtime.

pub mod mapped_arena;
pub mod scalar_type;
pub mod schema;
pub mod types;
