// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The client generated from `schema/shop.prisma` at build time.
//!
//! Its models are named `Result`, `Vec` and `Option`, so the generated code compiles only if it
//! never relies on the prelude's meaning of those names.

pub mod client {
    include!(concat!(env!("OUT_DIR"), "/client.rs"));
}
