// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{env, fs, path::PathBuf};

// Generates the client for schema/shop.prisma into OUT_DIR/client.rs
fn main() {
    let schema_path = PathBuf::from("./schema/shop.prisma");
    println!("cargo:rerun-if-changed={}", schema_path.display());

    let graph = builder::build_system(&schema_path, false).unwrap();
    let code = codegen::generate(&graph, &codegen::GeneratorOptions::default()).unwrap();

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("client.rs"), code).unwrap();
}
