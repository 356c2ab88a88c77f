// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::PathBuf;

pub const DEFAULT_SCHEMA_FILE: &str = "schema.prisma";
pub const DEFAULT_RUNTIME_CRATE: &str = "client_runtime";

#[derive(Debug, PartialEq)]
pub struct Config {
    /// The schema file used when none is given on the command line
    pub schema_path: PathBuf,
    pub generate: GenerateConfig,
    /// Color diagnostics and status output; off when `DOCMODEL_NO_COLOR` is set
    pub use_color: bool,
}

#[derive(Debug, PartialEq)]
pub struct GenerateConfig {
    /// Where `generate` writes when `-o` is not given; stdout if unset
    pub output: Option<PathBuf>,
    pub runtime_crate: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from(DEFAULT_SCHEMA_FILE),
            generate: GenerateConfig::default(),
            use_color: true,
        }
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            output: None,
            runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
        }
    }
}
