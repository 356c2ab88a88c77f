// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{ArgMatches, Command};
use codegen::GeneratorOptions;

use crate::config::Config;

use super::{
    command::{CommandDefinition, get, output_arg, schema_file, schema_file_arg},
    util::{load_graph, write_output},
};

pub struct GenerateCommandDefinition {}

#[async_trait]
impl CommandDefinition for GenerateCommandDefinition {
    fn command(&self) -> Command {
        Command::new("generate")
            .about("Generate a typed Rust client for a schema")
            .arg(schema_file_arg())
            .arg(output_arg().help(
                "Output file path (default: `[generate] output` in docmodel.toml, else stdout)",
            ))
    }

    async fn execute(&self, matches: &ArgMatches, config: &Config) -> Result<()> {
        let schema_file = schema_file(matches, config);
        let output: Option<PathBuf> =
            get(matches, "output").or_else(|| config.generate.output.clone());

        let graph = load_graph(&schema_file, config)?;
        let options = GeneratorOptions {
            runtime_crate: config.generate.runtime_crate.clone(),
        };
        let code = codegen::generate(&graph, &options)
            .with_context(|| format!("Failed to generate code for `{}`", schema_file.display()))?;

        write_output(output.as_deref(), &code)?;

        if let Some(output) = output {
            eprintln!("Client code {} generated", output.display());
        }
        Ok(())
    }
}
