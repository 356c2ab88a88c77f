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

use crate::config::Config;

use super::{
    command::{CommandDefinition, get, output_arg, schema_file, schema_file_arg},
    util::{load_graph, write_output},
};

const DEFAULT_OUTPUT: &str = "target/schema.json";

pub struct BuildCommandDefinition {}

#[async_trait]
impl CommandDefinition for BuildCommandDefinition {
    fn command(&self) -> Command {
        Command::new("build")
            .about("Build the schema graph and write it as JSON")
            .arg(schema_file_arg())
            .arg(output_arg().help("Output file path (default: target/schema.json)"))
    }

    async fn execute(&self, matches: &ArgMatches, config: &Config) -> Result<()> {
        let schema_file = schema_file(matches, config);
        let output: PathBuf =
            get(matches, "output").unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

        let graph = load_graph(&schema_file, config)?;
        let serialized = graph
            .serialize_pretty()
            .context("Failed to serialize the schema graph")?;
        write_output(Some(&output), &serialized)?;

        eprintln!("Schema graph {} created", output.display());
        Ok(())
    }
}
