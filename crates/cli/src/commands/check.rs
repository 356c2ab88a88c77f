// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use anyhow::Result;
use async_trait::async_trait;
use clap::{ArgMatches, Command};
use colored::Colorize;

use crate::config::Config;

use super::{
    command::{CommandDefinition, schema_file, schema_file_arg},
    util::load_graph,
};

pub struct CheckCommandDefinition {}

#[async_trait]
impl CommandDefinition for CheckCommandDefinition {
    fn command(&self) -> Command {
        Command::new("check")
            .about("Parse and validate a schema, reporting any errors")
            .arg(schema_file_arg())
    }

    async fn execute(&self, matches: &ArgMatches, config: &Config) -> Result<()> {
        let schema_file = schema_file(matches, config);
        let graph = load_graph(&schema_file, config)?;

        println!(
            "{} {}: {} models, {} relations",
            "✓".green(),
            schema_file.display(),
            graph.models.len(),
            graph.relations.len()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::util::test_util::*;

    #[tokio::test]
    async fn valid_schema() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write_schema(&dir, SCHEMA);
        let definition = CheckCommandDefinition {};

        let result = definition
            .execute(&matches(&definition, &[]), &config_for(schema))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn invalid_schema() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write_schema(&dir, &SCHEMA.replace("model A", "model Z"));
        let definition = CheckCommandDefinition {};

        let err = definition
            .execute(
                &matches(&definition, &[schema.to_str().unwrap()]),
                &Config::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), format!("Failed to build `{}`", schema.display()));
    }

    #[tokio::test]
    async fn missing_schema() {
        let definition = CheckCommandDefinition {};

        let err = definition
            .execute(
                &matches(&definition, &["does-not-exist.prisma"]),
                &Config::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Schema file `does-not-exist.prisma` not found");
    }
}
