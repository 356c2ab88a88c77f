// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fs;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::Config;

use super::{
    command::{CommandDefinition, schema_file, schema_file_arg},
    util::{load_graph, write_output},
};

pub struct FmtCommandDefinition {}

#[async_trait]
impl CommandDefinition for FmtCommandDefinition {
    fn command(&self) -> Command {
        Command::new("fmt")
            .about("Rewrite a schema in canonical form")
            .arg(schema_file_arg())
            .arg(
                Arg::new("check")
                    .help("Only report whether the schema is already formatted")
                    .long("check")
                    .action(ArgAction::SetTrue),
            )
    }

    async fn execute(&self, matches: &ArgMatches, config: &Config) -> Result<()> {
        let schema_file = schema_file(matches, config);
        let check = matches.get_flag("check");

        let graph = load_graph(&schema_file, config)?;
        let current = fs::read_to_string(&schema_file)
            .with_context(|| format!("Failed to read `{}`", schema_file.display()))?;
        let formatted = builder::render(&graph);

        if current == formatted {
            return Ok(());
        }

        if check {
            return Err(anyhow!("`{}` is not formatted", schema_file.display()));
        }

        write_output(Some(&schema_file), &formatted)?;
        eprintln!("Formatted {}", schema_file.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::util::test_util::*;

    const UNFORMATTED: &str = "model A {\nid String @id @map(\"_id\") @db.ObjectId @default(auto())\n  gql String?\n}\n";

    #[tokio::test]
    async fn check_reports_unformatted() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write_schema(&dir, UNFORMATTED);
        let definition = FmtCommandDefinition {};

        let err = definition
            .execute(&matches(&definition, &["--check"]), &config_for(schema.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), format!("`{}` is not formatted", schema.display()));
        assert_eq!(fs::read_to_string(&schema).unwrap(), UNFORMATTED);
    }

    #[tokio::test]
    async fn rewrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write_schema(&dir, UNFORMATTED);
        let definition = FmtCommandDefinition {};
        let config = config_for(schema.clone());

        definition
            .execute(&matches(&definition, &[]), &config)
            .await
            .unwrap();

        assert_eq!(
            fs::read_to_string(&schema).unwrap(),
            "model A {\n  id  String  @id @default(auto()) @map(\"_id\") @db.ObjectId\n  gql String?\n}\n"
        );
        definition
            .execute(&matches(&definition, &["--check"]), &config)
            .await
            .unwrap();
    }
}
