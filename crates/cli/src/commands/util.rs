// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{
    fs,
    io::Write,
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use builder::error::ParserError;
use core_model::schema::SchemaGraph;

use crate::config::Config;

/// Parse and resolve a schema file. Source errors have already been printed with an excerpt when
/// this fails.
pub(super) fn load_graph(schema_file: &Path, config: &Config) -> Result<SchemaGraph> {
    builder::build_system(schema_file, config.use_color).map_err(|err| match err {
        ParserError::FileNotFound(name) => anyhow!("Schema file `{name}` not found"),
        ParserError::IO(err) => {
            anyhow!(err).context(format!("Failed to read `{}`", schema_file.display()))
        }
        _ => anyhow!("Failed to build `{}`", schema_file.display()),
    })
}

/// Write `content` to `output` (creating its directory), or to stdout
pub(super) fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(output) => {
            if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Could not create the directory `{}`", parent.display())
                })?;
            }
            fs::write(output, content)
                .with_context(|| format!("Failed to write `{}`", output.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::{fs, path::PathBuf};

    use clap::ArgMatches;

    use crate::{commands::command::CommandDefinition, config::Config};

    pub const SCHEMA: &str = r#"model A {
  id  String  @id @default(auto()) @map("_id") @db.ObjectId
  gql String?
}

model B {
  id   String @id @default(auto()) @map("_id") @db.ObjectId
  a_id String @db.ObjectId
  a    A      @relation(fields: [a_id], references: [id])
}
"#;

    pub fn write_schema(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("schema.prisma");
        fs::write(&path, content).unwrap();
        path
    }

    pub fn matches(definition: &dyn CommandDefinition, args: &[&str]) -> ArgMatches {
        let name = definition.command().get_name().to_string();
        definition
            .command()
            .try_get_matches_from(std::iter::once(name.as_str()).chain(args.iter().copied()))
            .unwrap()
    }

    pub fn config_for(schema_path: PathBuf) -> Config {
        Config {
            schema_path,
            ..Config::default()
        }
    }
}
