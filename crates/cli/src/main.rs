// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::Path;

use anyhow::Result;
use common::{
    env::SystemEnvironment,
    logging_tracing,
};

use commands::{
    build::BuildCommandDefinition,
    check::CheckCommandDefinition,
    command::{CommandDefinition, SubcommandDefinition},
    fmt::FmtCommandDefinition,
    generate::GenerateCommandDefinition,
};

mod commands;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    logging_tracing::init();

    let env = SystemEnvironment;
    let config = config::load_config(Path::new("."), &env)?;
    if !config.use_color {
        colored::control::set_override(false);
    }

    let subcommand_definition = SubcommandDefinition::new(
        "docmodel",
        "Schema-driven data access for document stores",
        vec![
            Box::new(CheckCommandDefinition {}),
            Box::new(BuildCommandDefinition {}),
            Box::new(GenerateCommandDefinition {}),
            Box::new(FmtCommandDefinition {}),
        ],
    );

    let command = subcommand_definition
        .command()
        .version(env!("CARGO_PKG_VERSION"));

    let matches = command.get_matches();

    subcommand_definition.execute(&matches, &config).await
}
