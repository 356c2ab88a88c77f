// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use common::{
    env::Environment,
    env_const::{DOCMODEL_NO_COLOR, DOCMODEL_SCHEMA},
};
use serde::Deserialize;
use tracing::debug;

use super::model::{Config, DEFAULT_RUNTIME_CRATE, DEFAULT_SCHEMA_FILE, GenerateConfig};

const CONFIG_FILE: &str = "docmodel.toml";

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigSer {
    pub schema: Option<SchemaSer>,
    pub generate: Option<GenerateSer>,
}

#[derive(Deserialize, Debug, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct SchemaSer {
    pub path: Option<String>,
}

#[derive(Deserialize, Debug, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GenerateSer {
    pub output: Option<String>,
    #[serde(rename = "runtime-crate")]
    pub runtime_crate: Option<String>,
}

impl TryFrom<ConfigSer> for Config {
    type Error = anyhow::Error;

    fn try_from(config: ConfigSer) -> Result<Self, Self::Error> {
        let schema_path = config
            .schema
            .and_then(|schema| schema.path)
            .unwrap_or_else(|| DEFAULT_SCHEMA_FILE.to_string());

        Ok(Config {
            schema_path: PathBuf::from(schema_path),
            generate: config
                .generate
                .map(GenerateConfig::try_from)
                .transpose()?
                .unwrap_or_default(),
            use_color: true,
        })
    }
}

impl TryFrom<GenerateSer> for GenerateConfig {
    type Error = anyhow::Error;

    fn try_from(config: GenerateSer) -> Result<Self, Self::Error> {
        let runtime_crate = config
            .runtime_crate
            .unwrap_or_else(|| DEFAULT_RUNTIME_CRATE.to_string());

        let valid_crate_name = !runtime_crate.is_empty()
            && !runtime_crate.starts_with(|c: char| c.is_ascii_digit())
            && runtime_crate
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_crate_name {
            return Err(anyhow!(
                "Invalid runtime-crate `{runtime_crate}`: expected a crate name such as `{DEFAULT_RUNTIME_CRATE}`"
            ));
        }

        Ok(GenerateConfig {
            output: config.output.map(PathBuf::from),
            runtime_crate,
        })
    }
}

fn load_config_from_file(path: &Path) -> Result<Config> {
    let toml_str = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read file '{}': {}", path.display(), e))?;
    let config: ConfigSer = toml::from_str(&toml_str)
        .map_err(|e| anyhow!("Failed to parse TOML file '{}': {}", path.display(), e))?;

    config.try_into()
}

/// Load `docmodel.toml` from `dir` (defaults if absent), then apply environment overrides
pub fn load_config(dir: &Path, env: &dyn Environment) -> Result<Config> {
    let config_path = dir.join(CONFIG_FILE);

    let mut config = if config_path.exists() {
        debug!("Loading {}", config_path.display());
        load_config_from_file(&config_path)?
    } else {
        Config::default()
    };

    if let Some(schema_path) = env.get(DOCMODEL_SCHEMA) {
        config.schema_path = PathBuf::from(schema_path);
    }
    config.use_color = !env.enabled(DOCMODEL_NO_COLOR, false)?;

    Ok(config)
}
