use crate::cdb::CommandStyle;
use crate::exec::RunOptions;
use crate::filter::FilterOptions;
use crate::rewrite::RewriteOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// File picked up from the working directory when `--config` isn't given.
pub const CONFIG_FILE_NAME: &str = "cdbx.toml";

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct OutputOptions {
    /// File path, or `stdout` / `stderr` / `none`.
    pub path: Option<String>,
    /// Force every entry into one form; unset keeps each entry's own form.
    pub style: Option<CommandStyle>,
}

/// Everything a run of the pipeline can be told to do.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CdbConfig {
    pub filter: FilterOptions,
    pub rewrite: RewriteOptions,
    pub run: RunOptions,
    pub output: OutputOptions,
}

impl CdbConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration - check the TOML syntax")
    }
}

/// Load the configuration file, if any.
///
/// An explicit path must exist; otherwise `cdbx.toml` in the current
/// directory is used when present, and defaults when not.
pub fn load_config(explicit: Option<&Path>) -> Result<CdbConfig> {
    let path = match explicit {
        Some(path) => path,
        None if Path::new(CONFIG_FILE_NAME).exists() => Path::new(CONFIG_FILE_NAME),
        None => return Ok(CdbConfig::default()),
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    CdbConfig::from_toml(&content).with_context(|| format!("In {}", path.display()))
}
