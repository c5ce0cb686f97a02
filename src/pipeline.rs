//! Wiring the stages together: load → merge → filter → rewrite.
//!
//! [`Pipeline::new`] compiles every pattern up front, so an invalid regex is
//! reported before anything is loaded, transformed or written.

use crate::cdb::{self, CommandStyle, CompileEntry, DATABASE_FILE_NAME};
use crate::config::CdbConfig;
use crate::error::{CdbError, Result};
use crate::filter::FileFilter;
use crate::merge::{self, MergeOutcome};
use crate::rewrite::Rewriter;
use std::path::PathBuf;
use tracing::info;

/// Where the input databases come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// One database file.
    File(PathBuf),
    /// Several files, merged in the given priority order.
    Files(Vec<PathBuf>),
    /// `compile_commands.json` in `root`, or every database below it when
    /// `recursive` is set.
    Directory { root: PathBuf, recursive: bool },
}

/// Load the input into one deduplicated database.
///
/// A single file must load. Multi-source inputs skip sources that don't load
/// and only fail with `NoValidSources` when nothing loads.
pub fn load_input(input: &Input) -> Result<MergeOutcome> {
    match input {
        Input::File(path) => Ok(merge::merge([cdb::load_database(path)?])),
        Input::Files(paths) => merge::merge_sources(paths),
        Input::Directory {
            root,
            recursive: false,
        } => Ok(merge::merge([cdb::load_database(
            &root.join(DATABASE_FILE_NAME),
        )?])),
        Input::Directory {
            root,
            recursive: true,
        } => {
            let found = cdb::find_databases(root)?;
            if found.is_empty() {
                return Err(CdbError::NoValidSources { attempted: 0 });
            }
            info!(count = found.len(), "found compilation databases");
            merge::merge_sources(&found)
        }
    }
}

/// Compiled filter + rewrite stages.
#[derive(Debug)]
pub struct Pipeline {
    filter: FileFilter,
    rewriter: Rewriter,
    style: Option<CommandStyle>,
}

impl Pipeline {
    pub fn new(config: &CdbConfig) -> Result<Self> {
        Ok(Self {
            filter: FileFilter::new(&config.filter)?,
            rewriter: Rewriter::new(&config.rewrite)?,
            style: config.output.style,
        })
    }

    /// Filter, rewrite and set the output form of `entries`.
    pub fn transform(&self, entries: Vec<CompileEntry>) -> Result<Vec<CompileEntry>> {
        let selected = self.filter.apply(entries);
        let rewritten = self.rewriter.rewrite_all(selected)?;
        Ok(match self.style {
            Some(style) => rewritten
                .into_iter()
                .map(|entry| entry.with_style(style))
                .collect(),
            None => rewritten,
        })
    }
}
