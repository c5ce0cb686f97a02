//! Selecting a subset of entries.
//!
//! Four selections, always applied in this order so combining options gives
//! the same result regardless of how they were spelled:
//!
//! 1. include list (`include_files`)
//! 2. regex include (`filter_files`)
//! 3. regex exclude (`exclude_files`)
//! 4. remove list (`remove_files`)
//!
//! Every pattern is compiled in [`FileFilter::new`], so a malformed regex
//! fails before a single entry is dropped.

use crate::cdb::CompileEntry;
use crate::error::{CdbError, Result};
use crate::paths;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `[filter]` table of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Keep only these files.
    pub include_files: Vec<String>,
    /// Drop these files.
    pub remove_files: Vec<String>,
    /// Prepended to every path of `include_files` and `remove_files`.
    pub path_prefix: String,
    /// Keep only files matching this regex.
    pub filter_files: Option<String>,
    /// Drop files matching this regex.
    pub exclude_files: Option<String>,
    /// Regexes are case-insensitive unless set.
    pub case_sensitive: bool,
}

/// Compile a user-supplied regex, mapping failures to `InvalidPattern`.
pub(crate) fn compile_pattern(pattern: &str, case_sensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| CdbError::pattern(pattern, e))
}

/// Compile an optional pattern; empty strings count as unset.
pub(crate) fn compile_optional(
    pattern: Option<&str>,
    case_sensitive: bool,
) -> Result<Option<Regex>> {
    pattern
        .filter(|p| !p.is_empty())
        .map(|p| compile_pattern(p, case_sensitive))
        .transpose()
}

/// Explicit file list, matched by raw `file` value or by canonical identity.
#[derive(Debug)]
struct PathSet {
    raw: HashSet<String>,
    identities: HashSet<PathBuf>,
}

impl PathSet {
    fn new(files: &[String], prefix: &str) -> Option<Self> {
        if files.is_empty() {
            return None;
        }

        let mut raw = HashSet::new();
        let mut identities = HashSet::new();
        for file in files {
            let prefixed = format!("{}{}", prefix, file.trim());
            identities.insert(paths::identity_of(Path::new(&prefixed)));
            raw.insert(prefixed);
        }
        Some(Self { raw, identities })
    }

    fn contains(&self, entry: &CompileEntry) -> bool {
        self.raw.contains(&entry.file) || self.identities.contains(&entry.identity())
    }
}

/// Compiled file selection.
#[derive(Debug)]
pub struct FileFilter {
    include: Option<PathSet>,
    include_regex: Option<Regex>,
    exclude_regex: Option<Regex>,
    remove: Option<PathSet>,
}

impl FileFilter {
    pub fn new(options: &FilterOptions) -> Result<Self> {
        Ok(Self {
            include: PathSet::new(&options.include_files, &options.path_prefix),
            include_regex: compile_optional(options.filter_files.as_deref(), options.case_sensitive)?,
            exclude_regex: compile_optional(
                options.exclude_files.as_deref(),
                options.case_sensitive,
            )?,
            remove: PathSet::new(&options.remove_files, &options.path_prefix),
        })
    }

    /// True when no selection is configured.
    pub fn is_noop(&self) -> bool {
        self.include.is_none()
            && self.include_regex.is_none()
            && self.exclude_regex.is_none()
            && self.remove.is_none()
    }

    /// Whether a single entry survives every selection.
    pub fn keeps(&self, entry: &CompileEntry) -> bool {
        if let Some(include) = &self.include
            && !include.contains(entry)
        {
            return false;
        }
        if let Some(re) = &self.include_regex
            && !re.is_match(&entry.file)
        {
            return false;
        }
        if let Some(re) = &self.exclude_regex
            && re.is_match(&entry.file)
        {
            return false;
        }
        if let Some(remove) = &self.remove
            && remove.contains(entry)
        {
            return false;
        }
        true
    }

    /// Keep the selected entries, preserving order.
    pub fn apply(&self, entries: Vec<CompileEntry>) -> Vec<CompileEntry> {
        if self.is_noop() {
            return entries;
        }
        let before = entries.len();
        let kept: Vec<_> = entries.into_iter().filter(|e| self.keeps(e)).collect();
        debug!(before, after = kept.len(), "filtered entries");
        kept
    }
}
