//! Per-entry command rewriting.
//!
//! Steps run in a fixed order, each one optional and a no-op when it finds
//! nothing to change:
//!
//! 1. flag addition (`add_flags`)
//! 2. regex filter + replace over the joined command (`filter`, `replacement`)
//! 3. compiler family substitution and relocation (`compiler`, `compiler_path`)
//! 4. include-directory filtering (`filter_include_directories`)
//! 5. absolute include paths (`absolute_include_directories`), followed by a
//!    second include-directory filtering pass
//! 6. include path normalization (`normalize_include_directories`)
//!
//! `directory` is never modified; it is only the base for relative paths.

pub mod compiler;
pub mod includes;

pub use compiler::CompilerFamily;

use crate::cdb::{CompileEntry, shell};
use crate::error::{CdbError, Result};
use crate::filter::compile_optional;
use regex::Regex;
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `[rewrite]` table of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RewriteOptions {
    /// Whitespace-separated tokens appended to every command.
    pub add_flags: Option<String>,
    /// Regex applied to the joined command text.
    pub filter: Option<String>,
    /// Replacement for `filter` matches; `\1`, `\g<name>`, `$1` and `${name}`
    /// refer to groups, any other `$` is literal.
    pub replacement: String,
    pub compiler: Option<CompilerFamily>,
    /// Directory the compiler is moved into.
    pub compiler_path: Option<PathBuf>,
    pub absolute_include_directories: bool,
    pub normalize_include_directories: bool,
    /// Drop include directories matching this regex (always case-sensitive).
    pub filter_include_directories: Option<String>,
    pub case_sensitive: bool,
}

/// Turn a user replacement into the template syntax of the regex crate.
///
/// `\N` and `\g<name>` become `${N}` / `${name}`, `\\` is a backslash, and
/// `$N` / `${name}` pass through. Any other `$` is literal, so `$ORIGIN`
/// survives.
fn translate_replacement(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(c) = rest.chars().next() {
        let after = &rest[c.len_utf8()..];
        rest = after;
        match c {
            '\\' => {
                let digits = after.bytes().take_while(u8::is_ascii_digit).count();
                if digits > 0 {
                    out.push_str(&format!("${{{}}}", &after[..digits]));
                    rest = &after[digits..];
                } else if let Some((name, tail)) =
                    after.strip_prefix("g<").and_then(|g| g.split_once('>'))
                {
                    out.push_str(&format!("${{{name}}}"));
                    rest = tail;
                } else if let Some(tail) = after.strip_prefix('\\') {
                    out.push('\\');
                    rest = tail;
                } else {
                    out.push('\\');
                }
            }
            '$' if after.starts_with(|n: char| n.is_ascii_digit() || n == '{') => out.push('$'),
            '$' => out.push_str("$$"),
            _ => out.push(c),
        }
    }
    out
}

/// Compiled rewrite steps, shared across all entries.
#[derive(Debug)]
pub struct Rewriter {
    extra_flags: Vec<String>,
    filter: Option<(Regex, String)>,
    compiler: Option<CompilerFamily>,
    compiler_path: Option<PathBuf>,
    include_filter: Option<Regex>,
    absolute: bool,
    normalize: bool,
}

impl Rewriter {
    pub fn new(options: &RewriteOptions) -> Result<Self> {
        let filter = compile_optional(options.filter.as_deref(), options.case_sensitive)?
            .map(|re| (re, translate_replacement(&options.replacement)));
        let include_filter =
            compile_optional(options.filter_include_directories.as_deref(), true)?;

        Ok(Self {
            extra_flags: options
                .add_flags
                .as_deref()
                .map(|f| f.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            filter,
            compiler: options.compiler,
            compiler_path: options.compiler_path.clone(),
            include_filter,
            absolute: options.absolute_include_directories,
            normalize: options.normalize_include_directories,
        })
    }

    pub fn is_noop(&self) -> bool {
        self.extra_flags.is_empty()
            && self.filter.is_none()
            && self.compiler.is_none()
            && self.compiler_path.is_none()
            && self.include_filter.is_none()
            && !self.absolute
            && !self.normalize
    }

    /// Apply every configured step to one entry.
    pub fn rewrite(&self, mut entry: CompileEntry) -> Result<CompileEntry> {
        entry.arguments.extend(self.extra_flags.iter().cloned());

        if let Some((re, replacement)) = &self.filter {
            let command = entry.command_line()?;
            if let Cow::Owned(replaced) = re.replace_all(&command, replacement.as_str()) {
                entry.arguments = shell::split(&replaced).ok_or_else(|| {
                    CdbError::format(
                        &entry.file,
                        format!("command no longer parses after filter: {replaced}"),
                    )
                })?;
            }
        }

        if let Some(program) = entry.arguments.first_mut() {
            if let Some(family) = self.compiler {
                *program = compiler::substitute(program, family);
            }
            if let Some(dir) = &self.compiler_path {
                *program = compiler::relocate(program, dir);
            }
        }

        self.filter_includes(&mut entry);
        if self.absolute {
            includes::resolve_absolute(&mut entry.arguments, Path::new(&entry.directory));
            self.filter_includes(&mut entry);
        }
        if self.normalize {
            includes::normalize(&mut entry.arguments);
        }

        Ok(entry)
    }

    /// Rewrite a whole database; the first failure aborts.
    pub fn rewrite_all(&self, entries: Vec<CompileEntry>) -> Result<Vec<CompileEntry>> {
        if self.is_noop() {
            return Ok(entries);
        }
        let rewritten = entries
            .into_iter()
            .map(|entry| self.rewrite(entry))
            .collect::<Result<Vec<_>>>()?;
        debug!(entries = rewritten.len(), "rewrote commands");
        Ok(rewritten)
    }

    fn filter_includes(&self, entry: &mut CompileEntry) {
        if let Some(re) = &self.include_filter {
            let arguments = std::mem::take(&mut entry.arguments);
            entry.arguments = includes::remove_paths(arguments, |p| re.is_match(p));
        }
    }
}
