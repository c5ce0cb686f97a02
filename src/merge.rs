//! Merging several compilation databases into one.
//!
//! Entries are concatenated in source order and deduplicated by canonical file
//! identity. The first entry seen for a file wins, so callers control priority
//! by ordering their sources.

use crate::cdb::{CompileEntry, load_database};
use crate::error::{CdbError, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Result of a merge: the deduplicated entries plus what was left out.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub entries: Vec<CompileEntry>,
    /// Sources that failed to load, with the reason.
    pub skipped: Vec<(PathBuf, CdbError)>,
    /// Entries dropped because an earlier entry had the same identity.
    pub duplicates: usize,
}

/// Merge already-parsed databases, first-seen wins.
pub fn merge<I>(databases: I) -> MergeOutcome
where
    I: IntoIterator<Item = Vec<CompileEntry>>,
{
    let mut seen = HashSet::new();
    let mut outcome = MergeOutcome::default();

    for database in databases {
        for entry in database {
            if seen.insert(entry.identity()) {
                outcome.entries.push(entry);
            } else {
                outcome.duplicates += 1;
            }
        }
    }

    outcome
}

/// Load every source and merge the ones that parse.
///
/// Fails with [`CdbError::NoValidSources`] only when none of them load.
pub fn merge_sources(paths: &[PathBuf]) -> Result<MergeOutcome> {
    let mut loaded = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();

    for path in paths {
        match load_database(path) {
            Ok(entries) => loaded.push(entries),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping compilation database");
                skipped.push((path.clone(), e));
            }
        }
    }

    if loaded.is_empty() {
        return Err(CdbError::NoValidSources {
            attempted: paths.len(),
        });
    }

    let mut outcome = merge(loaded);
    outcome.skipped = skipped;
    debug!(
        entries = outcome.entries.len(),
        duplicates = outcome.duplicates,
        skipped = outcome.skipped.len(),
        "merged compilation databases"
    );
    Ok(outcome)
}
