use super::entry::{CompileEntry, parse, serialize};
use crate::error::{CdbError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Conventional file name of a compilation database.
pub const DATABASE_FILE_NAME: &str = "compile_commands.json";

/// Where the resulting database goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
    Stderr,
    /// Transform (and optionally run) without writing anything.
    Discard,
}

impl From<&str> for OutputTarget {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "stdout" => OutputTarget::Stdout,
            "stderr" => OutputTarget::Stderr,
            "none" => OutputTarget::Discard,
            _ => OutputTarget::File(PathBuf::from(value)),
        }
    }
}

impl std::fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputTarget::File(path) => write!(f, "{}", path.display()),
            OutputTarget::Stdout => write!(f, "stdout"),
            OutputTarget::Stderr => write!(f, "stderr"),
            OutputTarget::Discard => write!(f, "none"),
        }
    }
}

/// Read and parse one compilation database file.
pub fn load_database(path: &Path) -> Result<Vec<CompileEntry>> {
    let raw = fs::read_to_string(path).map_err(|e| CdbError::io(path, e))?;
    let entries = parse(&raw, &path.display().to_string())?;
    debug!(path = %path.display(), entries = entries.len(), "loaded compilation database");
    Ok(entries)
}

/// Write entries to `target`.
///
/// An empty database is refused for file targets so a bad filter never
/// clobbers a working `compile_commands.json`.
pub fn save_database(target: &OutputTarget, entries: &[CompileEntry]) -> Result<()> {
    let json = serialize(entries)?;
    match target {
        OutputTarget::File(path) => {
            if entries.is_empty() {
                return Err(CdbError::EmptyOutput { path: path.clone() });
            }
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).map_err(|e| CdbError::io(parent, e))?;
            }
            fs::write(path, format!("{json}\n")).map_err(|e| CdbError::io(path, e))?;
            debug!(path = %path.display(), entries = entries.len(), "wrote compilation database");
        }
        OutputTarget::Stdout => println!("{json}"),
        OutputTarget::Stderr => eprintln!("{json}"),
        OutputTarget::Discard => {}
    }
    Ok(())
}

/// Recursively find `compile_commands.json` files under `root`.
///
/// Symlinks are followed, and paths resolving to the same real file are only
/// reported once. Unreadable directories and symlink loops are logged and
/// skipped. A database sitting directly in `root` is skipped, since that
/// is where the merged result is normally written. Results are sorted by path
/// so merge priority does not depend on directory iteration order.
pub fn find_databases(root: &Path) -> Result<Vec<PathBuf>> {
    let root = fs::canonicalize(root).map_err(|e| CdbError::io(root, e))?;
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                warn!(path = %path, error = %e, "skipping unreadable path during discovery");
                continue;
            }
        };
        if !entry.file_type().is_file() || entry.file_name() != DATABASE_FILE_NAME {
            continue;
        }

        let real = fs::canonicalize(entry.path()).unwrap_or_else(|_| entry.path().to_path_buf());
        if real.parent() == Some(root.as_path()) {
            continue;
        }
        if seen.insert(real.clone()) {
            found.push(real);
        }
    }

    debug!(root = %root.display(), found = found.len(), "discovered compilation databases");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_db(dir: &Path, json: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(DATABASE_FILE_NAME);
        fs::write(&path, json).unwrap();
        path
    }

    const ONE: &str = r#"[{"directory": "/b", "file": "a.c", "command": "cc -c a.c"}]"#;

    #[test]
    fn test_output_target_from_str() {
        assert_eq!(OutputTarget::from("stdout"), OutputTarget::Stdout);
        assert_eq!(OutputTarget::from("STDERR"), OutputTarget::Stderr);
        assert_eq!(OutputTarget::from("None"), OutputTarget::Discard);
        assert_eq!(
            OutputTarget::from("out/cdb.json"),
            OutputTarget::File(PathBuf::from("out/cdb.json"))
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_database(Path::new("/nonexistent-cdbx/compile_commands.json")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let tmp = tempfile::tempdir().unwrap();
        let src = write_db(tmp.path(), ONE);
        let entries = load_database(&src)?;

        let out = tmp.path().join("nested").join("out.json");
        save_database(&OutputTarget::File(out.clone()), &entries)?;
        assert_eq!(load_database(&out)?, entries);
        Ok(())
    }

    #[test]
    fn test_save_refuses_empty_file_output() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out.json");
        let err = save_database(&OutputTarget::File(out.clone()), &[]).unwrap_err();
        assert!(matches!(err, CdbError::EmptyOutput { .. }));
        assert!(!out.exists());

        assert!(save_database(&OutputTarget::Discard, &[]).is_ok());
    }

    #[test]
    fn test_find_databases_skips_root() -> Result<()> {
        let tmp = tempfile::tempdir().unwrap();
        write_db(tmp.path(), ONE);
        let c1 = write_db(&tmp.path().join("component1"), ONE);
        let c2 = write_db(&tmp.path().join("component2").join("build"), ONE);

        let found = find_databases(tmp.path())?;
        let expected: Vec<PathBuf> = [c1, c2]
            .iter()
            .map(|p| fs::canonicalize(p).unwrap())
            .collect();
        assert_eq!(found, expected);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_find_databases_survives_symlink_loop() -> Result<()> {
        let tmp = tempfile::tempdir().unwrap();
        let inner = write_db(&tmp.path().join("component1"), ONE);
        std::os::unix::fs::symlink(tmp.path(), tmp.path().join("component1").join("loop"))
            .unwrap();

        let found = find_databases(tmp.path())?;
        assert_eq!(found, [fs::canonicalize(inner).unwrap()]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_find_databases_follows_symlinks_once() -> Result<()> {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root");
        let external = write_db(&tmp.path().join("external_component"), ONE);
        let inner = write_db(&root.join("component1"), ONE);

        std::os::unix::fs::symlink(tmp.path().join("external_component"), root.join("ext")).unwrap();
        std::os::unix::fs::symlink(root.join("component1"), root.join("alias")).unwrap();

        let found = find_databases(&root)?;
        assert_eq!(found.len(), 2);
        assert!(found.contains(&fs::canonicalize(external).unwrap()));
        assert!(found.contains(&fs::canonicalize(inner).unwrap()));
        Ok(())
    }
}
