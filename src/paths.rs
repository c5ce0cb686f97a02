//! Path helpers shared by the merger, the filter engine and the rewriter.
//!
//! Two notions of "the same file" are used across the crate:
//!
//! - [`normalize`] is purely lexical (`a/./b/../c` becomes `a/c`) and never
//!   touches the filesystem.
//! - [`canonical_identity`] resolves an entry's file against its directory and
//!   follows symlinks when the file exists, falling back to the lexical form
//!   otherwise. This is the key used for deduplication.

use std::fs;
use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path, dropping `.` and folding `..` where possible.
///
/// A leading `..` on a relative path is kept; `..` directly under the root
/// stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Join `path` onto `base` unless it is already absolute, then normalize.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Absolute, symlink-resolved identity of an entry's source file.
pub fn canonical_identity(directory: &str, file: &str) -> PathBuf {
    let joined = resolve(Path::new(directory), Path::new(file));
    fs::canonicalize(&joined).unwrap_or(joined)
}

/// Identity of a user-supplied path (from `--include-files` and friends).
///
/// Relative paths are taken relative to the current working directory.
pub fn identity_of(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        normalize(path)
    } else {
        match std::env::current_dir() {
            Ok(cwd) => resolve(&cwd, path),
            Err(_) => normalize(path),
        }
    };
    fs::canonicalize(&absolute).unwrap_or(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_parent_and_current() {
        assert_eq!(
            normalize(Path::new("/proj/build/../inc")),
            PathBuf::from("/proj/inc")
        );
        assert_eq!(normalize(Path::new("/a/./b/./c")), PathBuf::from("/a/b/c"));
        assert_eq!(normalize(Path::new("a/b/../../..")), PathBuf::from(".."));
    }

    #[test]
    fn test_normalize_root_parent() {
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
    }

    #[test]
    fn test_normalize_empty_becomes_dot() {
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn test_resolve_keeps_absolute() {
        assert_eq!(
            resolve(Path::new("/proj/build"), Path::new("/usr/include")),
            PathBuf::from("/usr/include")
        );
        assert_eq!(
            resolve(Path::new("/proj/build"), Path::new("../src/a.c")),
            PathBuf::from("/proj/src/a.c")
        );
    }

    #[test]
    fn test_canonical_identity_missing_file_is_lexical() {
        let id = canonical_identity("/nonexistent-cdbx/build", "../src/./a.c");
        assert_eq!(id, PathBuf::from("/nonexistent-cdbx/src/a.c"));
    }

    #[cfg(unix)]
    #[test]
    fn test_canonical_identity_follows_symlinks() -> std::io::Result<()> {
        let tmp = tempfile::tempdir()?;
        let real = tmp.path().join("real");
        fs::create_dir_all(&real)?;
        fs::write(real.join("a.c"), "int a;")?;
        std::os::unix::fs::symlink(&real, tmp.path().join("link"))?;

        let via_link = canonical_identity(&tmp.path().join("link").to_string_lossy(), "a.c");
        let direct = canonical_identity(&real.to_string_lossy(), "a.c");
        assert_eq!(via_link, direct);
        Ok(())
    }
}
