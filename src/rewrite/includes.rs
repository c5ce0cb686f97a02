//! Include-directory flags: `-I`, `-isystem`, `-iquote`, `-idirafter`.
//!
//! Each flag may carry its path in the next token (`-isystem /x`) or glued to
//! the flag (`-I../inc`). Both forms are handled everywhere in this module.

use crate::paths;
use std::path::Path;

// Longest first so `-isystem` is never read as `-i` + `system`.
const INCLUDE_FLAGS: [&str; 4] = ["-isystem", "-idirafter", "-iquote", "-I"];

/// Split a token into (flag, glued path). `None` for the path means the path
/// is the next token.
fn split_flag(token: &str) -> Option<(&'static str, Option<&str>)> {
    INCLUDE_FLAGS.iter().find_map(|&flag| {
        let rest = token.strip_prefix(flag)?;
        Some((flag, (!rest.is_empty()).then_some(rest)))
    })
}

/// Rewrite every include path for which `f` returns a replacement.
///
/// The compiler token at index 0 is never inspected.
pub fn map_paths(arguments: &mut [String], mut f: impl FnMut(&str) -> Option<String>) {
    let mut i = 1;
    while i < arguments.len() {
        match split_flag(&arguments[i]) {
            Some((_, None)) => {
                if let Some(new) = arguments.get(i + 1).and_then(|path| f(path)) {
                    arguments[i + 1] = new;
                }
                i += 2;
                continue;
            }
            Some((flag, Some(path))) => {
                if let Some(new) = f(path) {
                    arguments[i] = format!("{flag}{new}");
                }
            }
            None => {}
        }
        i += 1;
    }
}

/// Drop include flags (and their paths) whose path matches `matches`.
pub fn remove_paths(arguments: Vec<String>, matches: impl Fn(&str) -> bool) -> Vec<String> {
    let mut out = Vec::with_capacity(arguments.len());
    let mut i = 0;
    while i < arguments.len() {
        let token = &arguments[i];
        if i > 0 {
            match split_flag(token) {
                Some((_, None)) => {
                    if let Some(path) = arguments.get(i + 1) {
                        if !matches(path) {
                            out.push(token.clone());
                            out.push(path.clone());
                        }
                        i += 2;
                        continue;
                    }
                }
                Some((_, Some(path))) if matches(path) => {
                    i += 1;
                    continue;
                }
                _ => {}
            }
        }
        out.push(token.clone());
        i += 1;
    }
    out
}

/// Make relative include paths absolute against `directory`.
///
/// Already-absolute paths are left alone, so applying this twice changes
/// nothing the second time.
pub fn resolve_absolute(arguments: &mut [String], directory: &Path) {
    map_paths(arguments, |path| {
        let p = Path::new(path);
        if p.is_absolute() {
            None
        } else {
            Some(paths::resolve(directory, p).to_string_lossy().into_owned())
        }
    });
}

/// Lexically normalize include paths (`a/./b/../c` -> `a/c`).
pub fn normalize(arguments: &mut [String]) {
    map_paths(arguments, |path| {
        let normalized = paths::normalize(Path::new(path))
            .to_string_lossy()
            .into_owned();
        (normalized != path).then_some(normalized)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_split_flag_forms() {
        assert_eq!(split_flag("-I"), Some(("-I", None)));
        assert_eq!(split_flag("-I../inc"), Some(("-I", Some("../inc"))));
        assert_eq!(split_flag("-isystem"), Some(("-isystem", None)));
        assert_eq!(split_flag("-isystem/x"), Some(("-isystem", Some("/x"))));
        assert_eq!(split_flag("-include"), None);
        assert_eq!(split_flag("-c"), None);
    }

    #[test]
    fn test_resolve_absolute_glued() {
        let mut a = args("clang -I../inc -c a.c");
        resolve_absolute(&mut a, Path::new("/proj/build"));
        assert_eq!(a, args("clang -I/proj/inc -c a.c"));
    }

    #[test]
    fn test_resolve_absolute_separate() {
        let mut a = args("gcc -iquote . -isystem include -idirafter /abs -c a.c");
        resolve_absolute(&mut a, Path::new("/path/to/build/directory"));
        assert_eq!(
            a,
            args(
                "gcc -iquote /path/to/build/directory -isystem /path/to/build/directory/include -idirafter /abs -c a.c"
            )
        );
    }

    #[test]
    fn test_resolve_absolute_is_idempotent() {
        let mut once = args("cc -I.. -Isomething -iquote . -c a.c");
        resolve_absolute(&mut once, Path::new("/b/d"));
        let mut twice = once.clone();
        resolve_absolute(&mut twice, Path::new("/b/d"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_dangling_flag_is_left_alone() {
        let mut a = args("cc -c a.c -I");
        resolve_absolute(&mut a, Path::new("/b"));
        assert_eq!(a, args("cc -c a.c -I"));
    }

    #[test]
    fn test_normalize_paths() {
        let mut a = args("cc -I./inc/../src -isystem /usr/./include -Iplain");
        normalize(&mut a);
        assert_eq!(a, args("cc -Isrc -isystem /usr/include -Iplain"));
    }

    #[test]
    fn test_remove_paths() {
        let a = args("cc -I/opt/vendor/inc -Iinclude -isystem /opt/vendor/sys -c a.c");
        let kept = remove_paths(a, |p| p.contains("vendor"));
        assert_eq!(kept, args("cc -Iinclude -c a.c"));
    }
}
