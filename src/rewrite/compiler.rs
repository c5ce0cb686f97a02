use crate::paths;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;

/// Compiler family to switch an entry to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerFamily {
    /// `gcc` -> `clang`, `g++` -> `clang++`
    Clang,
    /// `clang` -> `gcc`, `clang++` -> `g++`
    Gcc,
}

// Optional target triple prefix, driver name, optional version, optional .exe.
// `clang-cl`, `cc` and `c++` never match.
static DRIVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix>.*-)?(?P<name>clang\+\+|clang|g\+\+|gcc)(?:-[0-9][0-9.]*)?(?P<ext>\.exe)?$")
        .expect("driver name pattern is valid")
});

/// Split a program path into (directory part including the separator, base name).
fn split_program(program: &str) -> (&str, &str) {
    match program.rfind(['/', '\\']) {
        Some(idx) => program.split_at(idx + 1),
        None => ("", program),
    }
}

/// Equivalent driver name in `family`.
///
/// A target triple prefix and `.exe` survive; a version suffix is dropped since
/// version numbers don't carry over between families. Names that aren't a
/// gcc/clang driver come back unchanged.
pub fn substitute(program: &str, family: CompilerFamily) -> String {
    let (dir, base) = split_program(program);
    let Some(caps) = DRIVER.captures(base) else {
        return program.to_string();
    };

    let name = &caps["name"];
    let target = match (family, name) {
        (CompilerFamily::Clang, "gcc") => "clang",
        (CompilerFamily::Clang, "g++") => "clang++",
        (CompilerFamily::Gcc, "clang") => "gcc",
        (CompilerFamily::Gcc, "clang++") => "g++",
        _ => return program.to_string(),
    };

    let prefix = caps.name("prefix").map_or("", |m| m.as_str());
    let ext = caps.name("ext").map_or("", |m| m.as_str());
    format!("{dir}{prefix}{target}{ext}")
}

/// Move the program into `directory`, keeping its base name.
pub fn relocate(program: &str, directory: &Path) -> String {
    let (_, base) = split_program(program);
    paths::normalize(directory)
        .join(base)
        .to_string_lossy()
        .into_owned()
}
