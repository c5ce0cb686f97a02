use crate::cdb::shell;
use crate::error::{CdbError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which of the two equivalent command fields an entry is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStyle {
    /// `"arguments": ["gcc", "-c", "a.c"]`
    #[default]
    Arguments,
    /// `"command": "gcc -c a.c"`
    Command,
}

/// One compilation unit of a compilation database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileEntry {
    /// Working directory of the command. Never rewritten.
    pub directory: String,
    /// Source file, absolute or relative to `directory`.
    pub file: String,
    /// Compiler first, then flags and paths.
    pub arguments: Vec<String>,
    pub output: Option<String>,
    /// Form the entry was loaded from, and will be saved in.
    pub style: CommandStyle,
}

#[derive(Deserialize)]
struct RawEntry {
    directory: String,
    file: String,
    arguments: Option<Vec<String>>,
    command: Option<String>,
    output: Option<String>,
}

// Field order here is the on-disk order.
#[derive(Serialize)]
struct EntryRecord<'a> {
    directory: &'a str,
    file: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a str>,
}

impl CompileEntry {
    pub fn new(
        directory: impl Into<String>,
        file: impl Into<String>,
        arguments: Vec<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            file: file.into(),
            arguments,
            output: None,
            style: CommandStyle::Arguments,
        }
    }

    /// Build an entry from a single command string.
    pub fn from_command(
        directory: impl Into<String>,
        file: impl Into<String>,
        command: &str,
    ) -> Result<Self> {
        let file = file.into();
        let arguments = shell::split(command)
            .ok_or_else(|| CdbError::format(&file, "unbalanced quotes in command"))?;
        Ok(Self {
            directory: directory.into(),
            file,
            arguments,
            output: None,
            style: CommandStyle::Command,
        })
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_style(mut self, style: CommandStyle) -> Self {
        self.style = style;
        self
    }

    /// The compiler executable, if the entry has any tokens at all.
    pub fn compiler(&self) -> Option<&str> {
        self.arguments.first().map(String::as_str)
    }

    /// Arguments joined back into one shell command.
    pub fn command_line(&self) -> Result<String> {
        shell::join(&self.arguments).map_err(|e| CdbError::format(&self.file, e.to_string()))
    }

    /// Absolute, symlink-resolved path of the source file.
    pub fn identity(&self) -> PathBuf {
        paths::canonical_identity(&self.directory, &self.file)
    }

    fn from_raw(raw: RawEntry) -> std::result::Result<Self, String> {
        let (arguments, style) = match (raw.arguments, raw.command) {
            (Some(arguments), _) => (arguments, CommandStyle::Arguments),
            (None, Some(command)) => {
                let arguments =
                    shell::split(&command).ok_or("unbalanced quotes in `command`")?;
                (arguments, CommandStyle::Command)
            }
            (None, None) => return Err("missing field `arguments` or `command`".to_string()),
        };

        Ok(Self {
            directory: raw.directory,
            file: raw.file,
            arguments,
            output: raw.output,
            style,
        })
    }

    fn to_record(&self) -> Result<EntryRecord<'_>> {
        let (command, arguments) = match self.style {
            CommandStyle::Command => (Some(self.command_line()?), None),
            CommandStyle::Arguments => (None, Some(self.arguments.as_slice())),
        };
        Ok(EntryRecord {
            directory: &self.directory,
            file: &self.file,
            command,
            arguments,
            output: self.output.as_deref(),
        })
    }
}

/// Parse a compilation database document.
///
/// `origin` only shows up in error messages (usually the file path).
pub fn parse(raw: &str, origin: &str) -> Result<Vec<CompileEntry>> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| CdbError::format(origin, e.to_string()))?;

    let serde_json::Value::Array(items) = value else {
        return Err(CdbError::format(origin, "expected a JSON array of entries"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(CdbError::format(
                    origin,
                    format!("entry {index}: expected an object"),
                ));
            }
            let raw: RawEntry = serde_json::from_value(item)
                .map_err(|e| CdbError::format(origin, format!("entry {index}: {e}")))?;
            CompileEntry::from_raw(raw)
                .map_err(|msg| CdbError::format(origin, format!("entry {index}: {msg}")))
        })
        .collect()
}

/// Serialize entries as a pretty-printed JSON array.
pub fn serialize(entries: &[CompileEntry]) -> Result<String> {
    let records = entries
        .iter()
        .map(CompileEntry::to_record)
        .collect::<Result<Vec<_>>>()?;
    serde_json::to_string_pretty(&records).map_err(|e| CdbError::format("output", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    const MIXED: &str = r#"[
        {
            "directory": "/path/to/build/directory",
            "file": "path/to/file1.c",
            "command": "/usr/bin/gcc path/to/file1.c -o path/to/output.o -I.."
        },
        {
            "directory": "/path/to/build/directory",
            "file": "path/to/file2.cpp",
            "arguments": ["/usr/bin/g++", "path/to/file2.cpp", "-iquote", "."],
            "output": "path/to/output.o"
        }
    ]"#;

    #[test]
    fn test_parse_both_forms() {
        let entries = parse(MIXED, "mixed.json").unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].style, CommandStyle::Command);
        assert_eq!(
            entries[0].arguments,
            ["/usr/bin/gcc", "path/to/file1.c", "-o", "path/to/output.o", "-I.."]
        );

        assert_eq!(entries[1].style, CommandStyle::Arguments);
        assert_eq!(entries[1].output.as_deref(), Some("path/to/output.o"));
        assert_eq!(entries[1].compiler(), Some("/usr/bin/g++"));
    }

    #[test]
    fn test_round_trip_is_structural_identity() {
        let entries = parse(MIXED, "mixed.json").unwrap();
        let written = serialize(&entries).unwrap();

        let before: Value = serde_json::from_str(MIXED).unwrap();
        let after: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_round_trip_quoted_command() {
        let raw = json!([{
            "directory": "/b",
            "file": "a.c",
            "command": "command 'with spaces!'"
        }])
        .to_string();
        let entries = parse(&raw, "q.json").unwrap();
        assert_eq!(entries[0].arguments, ["command", "with spaces!"]);

        let after: Value = serde_json::from_str(&serialize(&entries).unwrap()).unwrap();
        assert_eq!(after[0]["command"], "command 'with spaces!'");
    }

    #[test]
    fn test_round_trip_windows_command() {
        let raw = json!([{
            "directory": r"C:\build",
            "file": r"C:\src\main.c",
            "command": r"cl.exe /c C:\src\main.c /IC:\inc"
        }]);
        let entries = parse(&raw.to_string(), "win.json").unwrap();
        assert_eq!(entries[0].arguments[2], r"C:\src\main.c");

        let after: Value = serde_json::from_str(&serialize(&entries).unwrap()).unwrap();
        assert_eq!(after, raw);
    }

    #[test]
    fn test_serialize_field_order() {
        let entry = CompileEntry::new("/b", "a.c", vec!["cc".into(), "-c".into(), "a.c".into()])
            .with_output("a.o");
        let written = serialize(&[entry]).unwrap();

        let dir = written.find("\"directory\"").unwrap();
        let file = written.find("\"file\"").unwrap();
        let args = written.find("\"arguments\"").unwrap();
        let output = written.find("\"output\"").unwrap();
        assert!(dir < file && file < args && args < output);
    }

    #[test]
    fn test_arguments_preferred_over_command() {
        let raw = json!([{
            "directory": "/b",
            "file": "a.c",
            "arguments": ["clang", "-c", "a.c"],
            "command": "gcc -c a.c"
        }])
        .to_string();
        let entries = parse(&raw, "both.json").unwrap();
        assert_eq!(entries[0].compiler(), Some("clang"));
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse(r#"{"directory": "/b"}"#, "obj.json").unwrap_err();
        assert!(matches!(err, CdbError::Format { .. }));
    }

    #[test]
    fn test_parse_rejects_non_object_entry() {
        let err = parse(r#"["gcc -c a.c"]"#, "str.json").unwrap_err();
        assert!(err.to_string().contains("entry 0"));
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let no_dir = r#"[{"file": "a.c", "command": "cc a.c"}]"#;
        assert!(parse(no_dir, "x").unwrap_err().to_string().contains("directory"));

        let no_file = r#"[{"directory": "/b", "command": "cc a.c"}]"#;
        assert!(parse(no_file, "x").unwrap_err().to_string().contains("file"));

        let no_cmd = r#"[{"directory": "/b", "file": "a.c"}]"#;
        assert!(
            parse(no_cmd, "x")
                .unwrap_err()
                .to_string()
                .contains("`arguments` or `command`")
        );
    }

    #[test]
    fn test_parse_rejects_broken_json() {
        let err = parse("[{", "broken.json").unwrap_err();
        assert!(err.to_string().starts_with("format error in broken.json"));
    }

    #[test]
    fn test_parse_rejects_unbalanced_quotes() {
        let raw = r#"[{"directory": "/b", "file": "a.c", "command": "cc 'a.c"}]"#;
        assert!(matches!(
            parse(raw, "q").unwrap_err(),
            CdbError::Format { .. }
        ));
    }

    #[test]
    fn test_from_command_style() {
        let entry = CompileEntry::from_command("/b", "a.c", "cc -c a.c").unwrap();
        assert_eq!(entry.style, CommandStyle::Command);
        assert_eq!(entry.command_line().unwrap(), "cc -c a.c");
    }
}
