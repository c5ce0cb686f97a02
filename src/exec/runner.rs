use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Captured result of one finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Spawns one command and waits for it.
///
/// An `Err` means the process could not be started at all.
pub trait Runner: Sync {
    fn run(&self, argv: &[String], cwd: &Path) -> io::Result<RunOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    fn run(&self, argv: &[String], cwd: &Path) -> io::Result<RunOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()?;

        Ok(RunOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_is_spawn_error() {
        let err = ProcessRunner.run(&[], Path::new(".")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let argv = vec!["cdbx-definitely-not-a-compiler".to_string()];
        assert!(ProcessRunner.run(&argv, Path::new(".")).is_err());
    }

    #[test]
    fn test_run_output_success() {
        let ok = RunOutput {
            exit_code: Some(0),
            ..Default::default()
        };
        let signalled = RunOutput::default();
        assert!(ok.success());
        assert!(!signalled.success());
    }
}
