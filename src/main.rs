//! # cdbx CLI Entry Point
//!
//! Parses the command line with clap, layers the flags over `cdbx.toml` and
//! runs the pipeline:
//!
//! ```text
//! load/merge -> filter -> rewrite -> write -> (run)
//! ```
//!
//! Exit status is 0 on success, 1 on errors or failed commands, and 2 when an
//! input file does not exist.

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use cdbx::cdb::{self, DATABASE_FILE_NAME, OutputTarget};
use cdbx::config::{self, CdbConfig};
use cdbx::exec::Executor;
use cdbx::pipeline::{self, Input, Pipeline};
use cdbx::rewrite::CompilerFamily;
use cdbx::ui;
use cdbx::{CdbError, CommandStyle};

#[derive(Parser, Debug)]
#[command(name = "cdbx")]
#[command(
    about = "Manipulate compilation databases (compile_commands.json)",
    version = env!("CARGO_PKG_VERSION")
)]
#[command(long_about = None)]
struct Cli {
    /// Directory containing a compilation database [default: .]
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Path to a compilation database
    #[arg(long, value_name = "FILE", conflicts_with = "dir")]
    file: Option<PathBuf>,

    /// Paths to compilation databases, implies --merge
    #[arg(long, num_args = 1.., value_name = "FILE", conflicts_with_all = ["dir", "file"])]
    files: Vec<PathBuf>,

    /// Find every compile_commands.json below --dir and merge them
    #[arg(short, long)]
    merge: bool,

    /// Replace gcc/g++ by clang/clang++
    #[arg(long, conflicts_with = "gcc")]
    clang: bool,

    /// Replace clang/clang++ by gcc/g++
    #[arg(long)]
    gcc: bool,

    /// Move the compiler into this directory (e.g. /usr/local/bin)
    #[arg(long, alias = "compiler_path", value_name = "DIR")]
    compiler_path: Option<PathBuf>,

    /// Output file, or stdout / stderr / none [default: ./compile_commands.json]
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Write every entry with the `command` field
    #[arg(long, conflicts_with = "arguments")]
    command: bool,

    /// Write every entry with the `arguments` field
    #[arg(long)]
    arguments: bool,

    /// Flags appended to every command
    #[arg(long, alias = "add_flags", value_name = "FLAGS", allow_hyphen_values = true)]
    add_flags: Option<String>,

    /// Files to keep (every other file is removed)
    #[arg(long, alias = "include_files", num_args = 1.., value_name = "FILE")]
    include_files: Vec<String>,

    /// Files to remove
    #[arg(long, alias = "remove_files", num_args = 1.., value_name = "FILE")]
    remove_files: Vec<String>,

    /// Prefix of the paths given to --include-files and --remove-files
    #[arg(long, alias = "path_prefix", value_name = "PREFIX")]
    path_prefix: Option<String>,

    /// Regex removed (or replaced) in every command
    #[arg(long, value_name = "REGEX", allow_hyphen_values = true)]
    filter: Option<String>,

    /// Replacement for --filter matches, may reference groups (\1, \g<name> or $1)
    #[arg(long, value_name = "TEXT", allow_hyphen_values = true)]
    replacement: Option<String>,

    /// Keep only files matching this regex
    #[arg(long, alias = "filter_files", value_name = "REGEX")]
    filter_files: Option<String>,

    /// Remove files matching this regex
    #[arg(long, alias = "exclude_files", value_name = "REGEX")]
    exclude_files: Option<String>,

    /// Match regexes case-sensitively
    #[arg(long, alias = "case_sensitive")]
    case_sensitive: bool,

    /// Remove include directories matching this regex, case-sensitively (before
    /// and after --absolute-include-directories)
    #[arg(long, alias = "filter_include_directories", value_name = "REGEX")]
    filter_include_directories: Option<String>,

    /// Make include directories absolute
    #[arg(long, aliases = ["absolute_include_directories", "absolute_include_paths"])]
    absolute_include_directories: bool,

    /// Normalize include directory paths
    #[arg(long, aliases = ["normalize_include_directories", "normalize_paths"])]
    normalize_include_directories: bool,

    /// Execute every command of the resulting database
    #[arg(long)]
    run: bool,

    /// Worker threads for --run [default: number of CPUs]
    #[arg(short = 'j', long, value_name = "N")]
    threads: Option<usize>,

    /// Increase verbosity (up to three times)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Configuration file [default: ./cdbx.toml if present]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

impl Cli {
    fn input(&self) -> Input {
        if let Some(file) = &self.file {
            Input::File(file.clone())
        } else if !self.files.is_empty() {
            Input::Files(self.files.clone())
        } else {
            Input::Directory {
                root: self.dir.clone().unwrap_or_else(|| PathBuf::from(".")),
                recursive: self.merge,
            }
        }
    }

    /// Flags win over the configuration file.
    fn apply_to(&self, config: &mut CdbConfig) {
        let filter = &mut config.filter;
        if !self.include_files.is_empty() {
            filter.include_files = self.include_files.clone();
        }
        if !self.remove_files.is_empty() {
            filter.remove_files = self.remove_files.clone();
        }
        if let Some(prefix) = &self.path_prefix {
            filter.path_prefix = prefix.clone();
        }
        if self.filter_files.is_some() {
            filter.filter_files = self.filter_files.clone();
        }
        if self.exclude_files.is_some() {
            filter.exclude_files = self.exclude_files.clone();
        }

        let rewrite = &mut config.rewrite;
        if self.add_flags.is_some() {
            rewrite.add_flags = self.add_flags.clone();
        }
        if self.filter.is_some() {
            rewrite.filter = self.filter.clone();
        }
        if let Some(replacement) = &self.replacement {
            rewrite.replacement = replacement.clone();
        }
        if self.clang {
            rewrite.compiler = Some(CompilerFamily::Clang);
        } else if self.gcc {
            rewrite.compiler = Some(CompilerFamily::Gcc);
        }
        if self.compiler_path.is_some() {
            rewrite.compiler_path = self.compiler_path.clone();
        }
        if self.filter_include_directories.is_some() {
            rewrite.filter_include_directories = self.filter_include_directories.clone();
        }
        rewrite.absolute_include_directories |= self.absolute_include_directories;
        rewrite.normalize_include_directories |= self.normalize_include_directories;

        if self.case_sensitive {
            config.filter.case_sensitive = true;
            config.rewrite.case_sensitive = true;
        }

        config.run.enabled |= self.run;
        if let Some(threads) = self.threads {
            config.run.threads = threads;
        }

        if self.output.is_some() {
            config.output.path = self.output.clone();
        }
        if self.command {
            config.output.style = Some(CommandStyle::Command);
        } else if self.arguments {
            config.output.style = Some(CommandStyle::Arguments);
        }
    }

    fn warnings(&self, config: &CdbConfig) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.threads.is_some() && !config.run.enabled {
            warnings.push("--threads (-j) is ignored since --run was not passed".to_string());
        }
        if self.files.len() > 1 && !self.merge {
            warnings.push("more than one file passed to --files, merging them".to_string());
        }
        if !config.rewrite.replacement.is_empty() && config.rewrite.filter.is_none() {
            warnings.push("--replacement requires --filter".to_string());
        }
        warnings
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn output_target(config: &CdbConfig) -> Result<OutputTarget> {
    match &config.output.path {
        Some(path) => Ok(OutputTarget::from(path.as_str())),
        None => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            Ok(OutputTarget::File(cwd.join(DATABASE_FILE_NAME)))
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let mut config = config::load_config(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    for warning in cli.warnings(&config) {
        eprintln!("{} {}", "!".yellow(), warning);
    }
    debug!(?config, "effective configuration");

    // Patterns are checked before any database is loaded.
    let pipeline = Pipeline::new(&config)?;
    let target = output_target(&config)?;

    let input = cli.input();
    let merged = pipeline::load_input(&input)?;
    for (path, err) in &merged.skipped {
        eprintln!("{} Skipping {}: {}", "!".yellow(), path.display(), err);
    }
    if merged.duplicates > 0 {
        debug!(duplicates = merged.duplicates, "dropped duplicate entries");
    }

    let entries = pipeline.transform(merged.entries)?;
    cdb::save_database(&target, &entries)
        .with_context(|| format!("Failed to write compilation database to {target}"))?;
    if let OutputTarget::File(path) = &target {
        eprintln!(
            "{} Wrote {} entries to {}",
            "✓".green(),
            entries.len(),
            path.display()
        );
    }

    if !config.run.enabled {
        return Ok(ExitCode::SUCCESS);
    }

    let executor = Executor::new(config.run.effective_threads());
    eprintln!(
        "{} Running {} commands on {} threads",
        "➜".blue(),
        entries.len(),
        executor.threads()
    );
    let observer = ui::ProgressObserver::new(entries.len(), cli.verbose > 0);
    let report = executor.execute(&entries, &observer)?;
    observer.finish();

    let failures = ui::failure_table(&report);
    let exit_code = report.exit_code();
    match report.into_result() {
        Ok(report) => {
            eprintln!(
                "{} {} commands succeeded in {:.2}s",
                "✓".green(),
                report.total(),
                report.elapsed.as_secs_f64()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            failures.print();
            eprintln!("{} {}", "x".red(), err);
            Ok(ExitCode::from(exit_code))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "x".red(), err);
            let not_found = err
                .chain()
                .filter_map(|e| e.downcast_ref::<CdbError>())
                .any(CdbError::is_not_found);
            if not_found {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
