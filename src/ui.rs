//! Terminal output helpers.
//!
//! - [`Table`] - box-drawn table sized to the terminal, used for the
//!   execution failure summary
//! - [`ProgressObserver`] - progress bar fed by the executor
//!
//! ```text
//!   ┌───┬──────────┬─────────────┐
//!   │ # │ File     │ Reason      │
//!   ├───┼──────────┼─────────────┤
//!   │ 2 │ src/b.c  │ exit code 1 │
//!   └───┴──────────┴─────────────┘
//! ```

use crate::cdb::CompileEntry;
use crate::exec::{ExecutionObserver, ExecutionReport, TaskResult, TaskState};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

// Narrowest a column gets squeezed to when the terminal is too small.
const MIN_COLUMN: usize = 8;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = console::measure_text_width(&flatten(cell));
                widths[i] = widths[i].max(len);
            }
        }

        // Borders and padding: "  │" + " x │" per column.
        let overhead = 3 + 3 * widths.len();
        let available = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > available {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= MIN_COLUMN {
                break;
            }
            widths[idx] -= 1;
        }
        widths
    }

    /// Render for a terminal `max_width` columns wide.
    pub fn render(&self, max_width: usize) -> String {
        if self.headers.is_empty() {
            return String::new();
        }
        let widths = self.column_widths(max_width);

        let separator = |left: &str, mid: &str, right: &str| -> String {
            let inner: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, inner.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| -> String {
            let mut out = String::from("  │");
            for (cell, &width) in cells.iter().zip(&widths) {
                let text = console::truncate_str(&flatten(cell), width, "...").into_owned();
                let padded =
                    console::pad_str(&text, width, console::Alignment::Left, None).into_owned();
                if bold {
                    out.push_str(&format!(" {} │", padded.as_str().bold()));
                } else {
                    out.push_str(&format!(" {} │", padded));
                }
            }
            out
        };

        let mut out = Vec::with_capacity(self.rows.len() + 4);
        out.push(separator("┌", "┬", "┐"));
        out.push(line(&self.headers, true));
        out.push(separator("├", "┼", "┤"));
        for row in &self.rows {
            out.push(line(row, false));
        }
        out.push(separator("└", "┴", "┘"));
        out.join("\n")
    }

    /// Print to stderr, keeping stdout free for the database.
    pub fn print(&self) {
        let (_, width) = console::Term::stderr().size();
        eprintln!("{}", self.render(width as usize));
    }
}

fn flatten(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            _ => c,
        })
        .collect()
}

/// Table of the failed entries of a run.
pub fn failure_table(report: &ExecutionReport) -> Table {
    let mut table = Table::new(&["#", "File", "Reason"]);
    for result in report.failed() {
        table.add_row(vec![
            (result.index + 1).to_string(),
            result.file.clone(),
            result.failure_reason().unwrap_or_default().red().to_string(),
        ]);
    }
    table
}

/// Drives a progress bar from executor callbacks.
///
/// Per-entry messages go to stderr through `suspend` so they still show up
/// when the bar itself is hidden (output not a terminal).
pub struct ProgressObserver {
    bar: ProgressBar,
    total: usize,
    verbose: bool,
}

impl ProgressObserver {
    pub fn new(total: usize, verbose: bool) -> Self {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message("Running...");
        Self {
            bar,
            total,
            verbose,
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ExecutionObserver for ProgressObserver {
    fn on_state(&self, _index: usize, entry: &CompileEntry, state: TaskState) {
        if state == TaskState::Running {
            self.bar.set_message(entry.file.clone());
        }
    }

    fn on_finished(&self, result: &TaskResult) {
        let position = result.index + 1;
        if !result.succeeded() {
            let reason = result.failure_reason().unwrap_or_default();
            let mut message = format!(
                "{} [{}/{}] {} failed ({})",
                "x".red(),
                position,
                self.total,
                result.file,
                reason
            );
            for stream in [&result.stdout, &result.stderr] {
                if !stream.trim().is_empty() {
                    message.push('\n');
                    message.push_str(stream.trim_end());
                }
            }
            self.bar.suspend(|| eprintln!("{message}"));
        } else if self.verbose {
            let mut message = format!("{} [{}/{}] {}", "✓".green(), position, self.total, result.file);
            let output = format!("{}{}", result.stdout, result.stderr);
            if !output.trim().is_empty() {
                message.push('\n');
                message.push_str(output.trim_end());
            }
            self.bar.suspend(|| eprintln!("{message}"));
        }
        self.bar.inc(1);
    }
}
