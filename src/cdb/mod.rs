//! Compilation database model and file access.
//!
//! - [`entry`] - `CompileEntry`, `parse` and `serialize`
//! - [`shell`] - shell-word split/join for the `command` form
//! - [`io`] - loading, saving and discovering databases on disk

pub mod entry;
pub mod io;
pub mod shell;

pub use entry::{CommandStyle, CompileEntry, parse, serialize};
pub use io::{DATABASE_FILE_NAME, OutputTarget, find_databases, load_database, save_database};
