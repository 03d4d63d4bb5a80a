//! Locating programs on disk.
//!
//! [`IsExecutable`] decides whether a single path is a runnable
//! program, [`PathCursor`] walks a `$PATH`-like string looking for one.

mod is_executable;
mod search;

pub use is_executable::IsExecutable;
pub use search::executable_exists;
pub use search::executable_exists_in;
pub use search::find_executable;
pub use search::Executables;
pub use search::PathCursor;
