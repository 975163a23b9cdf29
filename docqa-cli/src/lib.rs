//! # docqa-cli
//!
//! Building blocks of the `docqa` binary: argument parsing, document loading,
//! provider selection, session wiring and the chat loop.

pub mod args;
pub mod loader;
pub mod output;
pub mod providers;
pub mod repl;
pub mod session;

pub use args::{Args, Command};
pub use session::{FileReport, Session};
