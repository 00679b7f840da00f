//! ctdb command execution
//!
//! - `CommandRunner` / `CtdbCommands`: the seam every parser talks through
//! - `CtdbCommand`: the real runner, direct argv invocation with a timeout

pub mod process;
pub mod runner;

pub use process::CtdbCommand;
pub use runner::{CommandRunner, CtdbCommands};
