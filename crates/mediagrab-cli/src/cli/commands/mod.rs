//! CLI command handlers, one file per command.

mod completions;
mod grab;
mod robots;

pub use completions::run_completions;
pub use grab::{run_grab, GrabOptions};
pub use robots::run_robots;
