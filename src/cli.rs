//! CLI domain: parse, route, output, and presentation only.
//! No snapshot logic; the route table calls into the engine and prints its results.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat, SnapshotArgs};
pub use route::{CommandOutput, RunContext};
