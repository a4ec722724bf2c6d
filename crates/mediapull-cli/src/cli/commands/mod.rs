//! CLI command handlers. Each command is in its own file.

mod completions;
mod list;
mod man;
mod pull;

pub use completions::run_completions;
pub use list::run_list;
pub use man::run_man;
pub use pull::run_pull;
