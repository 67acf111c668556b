//! Command handlers for the `mwcu` binary.
//!
//! Each submodule implements one subcommand and returns the process exit
//! code. Reports go to stdout; errors go to stderr.

mod case_check;
mod clone;
mod lint;
mod long_functions;
mod stylize;
mod survey;
mod trim;
mod wg_vars;

pub use case_check::case_check;
pub use clone::clone_all;
pub use lint::lint;
pub use long_functions::long_functions;
pub use stylize::stylize_paths;
pub use survey::survey;
pub use trim::trim_i18n;
pub use wg_vars::wg_vars;
