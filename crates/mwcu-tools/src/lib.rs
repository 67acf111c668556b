//! MediaWiki Maintenance Tools
//!
//! The small jobs around a MediaWiki checkout that are not about PHP
//! syntax: trimming translation files down to the keys of their source
//! language, cloning every active Gerrit repository, finding `$wg`
//! configuration variables that nothing deployed reads any more, and
//! surveying extension registration files.
//!
//! Each tool takes its settings from a `serde` struct with working
//! defaults; [`ToolsConfig`] groups them for loading from a JSON file.

pub mod clone;
pub mod config;
pub mod survey;
pub mod trim;
pub mod wg_vars;

pub use clone::{CloneConfig, CloneError};
pub use config::{ConfigError, ToolsConfig};
pub use survey::{SurveyConfig, SurveyError};
pub use trim::{TrimConfig, TrimError};
pub use wg_vars::{SearchError, WgVarsConfig};
