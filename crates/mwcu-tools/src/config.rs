use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::clone::CloneConfig;
use crate::survey::SurveyConfig;
use crate::trim::TrimConfig;
use crate::wg_vars::WgVarsConfig;

/// Settings file shared by the tools. Every section (`clone`, `wg_vars`,
/// `trim`, `survey`) and every field is optional.
///
/// ```json
/// {
///   "clone": { "base_url": "https://gerrit.wikimedia.org/r/p" },
///   "wg_vars": { "batch_size": 10, "retries": 5 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub clone: CloneConfig,
    pub wg_vars: WgVarsConfig,
    pub trim: TrimConfig,
    pub survey: SurveyConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl ToolsConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
