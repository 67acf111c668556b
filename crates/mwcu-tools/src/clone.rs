//! Clone every active repository listed by a Gerrit server.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CloneConfig {
    pub gerrit_host: String,
    /// Prefix for clone URLs, `https://gerrit.wikimedia.org/r/p` without ssh
    /// access.
    pub base_url: String,
    /// Case-insensitive globs of repository names never cloned.
    pub skip: Vec<String>,
    pub destination: PathBuf,
}

impl Default for CloneConfig {
    fn default() -> Self {
        let skip = [
            "test*",
            "operations*",
            "analytics*",
            "labs*",
            "integration*",
            "wikimedia*",
            "mediawiki/packages*",
            "All-Projects",
            "apps*",
            "search*",
            "translatewiki*",
            "webplatform.org*",
            "qa*",
            "glam*",
        ];
        Self {
            gerrit_host: "gerrit.wikimedia.org".to_string(),
            base_url: "ssh://gerrit.wikimedia.org:29418".to_string(),
            skip: skip.iter().map(|s| s.to_string()).collect(),
            destination: PathBuf::from("."),
        }
    }
}

impl CloneConfig {
    pub fn projects_url(&self) -> String {
        format!("https://{}/r/projects/?d", self.gerrit_host)
    }

    pub fn clone_url(&self, repo: &str) -> String {
        format!("{}/{}.git", self.base_url.trim_end_matches('/'), repo)
    }

    fn skip_set(&self) -> Result<GlobSet, CloneError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.skip {
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| CloneError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })?;
            builder.add(glob);
        }
        builder.build().map_err(|source| CloneError::Pattern {
            pattern: self.skip.join(","),
            source,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    #[error("could not fetch project list from {url}: {source}")]
    Fetch {
        url: String,
        source: Box<ureq::Error>,
    },
    #[error("could not read project list from {url}: {source}")]
    Body { url: String, source: std::io::Error },
    #[error("invalid project list: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("invalid skip pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },
    #[error("could not run git: {0}")]
    Spawn(#[source] std::io::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One entry of the Gerrit project list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub description: Option<String>,
}

impl Project {
    /// Gerrit keeps dead repositories around, marked in the description.
    pub fn is_deleted(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains("deleted"))
    }
}

/// Decode a Gerrit REST response, stripping the `)]}'` guard line.
pub fn parse_projects(body: &str) -> Result<BTreeMap<String, Project>, CloneError> {
    let json = body.strip_prefix(")]}'").unwrap_or(body);
    serde_json::from_str(json).map_err(CloneError::Decode)
}

/// Where the project list comes from.
pub trait ProjectSource {
    fn projects(&self) -> Result<BTreeMap<String, Project>, CloneError>;
}

pub struct GerritProjects {
    url: String,
    agent: ureq::Agent,
}

impl GerritProjects {
    pub fn new(config: &CloneConfig) -> Self {
        Self {
            url: config.projects_url(),
            agent: ureq::agent(),
        }
    }
}

impl ProjectSource for GerritProjects {
    fn projects(&self) -> Result<BTreeMap<String, Project>, CloneError> {
        tracing::info!(url = %self.url, "fetching project list");
        let response = self
            .agent
            .get(&self.url)
            .set("Accept", "application/json")
            .call()
            .map_err(|source| CloneError::Fetch {
                url: self.url.clone(),
                source: Box::new(source),
            })?;
        let body = response.into_string().map_err(|source| CloneError::Body {
            url: self.url.clone(),
            source,
        })?;
        parse_projects(&body)
    }
}

/// Runs the actual clone and returns its exit code.
pub trait Cloner {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<i32, CloneError>;
}

pub struct GitCloner;

impl Cloner for GitCloner {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<i32, CloneError> {
        let status = Command::new("git")
            .arg("clone")
            .arg(url)
            .arg(dest)
            .status()
            .map_err(CloneError::Spawn)?;
        Ok(status.code().unwrap_or(1))
    }
}

/// What happens to one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Deleted,
    Skipped,
    Exists,
    Clone { url: String },
}

pub fn plan(
    repo: &str,
    project: &Project,
    skip: &GlobSet,
    config: &CloneConfig,
) -> Action {
    if project.is_deleted() {
        Action::Deleted
    } else if skip.is_match(repo) {
        Action::Skipped
    } else if config.destination.join(repo).join(".git").exists() {
        Action::Exists
    } else {
        Action::Clone {
            url: config.clone_url(repo),
        }
    }
}

/// Clone every repository not skipped or already present, writing progress
/// to `out`. Stops at the first failed clone and returns its exit code;
/// returns 0 when everything went through.
pub fn clone_all(
    source: &impl ProjectSource,
    cloner: &impl Cloner,
    config: &CloneConfig,
    out: &mut impl Write,
) -> Result<i32, CloneError> {
    let skip = config.skip_set()?;
    let projects = source.projects()?;
    tracing::info!(count = projects.len(), "projects listed");
    let total = Instant::now();

    for (repo, project) in &projects {
        writeln!(out, "{repo}")?;
        match plan(repo, project, &skip, config) {
            Action::Deleted => writeln!(out, " Don't use, skipped")?,
            Action::Skipped => writeln!(out, " Skipped")?,
            Action::Exists => writeln!(out, " There's already a repository at {repo}")?,
            Action::Clone { url } => {
                let started = Instant::now();
                let code = cloner.clone_repo(&url, &config.destination.join(repo))?;
                if code != 0 {
                    writeln!(out, " {repo} clone failed.")?;
                    return Ok(code);
                }
                writeln!(
                    out,
                    " {repo} cloned in {:.3} seconds.",
                    started.elapsed().as_secs_f64()
                )?;
            }
        }
    }

    writeln!(out, "Total time: {:.3} seconds", total.elapsed().as_secs_f64())?;
    Ok(0)
}
