//! Survey the registration files of MediaWiki extensions and skins.
//!
//! Reads a list of components, fetches each one's `extension.json` or
//! `skin.json` from the GitHub mirror and writes a CSV of either every
//! top-level registration field or every registered hook.
//!
//! List lines may be `wfLoadExtension` style paths, prefixed names or bare
//! names; `#` starts a comment line:
//!
//! ```text
//! $IP/extensions/Cite/extension.json
//! skin:Vector
//! ParserFunctions
//! ```

use std::fmt;
use std::io::Write;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Owner URL on the raw GitHub host; repositories are
    /// `mediawiki-extensions-<Name>` and `mediawiki-skins-<Name>`.
    pub base_url: String,
    pub branch: String,
    pub timeout_secs: u64,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://raw.githubusercontent.com/wikimedia".to_string(),
            branch: "master".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SurveyConfig {
    pub fn registry_url(&self, component: &Component) -> String {
        let prefix = component.kind.prefix();
        format!(
            "{}/mediawiki-{prefix}s-{}/{}/{prefix}.json",
            self.base_url.trim_end_matches('/'),
            component.name,
            self.branch
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    #[error("could not fetch {url}: {source}")]
    Http {
        url: String,
        source: Box<ureq::Error>,
    },
    #[error("could not read {url}: {source}")]
    Body { url: String, source: std::io::Error },
    #[error("invalid JSON in {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
    #[error("invalid JSON in {url}: not an object")]
    NotObject { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Extension,
    Skin,
}

impl ComponentKind {
    fn prefix(self) -> &'static str {
        match self {
            ComponentKind::Extension => "extension",
            ComponentKind::Skin => "skin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub kind: ComponentKind,
    pub name: String,
}

impl Component {
    fn new(kind: ComponentKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.prefix(), self.name)
    }
}

/// Which CSV the survey produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurveyOptions {
    pub hooks: bool,
    /// Bare names are skins, and extension entries are dropped.
    pub skins: bool,
}

// =============================================================================
// Component list
// =============================================================================

/// The component named by one list line, if any.
pub fn parse_line(line: &str, skins: bool) -> Option<Component> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    if let Some(name) = path_component(line, "$IP/extensions/", "/extension.json") {
        return (!skins).then(|| Component::new(ComponentKind::Extension, name));
    }
    if let Some(name) = path_component(line, "$IP/skins/", "/skin.json") {
        return Some(Component::new(ComponentKind::Skin, name));
    }

    let parts: Vec<&str> = line.split(':').collect();
    match parts.as_slice() {
        ["extension", name] => (!skins).then(|| Component::new(ComponentKind::Extension, name)),
        ["skin", name] => Some(Component::new(ComponentKind::Skin, name)),
        _ if skins => Some(Component::new(ComponentKind::Skin, line)),
        _ => Some(Component::new(ComponentKind::Extension, line)),
    }
}

pub fn parse_list(text: &str, skins: bool) -> Vec<Component> {
    text.lines().filter_map(|line| parse_line(line, skins)).collect()
}

/// The directory name in `<prefix><Name><suffix>` anywhere in `line`.
fn path_component<'a>(line: &'a str, prefix: &str, suffix: &str) -> Option<&'a str> {
    line.match_indices(prefix).find_map(|(at, _)| {
        let rest = &line[at + prefix.len()..];
        let end = rest.find('/')?;
        (end > 0 && rest[end..].starts_with(suffix)).then(|| &rest[..end])
    })
}

// =============================================================================
// Registry
// =============================================================================

/// Where registration files come from.
pub trait RegistrySource {
    fn fetch(&self, component: &Component) -> Result<Map<String, Value>, SurveyError>;
}

pub struct GitHubRegistry {
    config: SurveyConfig,
    agent: ureq::Agent,
}

impl GitHubRegistry {
    pub fn new(config: &SurveyConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            config: config.clone(),
            agent,
        }
    }
}

impl RegistrySource for GitHubRegistry {
    fn fetch(&self, component: &Component) -> Result<Map<String, Value>, SurveyError> {
        let url = self.config.registry_url(component);
        let response = self.agent.get(&url).call().map_err(|source| SurveyError::Http {
            url: url.clone(),
            source: Box::new(source),
        })?;
        let body = response.into_string().map_err(|source| SurveyError::Body {
            url: url.clone(),
            source,
        })?;
        match serde_json::from_str(&body) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(SurveyError::NotObject { url }),
            Err(source) => Err(SurveyError::Decode { url, source }),
        }
    }
}

// =============================================================================
// Rows
// =============================================================================

/// `(component name, field)` pairs for one registration file, in file
/// order. With `hooks`, the fields are the keys of its `Hooks` map.
pub fn rows(registration: &Map<String, Value>, hooks: bool) -> Vec<(String, String)> {
    let name = match registration.get("name") {
        Some(Value::String(name)) => name.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    let fields: Vec<String> = if hooks {
        match registration.get("Hooks") {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            Some(Value::Array(list)) => list
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    } else {
        registration.keys().cloned().collect()
    };
    fields.into_iter().map(|field| (name.clone(), field)).collect()
}

/// One CSV record, quoting fields that need it, CRLF terminated.
pub fn write_record(out: &mut impl Write, fields: &[&str]) -> std::io::Result<()> {
    let line: Vec<String> = fields
        .iter()
        .map(|field| {
            if field.contains(|c: char| matches!(c, ',' | '"' | '\r' | '\n')) {
                format!("\"{}\"", field.replace('"', "\"\""))
            } else {
                field.to_string()
            }
        })
        .collect();
    write!(out, "{}\r\n", line.join(","))
}

// =============================================================================
// Survey
// =============================================================================

#[derive(Debug, Default)]
pub struct SurveyReport {
    pub rows: usize,
    /// Components whose registration file could not be fetched; they have
    /// no rows.
    pub failed: Vec<(Component, SurveyError)>,
}

/// Fetch every component in turn and write the CSV to `out`. A component
/// that fails to load is recorded and skipped. Progress lines go to
/// `progress` when given.
pub fn survey(
    components: &[Component],
    source: &dyn RegistrySource,
    options: SurveyOptions,
    out: &mut impl Write,
    mut progress: Option<&mut dyn Write>,
) -> std::io::Result<SurveyReport> {
    let header = if options.hooks {
        ["Extension Name", "Hook Name"]
    } else {
        ["Extension Name", "Registration Field"]
    };
    write_record(out, &header)?;

    let mut report = SurveyReport::default();
    for component in components {
        if let Some(progress) = progress.as_deref_mut() {
            writeln!(progress, "Fetching {}.json for {component}", component.kind.prefix())?;
        }
        let registration = match source.fetch(component) {
            Ok(registration) => registration,
            Err(err) => {
                tracing::warn!("{err}");
                report.failed.push((component.clone(), err));
                continue;
            }
        };
        for (name, field) in rows(&registration, options.hooks) {
            write_record(out, &[name.as_str(), field.as_str()])?;
            report.rows += 1;
        }
    }
    Ok(report)
}
