//! Find `$wg` configuration variables in wmf-config that no deployed code
//! reads.
//!
//! The input is a grep log of the config repository:
//!
//! ```text
//! git grep "[$'\"]wg[A-Z]" '**.php' > wgvars.log
//! ```
//!
//! Every variable name found in it is looked up in the code search backend.
//! Names whose only hits are in the config repository itself are reported.

use std::collections::BTreeMap;
use std::io::Write;
use std::thread;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WgVarsConfig {
    pub endpoint: String,
    /// Requests in flight at once.
    pub batch_size: usize,
    pub timeout_secs: u64,
    /// Extra attempts after a failed request.
    pub retries: u32,
    /// Delay before the first retry; doubles after each attempt.
    pub backoff_ms: u64,
    pub user_agent: String,
    /// Hits in this repository do not count as uses.
    pub self_repo: String,
}

impl Default for WgVarsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://codesearch-backend.wmcloud.org/deployed/api/v1/search".to_string(),
            batch_size: 15,
            timeout_secs: 30,
            retries: 3,
            backoff_ms: 500,
            user_agent: "wmf-config-wg-vars Bot; <https://gerrit.wikimedia.org/g/mediawiki/tools/code-utils>"
                .to_string(),
            self_repo: "operations/mediawiki-config".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search for {name} failed: {source}")]
    Http {
        name: String,
        source: Box<ureq::Error>,
    },
    #[error("could not read search results for {name}: {source}")]
    Body {
        name: String,
        source: std::io::Error,
    },
    #[error("invalid search results for {name}: {source}")]
    Decode {
        name: String,
        source: serde_json::Error,
    },
}

// =============================================================================
// Log parsing
// =============================================================================

/// The config file a log line belongs to, relative to `wmf-config/`.
pub fn file_name(line: &str) -> &str {
    let path = line.split(':').next().unwrap_or(line);
    let path = strip_through(path, "mediawiki-config/");
    strip_through(path, "wmf-config/")
}

fn strip_through<'a>(path: &'a str, marker: &str) -> &'a str {
    match path.rfind(marker) {
        Some(at) => &path[at + marker.len()..],
        None => path,
    }
}

/// Names of `$wgFoo`, `'wgFoo'` and `"wgFoo"` references, without the
/// `wg` prefix.
pub fn variable_names(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut names = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if matches!(bytes[i], b'$' | b'\'' | b'"') && bytes[i + 1..].starts_with(b"wg") {
            let start = i + 3;
            let end = start
                + bytes[start..]
                    .iter()
                    .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'_')
                    .count();
            if end > start {
                names.push(&line[start..end]);
                i = end;
                continue;
            }
        }
        i += 1;
    }
    names
}

/// Variable names mapped to the files that mention them, each file listed
/// once in order of first appearance. Test files and non-PHP files are
/// skipped.
pub fn collect_variables(log: &str) -> BTreeMap<String, Vec<String>> {
    let mut variables: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for line in log.lines() {
        let file = file_name(line);
        if !file.ends_with(".php") || file.starts_with("tests/") {
            continue;
        }
        for name in variable_names(line) {
            let files = variables.entry(name.to_string()).or_default();
            if !files.iter().any(|f| f == file) {
                files.push(file.to_string());
            }
        }
    }
    variables
}

// =============================================================================
// Search
// =============================================================================

/// Code search across all deployed repositories.
pub trait SearchBackend: Sync {
    /// Names of the repositories with at least one hit for `name`.
    fn search(&self, name: &str) -> Result<Vec<String>, SearchError>;
}

/// A Hound instance, as run by codesearch.
pub struct HoundBackend {
    endpoint: String,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
struct HoundResponse {
    #[serde(rename = "Results")]
    results: BTreeMap<String, serde_json::Value>,
}

impl HoundBackend {
    pub fn new(config: &WgVarsConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build();
        Self {
            endpoint: config.endpoint.clone(),
            agent,
        }
    }
}

impl SearchBackend for HoundBackend {
    fn search(&self, name: &str) -> Result<Vec<String>, SearchError> {
        let query = format!("('|\"|wg){name}\\b");
        let response = self
            .agent
            .get(&self.endpoint)
            .query("repos", "*")
            .query("rng", ":20")
            .query("q", &query)
            .query("files", "")
            .query("excludeFiles", "HISTORY")
            .query("i", "nope")
            .call()
            .map_err(|source| SearchError::Http {
                name: name.to_string(),
                source: Box::new(source),
            })?;
        let body = response.into_string().map_err(|source| SearchError::Body {
            name: name.to_string(),
            source,
        })?;
        parse_results(name, &body)
    }
}

/// Repositories with hits in a Hound search response. A response without
/// `Results` is an error, not an empty result.
fn parse_results(name: &str, body: &str) -> Result<Vec<String>, SearchError> {
    let data: HoundResponse = serde_json::from_str(body).map_err(|source| SearchError::Decode {
        name: name.to_string(),
        source,
    })?;
    Ok(data.results.into_keys().collect())
}

/// Search, retrying failures with exponential backoff.
pub fn search_with_retry(
    backend: &dyn SearchBackend,
    name: &str,
    config: &WgVarsConfig,
) -> Result<Vec<String>, SearchError> {
    let mut delay = Duration::from_millis(config.backoff_ms);
    let mut attempt = 0;
    loop {
        match backend.search(name) {
            Ok(repos) => return Ok(repos),
            Err(err) if attempt < config.retries => {
                attempt += 1;
                tracing::debug!(%name, attempt, "retrying after error: {err}");
                thread::sleep(delay);
                delay *= 2;
            }
            Err(err) => return Err(err),
        }
    }
}

// =============================================================================
// Scan
// =============================================================================

#[derive(Debug, Default)]
pub struct ScanReport {
    /// Unused names with their files.
    pub unused: BTreeMap<String, Vec<String>>,
    /// Names whose lookup never succeeded; their status is unknown.
    pub failed: Vec<(String, SearchError)>,
}

/// Look up every variable in sorted order, `batch_size` requests at a time,
/// writing progress lines to `out`.
pub fn scan(
    variables: BTreeMap<String, Vec<String>>,
    backend: &dyn SearchBackend,
    config: &WgVarsConfig,
    out: &mut impl Write,
) -> std::io::Result<ScanReport> {
    writeln!(out, "Searching for {} unique variable names...", variables.len())?;
    let names: Vec<&String> = variables.keys().collect();
    let mut results = Vec::with_capacity(names.len());

    for batch in names.chunks(config.batch_size.max(1)) {
        for name in batch {
            writeln!(out, "... fetching results for {name}")?;
        }
        let batch_results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = batch
                .iter()
                .map(|name| s.spawn(move || search_with_retry(backend, name, config)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });
        results.extend(batch.iter().map(|name| name.to_string()).zip(batch_results));
    }

    let mut report = ScanReport::default();
    let mut variables = variables;
    for (name, result) in results {
        match result {
            Ok(repos) => {
                if repos.iter().all(|repo| *repo == config.self_repo) {
                    if let Some(files) = variables.remove(&name) {
                        report.unused.insert(name, files);
                    }
                }
            }
            Err(err) => {
                tracing::warn!("{err}");
                report.failed.push((name, err));
            }
        }
    }
    Ok(report)
}

/// Unused variables as a sortable wikitable for the tech debt page.
pub fn render_table(unused: &BTreeMap<String, Vec<String>>) -> String {
    let mut table = String::from("{| class=\"wikitable sortable\"\n! Param !! Filename !! Component !! Status\n");
    for (name, files) in unused {
        table.push_str("|-\n");
        table.push_str(&format!("|<code>{name}</code>\n"));
        table.push_str(&format!("|<code>{}</code>\n", files.join("</code><br><code>")));
        table.push_str("|\n|\n");
    }
    table.push_str("|}\n");
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned results; names not listed fail a fixed number of times first.
    struct FakeBackend {
        hits: HashMap<&'static str, Vec<&'static str>>,
        failures: Mutex<HashMap<String, u32>>,
        fail_times: u32,
    }

    impl FakeBackend {
        fn new(hits: &[(&'static str, &[&'static str])], fail_times: u32) -> Self {
            Self {
                hits: hits.iter().map(|(k, v)| (*k, v.to_vec())).collect(),
                failures: Mutex::new(HashMap::new()),
                fail_times,
            }
        }
    }

    impl SearchBackend for FakeBackend {
        fn search(&self, name: &str) -> Result<Vec<String>, SearchError> {
            if let Some(repos) = self.hits.get(name) {
                return Ok(repos.iter().map(|r| r.to_string()).collect());
            }
            let mut failures = self.failures.lock().unwrap();
            let count = failures.entry(name.to_string()).or_insert(0);
            *count += 1;
            if *count <= self.fail_times {
                let source = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
                return Err(SearchError::Decode {
                    name: name.to_string(),
                    source,
                });
            }
            Ok(Vec::new())
        }
    }

    fn config() -> WgVarsConfig {
        WgVarsConfig {
            batch_size: 2,
            retries: 1,
            backoff_ms: 0,
            ..WgVarsConfig::default()
        }
    }

    // =========================================================================
    // Log parsing
    // =========================================================================

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name("/home/me/mediawiki-config/wmf-config/CommonSettings.php:12:$wgFoo = 1;"),
            "CommonSettings.php"
        );
        assert_eq!(file_name("wmf-config/tests/FooTest.php:3:x"), "tests/FooTest.php");
        assert_eq!(file_name("docroot/x.php:1:y"), "docroot/x.php");
    }

    #[test]
    fn test_variable_names() {
        assert_eq!(
            variable_names(r#"$wgFoo = $wgBar_2 + $conf['wgBaz'] . "wgQux" . wgNope . $wg;"#),
            vec!["Foo", "Bar_2", "Baz", "Qux"]
        );
        assert_eq!(variable_names("$w"), Vec::<&str>::new());
    }

    #[test]
    fn test_collect_variables() {
        let log = "\
wmf-config/CommonSettings.php:1:$wgFoo = $wgBar;
wmf-config/InitialiseSettings.php:2:'wgFoo' => [],
wmf-config/CommonSettings.php:3:$wgFoo[] = 1;
wmf-config/tests/SettingsTest.php:4:$wgTestOnly = 1;
docroot/index.html:5:$wgHtml
";
        let variables = collect_variables(log);
        let expected: BTreeMap<String, Vec<String>> = [
            ("Bar", vec!["CommonSettings.php"]),
            ("Foo", vec!["CommonSettings.php", "InitialiseSettings.php"]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
        .collect();
        assert_eq!(variables, expected);
    }

    // =========================================================================
    // Responses
    // =========================================================================

    #[test]
    fn test_parse_results() {
        let body = r#"{"Results":{"mediawiki/core":{"Matches":[]},"operations/mediawiki-config":{}},"Stats":{}}"#;
        assert_eq!(
            parse_results("Foo", body).unwrap(),
            vec!["mediawiki/core", "operations/mediawiki-config"]
        );
        assert_eq!(parse_results("Foo", r#"{"Results":{}}"#).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_missing_results_is_error() {
        let err = parse_results("Foo", r#"{"Error":"rate limited"}"#).unwrap_err();
        assert!(matches!(err, SearchError::Decode { .. }));
    }

    // =========================================================================
    // Retry
    // =========================================================================

    #[test]
    fn test_retry_recovers() {
        let backend = FakeBackend::new(&[], 1);
        assert_eq!(search_with_retry(&backend, "Flaky", &config()).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_retry_gives_up() {
        let backend = FakeBackend::new(&[], 5);
        let err = search_with_retry(&backend, "Down", &config()).unwrap_err();
        assert!(err.to_string().starts_with("invalid search results for Down"));
        assert_eq!(backend.failures.lock().unwrap()["Down"], 2);
    }

    // =========================================================================
    // Scan
    // =========================================================================

    #[test]
    fn test_scan_reports_unused_and_failed() {
        let backend = FakeBackend::new(
            &[
                ("Used", &["mediawiki/core", "operations/mediawiki-config"]),
                ("SelfOnly", &["operations/mediawiki-config"]),
                ("Nowhere", &[]),
            ],
            9,
        );
        let variables: BTreeMap<String, Vec<String>> = ["Used", "SelfOnly", "Nowhere", "Broken"]
            .into_iter()
            .map(|n| (n.to_string(), vec![format!("{n}.php")]))
            .collect();
        let mut out = Vec::new();

        let report = scan(variables, &backend, &config(), &mut out).unwrap();

        assert_eq!(
            report.unused.keys().collect::<Vec<_>>(),
            vec!["Nowhere", "SelfOnly"]
        );
        assert_eq!(report.unused["SelfOnly"], vec!["SelfOnly.php"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "Broken");
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Searching for 4 unique variable names...\n\
             ... fetching results for Broken\n\
             ... fetching results for Nowhere\n\
             ... fetching results for SelfOnly\n\
             ... fetching results for Used\n"
        );
    }

    #[test]
    fn test_render_table() {
        let unused: BTreeMap<String, Vec<String>> = [(
            "Foo".to_string(),
            vec!["a.php".to_string(), "b.php".to_string()],
        )]
        .into_iter()
        .collect();
        assert_eq!(
            render_table(&unused),
            "{| class=\"wikitable sortable\"\n\
             ! Param !! Filename !! Component !! Status\n\
             |-\n\
             |<code>Foo</code>\n\
             |<code>a.php</code><br><code>b.php</code>\n\
             |\n\
             |\n\
             |}\n"
        );
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(
            render_table(&BTreeMap::new()),
            "{| class=\"wikitable sortable\"\n! Param !! Filename !! Component !! Status\n|}\n"
        );
    }
}
