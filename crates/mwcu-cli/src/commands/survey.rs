use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use mwcu_tools::survey::{self, GitHubRegistry, RegistrySource, SurveyConfig, SurveyOptions};

/// Survey the components listed in `input`, writing CSV to `output`.
/// Either may be `-` for stdin or stdout. Components that cannot be fetched
/// are reported on stderr and left out.
pub fn survey(input: &Path, output: &Path, options: SurveyOptions, config: &SurveyConfig) -> i32 {
    let registry = GitHubRegistry::new(config);
    match run(input, output, options, &registry) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_list(input: &Path) -> io::Result<String> {
    if is_stdio(input) {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        fs::read_to_string(input)
    }
}

fn run(
    input: &Path,
    output: &Path,
    options: SurveyOptions,
    registry: &dyn RegistrySource,
) -> io::Result<()> {
    let list = read_list(input)?;
    let components = survey::parse_list(&list, options.skins);
    tracing::info!(count = components.len(), "surveying components");

    let report = if is_stdio(output) {
        let mut out = io::stdout().lock();
        survey::survey(&components, registry, options, &mut out, None)?
    } else {
        let mut out = BufWriter::new(File::create(output)?);
        let mut progress = io::stdout().lock();
        let progress: &mut dyn Write = &mut progress;
        let report = survey::survey(&components, registry, options, &mut out, Some(progress))?;
        out.flush()?;
        report
    };

    for (component, err) in &report.failed {
        eprintln!("Skipped {component}: {err}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mwcu_tools::survey::{Component, SurveyError};
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value};

    struct OneHook;

    impl RegistrySource for OneHook {
        fn fetch(&self, component: &Component) -> Result<Map<String, Value>, SurveyError> {
            if component.name == "Gone" {
                return Err(SurveyError::NotObject {
                    url: SurveyConfig::default().registry_url(component),
                });
            }
            let mut hooks = Map::new();
            hooks.insert("BeforePageDisplay".to_string(), Value::from("main"));
            let mut registration = Map::new();
            registration.insert("name".to_string(), Value::from(component.name.clone()));
            registration.insert("Hooks".to_string(), Value::Object(hooks));
            Ok(registration)
        }
    }

    #[test]
    fn test_writes_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("extensions.txt");
        let output = dir.path().join("hooks.csv");
        fs::write(&input, "# deployed\nCite\nGone\nskin:Vector\n").unwrap();

        let options = SurveyOptions {
            hooks: true,
            skins: false,
        };
        run(&input, &output, options, &OneHook).unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "Extension Name,Hook Name\r\n\
             Cite,BeforePageDisplay\r\n\
             Vector,BeforePageDisplay\r\n"
        );
    }

    #[test]
    fn test_missing_list() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let err = run(
            &dir.path().join("nope.txt"),
            &output,
            SurveyOptions::default(),
            &OneHook,
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!output.exists());
    }
}
