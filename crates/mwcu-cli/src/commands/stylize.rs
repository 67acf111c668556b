use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use mwcu_analysis::walk::{has_extension, source_files};

/// Stylize files and directory trees in place, or stdin to stdout when
/// `paths` is empty or `-`.
pub fn stylize_paths(paths: &[PathBuf], ignore: &[String], backup: bool) -> i32 {
    let ignore = match ignore_set(ignore) {
        Ok(set) => set,
        Err(e) => {
            eprintln!("Error: invalid --ignore pattern: {e}");
            return 1;
        }
    };

    if paths.is_empty() {
        return stylize_stdin();
    }

    let mut code = 0;
    for path in paths {
        if path.as_os_str() == "-" {
            code = code.max(stylize_stdin());
        } else if path.is_dir() {
            match stylizable_files(path, &ignore) {
                Ok(files) => {
                    for file in files {
                        code = code.max(report(&file, stylize_file(&file, backup)));
                    }
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    code = 1;
                }
            }
        } else {
            code = code.max(report(path, stylize_file(path, backup)));
        }
    }
    code
}

fn report(path: &Path, result: io::Result<bool>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            1
        }
    }
}

fn stylize_stdin() -> i32 {
    let mut source = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut source) {
        eprintln!("Error reading stdin: {e}");
        return 1;
    }
    let mut stdout = io::stdout().lock();
    match stdout.write_all(mwcu_stylize::stylize(&source).as_bytes()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error writing stdout: {e}");
            1
        }
    }
}

fn ignore_set(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}

/// PHP and JS files, minified JS excluded.
fn is_stylizable(path: &Path) -> bool {
    let minified = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".min.js"));
    has_extension(path, &["php", "php5", "js"]) && !minified
}

fn stylizable_files(
    root: &Path,
    ignore: &GlobSet,
) -> Result<Vec<PathBuf>, mwcu_analysis::AnalysisError> {
    source_files(root, false, |path| {
        if ignore.is_match(path) {
            tracing::info!("Ignoring {}", path.display());
            return false;
        }
        is_stylizable(path)
    })
}

/// Rewrite one file. Returns whether it changed; unchanged files are not
/// touched and get no backup.
fn stylize_file(path: &Path, backup: bool) -> io::Result<bool> {
    tracing::info!("Stylizing file {}", path.display());
    let source = fs::read_to_string(path)?;
    let styled = mwcu_stylize::stylize(&source);
    if styled == source {
        return Ok(false);
    }
    if backup {
        let mut backup_path = path.as_os_str().to_owned();
        backup_path.push("~");
        fs::rename(path, &backup_path)?;
    }
    fs::write(path, styled)?;
    Ok(true)
}
