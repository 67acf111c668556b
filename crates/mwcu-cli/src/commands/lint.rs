use std::io::{self, Write};
use std::path::Path;

use mwcu_analysis::lint;

/// Check every PHP file under `path`. Exits 1 when any file has an error.
pub fn lint(path: &Path) -> i32 {
    match run(path, &mut io::stdout().lock()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error writing output: {e}");
            1
        }
    }
}

fn run(path: &Path, out: &mut impl Write) -> io::Result<i32> {
    if !path.exists() {
        writeln!(out, "Path not found: {}", path.display())?;
        return Ok(1);
    }
    let files = match lint::files(path) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(1);
        }
    };

    let mut failed = false;
    for file in &files {
        match lint::check_file(file) {
            Ok(None) => {}
            Ok(Some(problem)) => {
                writeln!(
                    out,
                    "Error in {} line {}: {}",
                    file.display(),
                    problem.line,
                    problem.message
                )?;
                failed = true;
            }
            Err(e) => {
                eprintln!("Error: {e}");
                failed = true;
            }
        }
    }
    tracing::info!(files = files.len(), failed, "lint finished");
    Ok(i32::from(failed))
}
