use std::io::{self, Write};
use std::path::Path;

use mwcu_analysis::{AnalysisError, ClassMap};

/// Report references in `usages` to classes declared in `declarations`
/// whose capitalization differs.
pub fn case_check(declarations: &Path, usages: &Path) -> i32 {
    match run(declarations, usages, &mut io::stdout().lock()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CaseCheckError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn run(declarations: &Path, usages: &Path, out: &mut impl Write) -> Result<(), CaseCheckError> {
    writeln!(out, "Building class map...")?;
    let classes = ClassMap::build(declarations)?;
    writeln!(out, "Scanning for incorrectly capitalized class names...")?;
    for mismatch in classes.check_tree(usages)? {
        writeln!(out, "{mismatch}")?;
    }
    Ok(())
}
