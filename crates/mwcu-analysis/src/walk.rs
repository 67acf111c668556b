use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::AnalysisError;

/// Collect the files under `root` accepted by `wanted`, sorted by path.
///
/// Ignore files are not consulted: every file in the tree is a candidate.
/// With `skip_hidden`, entries whose name starts with a dot are skipped
/// together with everything below them. A `root` that is itself a file is
/// returned unfiltered.
pub fn source_files(
    root: &Path,
    skip_hidden: bool,
    wanted: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>, AnalysisError> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .hidden(skip_hidden)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut files = Vec::new();
    for result in builder.build() {
        let entry = result.map_err(|source| AnalysisError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if wanted(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Whether the file name ends in one of `extensions` (given without dot).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}
