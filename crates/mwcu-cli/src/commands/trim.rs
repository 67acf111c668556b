use std::path::Path;

use mwcu_tools::trim::{self, TrimConfig};

/// Drop the keys of `target` that `base` lacks, rewriting `target`.
pub fn trim_i18n(base: &Path, target: &Path, config: &TrimConfig) -> i32 {
    match trim::run(base, target, config) {
        Ok(()) => {
            println!(
                "Updated {}, retaining all keys found in {}.",
                target.display(),
                base.display()
            );
            0
        }
        Err(e) => {
            eprintln!("{e}");
            1
        }
    }
}
