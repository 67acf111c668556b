use std::io;

use mwcu_tools::clone::{self, CloneConfig, GerritProjects, GitCloner};

/// Clone all active repositories; exits with git's code on the first failure.
pub fn clone_all(config: &CloneConfig) -> i32 {
    let source = GerritProjects::new(config);
    match clone::clone_all(&source, &GitCloner, config, &mut io::stdout().lock()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}
