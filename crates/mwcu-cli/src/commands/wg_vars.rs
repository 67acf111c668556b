use std::fs;
use std::io::{self, Write};
use std::path::Path;

use mwcu_tools::wg_vars::{self, HoundBackend, WgVarsConfig};

/// Print a wikitable of config variables without references outside the
/// config repository. Exits 1 when any lookup failed, after printing the
/// table for the rest.
pub fn wg_vars(log: &Path, config: &WgVarsConfig) -> i32 {
    let text = match fs::read(log) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            eprintln!("Error reading {}: {e}", log.display());
            return 1;
        }
    };
    let variables = wg_vars::collect_variables(&text);
    let backend = HoundBackend::new(config);
    let mut stdout = io::stdout().lock();

    let report = match wg_vars::scan(variables, &backend, config, &mut stdout) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error writing output: {e}");
            return 1;
        }
    };
    if let Err(e) = stdout.write_all(wg_vars::render_table(&report.unused).as_bytes()) {
        eprintln!("Error writing output: {e}");
        return 1;
    }

    if report.failed.is_empty() {
        return 0;
    }
    eprintln!("Lookups failed for {} variable names:", report.failed.len());
    for (name, _) in &report.failed {
        eprintln!("  {name}");
    }
    1
}
