use std::io::{self, Write};
use std::path::PathBuf;

use mwcu_analysis::{long_functions, Event};

/// Print the size of every class and named function in each file.
pub fn long_functions(files: &[PathBuf]) -> i32 {
    match run(files, &mut io::stdout().lock()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error writing output: {e}");
            1
        }
    }
}

fn run(files: &[PathBuf], out: &mut impl Write) -> io::Result<()> {
    for file in files {
        writeln!(out, "Trying file {}...", file.display())?;
        let events = match long_functions::analyze_file(file) {
            Ok(events) => events,
            Err(e) => {
                tracing::debug!("{e}");
                writeln!(out, "Could not open file {}", file.display())?;
                continue;
            }
        };
        for event in events {
            writeln!(out, "{event}")?;
            if matches!(event, Event::ClassEnd { .. }) {
                writeln!(out)?;
            }
        }
    }
    Ok(())
}
