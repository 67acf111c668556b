use std::path::{Path, PathBuf};
use std::sync::Once;

use clap::{Parser, Subcommand};
use mwcu_tools::survey::SurveyOptions;
use mwcu_tools::ToolsConfig;

mod commands;

#[derive(Parser)]
#[command(name = "mwcu")]
#[command(about = "MediaWiki code utilities: stylize, check and maintain PHP code")]
#[command(version)]
struct Cli {
    /// JSON settings file with `clone`, `wg_vars`, `trim` and `survey` sections
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log more (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fix whitespace in PHP and JS files to MediaWiki conventions
    Stylize {
        /// Files or directories; `-` or nothing reads stdin and writes stdout
        paths: Vec<PathBuf>,

        /// Glob of paths not to stylize, e.g. `**/*.i18n.php` (repeatable)
        #[arg(long, value_name = "GLOB")]
        ignore: Vec<String>,

        /// Keep the original of each modified file as `<file>~`
        #[arg(long)]
        backup: bool,
    },

    /// Find class references whose capitalization differs from the declaration
    CaseCheck {
        /// Tree with the class declarations
        declarations: PathBuf,
        /// Tree to scan for class references
        usages: PathBuf,
    },

    /// Print the line count of every function, method and class
    LongFunctions {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Check PHP files under a path for syntax errors
    Lint {
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Remove every key from a JSON file that its base file does not have
    #[command(name = "trim-i18n")]
    TrimI18n {
        base: PathBuf,
        target: PathBuf,

        /// Write the result on one line
        #[arg(long)]
        compact: bool,

        /// Indentation for pretty printing
        #[arg(long, value_name = "STRING")]
        indent: Option<String>,
    },

    /// Clone every active Gerrit repository
    #[command(name = "clone-all")]
    CloneAll {
        /// Clone URL prefix, e.g. `https://gerrit.wikimedia.org/r/p`
        #[arg(long)]
        base_url: Option<String>,

        /// Gerrit host to list projects from
        #[arg(long)]
        host: Option<String>,

        /// Directory to clone into
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// Write a CSV of extension or skin registration fields or hooks
    Survey {
        /// List of extensions or skins, or `-` for stdin
        input: PathBuf,
        /// CSV file to write, or `-` for stdout
        output: PathBuf,

        /// Look for skins instead of extensions
        #[arg(long)]
        skins: bool,

        /// List hook usage instead of registration fields
        #[arg(long)]
        hooks: bool,
    },

    /// List wmf-config `$wg` variables no deployed code reads
    #[command(name = "wg-vars")]
    WgVars {
        /// Output of `git grep "[$'\"]wg[A-Z]" '**.php'` in mediawiki-config
        #[arg(default_value = "wgvars.log")]
        log: PathBuf,

        /// Concurrent search requests
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

static TRACING_INIT: Once = Once::new();

fn init_tracing(verbose: u8) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let level = match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .init();
    });
}

fn load_config(path: Option<&Path>) -> ToolsConfig {
    let Some(path) = path else {
        return ToolsConfig::default();
    };
    match ToolsConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut config = load_config(cli.config.as_deref());

    let code = match cli.command {
        Command::Stylize {
            paths,
            ignore,
            backup,
        } => commands::stylize_paths(&paths, &ignore, backup),
        Command::CaseCheck {
            declarations,
            usages,
        } => commands::case_check(&declarations, &usages),
        Command::LongFunctions { files } => commands::long_functions(&files),
        Command::Lint { path } => commands::lint(&path),
        Command::TrimI18n {
            base,
            target,
            compact,
            indent,
        } => {
            if compact {
                config.trim.pretty = false;
            }
            if let Some(indent) = indent {
                config.trim.indent = indent;
            }
            commands::trim_i18n(&base, &target, &config.trim)
        }
        Command::CloneAll {
            base_url,
            host,
            dest,
        } => {
            if let Some(base_url) = base_url {
                config.clone.base_url = base_url;
            }
            if let Some(host) = host {
                config.clone.gerrit_host = host;
            }
            if let Some(dest) = dest {
                config.clone.destination = dest;
            }
            commands::clone_all(&config.clone)
        }
        Command::Survey {
            input,
            output,
            skins,
            hooks,
        } => commands::survey(&input, &output, SurveyOptions { hooks, skins }, &config.survey),
        Command::WgVars { log, batch_size } => {
            if let Some(batch_size) = batch_size {
                config.wg_vars.batch_size = batch_size;
            }
            commands::wg_vars(&log, &config.wg_vars)
        }
    };

    std::process::exit(code);
}
