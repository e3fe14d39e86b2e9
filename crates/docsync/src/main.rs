//! docsync - Keep analysis documents in sync with a Python codebase
//!
//! docsync inventories the top-level functions and classes of a Python
//! package, collects the anchors that analysis documents use to cite them
//! (`[file.py:10-20]` or `[file.py#name [L10-L20]]`) and reports reference
//! coverage, broken anchors and stale line ranges.

use clap::{Args as ClapArgs, Parser, Subcommand};
use docsync::config::{self, Overrides};
use docsync::output;
use docsync::pipeline::{Pipeline, RunOptions, Step};
use docsync_core::ScanOptions;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "docsync",
    version,
    about = "Check that analysis documents cite the code they describe"
)]
struct Cli {
    /// Repository root (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    repo: Option<PathBuf>,

    /// Path to config file (default: <repo>/.config/docsync/config.yaml)
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Raise the log level (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inventory top-level functions and classes
    ScanCode {
        #[command(flatten)]
        root: RootArg,

        #[command(flatten)]
        output: OutputArg,

        /// Keep `_`-prefixed names
        #[arg(long)]
        include_private: bool,

        /// Scan files below `tests` directories
        #[arg(long)]
        include_tests: bool,

        /// Inventory `__init__.py` files that only re-export
        #[arg(long)]
        keep_trivial_inits: bool,
    },

    /// Extract anchors from the tracked documents
    ScanDocs {
        #[command(flatten)]
        docs: DocsArg,

        #[command(flatten)]
        output: OutputArg,
    },

    /// Compute coverage and check it against the thresholds
    Coverage {
        #[command(flatten)]
        root: RootArg,

        #[command(flatten)]
        docs: DocsArg,

        #[command(flatten)]
        output: OutputArg,

        #[command(flatten)]
        gate: GateArgs,
    },

    /// Look for configuration problems behind low coverage
    ///
    /// NG verdicts are reported but do not change the exit status
    Probe {
        #[command(flatten)]
        output: OutputArg,
    },

    /// Run every step and write the summary
    Run {
        #[command(flatten)]
        root: RootArg,

        #[command(flatten)]
        docs: DocsArg,

        #[command(flatten)]
        output: OutputArg,

        #[command(flatten)]
        gate: GateArgs,

        /// Keep `_`-prefixed names in the inventory
        #[arg(long)]
        include_private: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct RootArg {
    /// Source root, relative to the repository
    #[arg(long, value_name = "DIR")]
    root: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct DocsArg {
    /// Documents to scan, relative to the repository
    #[arg(long, num_args = 1.., value_name = "PATH")]
    docs: Option<Vec<String>>,
}

#[derive(ClapArgs, Debug)]
struct OutputArg {
    /// Directory for reports (default: <repo>/reports)
    #[arg(long, short = 'o', value_name = "DIR")]
    output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct GateArgs {
    /// Treat threshold warnings as errors and probe NG verdicts as warnings
    #[arg(long)]
    strict: bool,

    /// Fail when the function reference rate is below this (0.0 - 1.0)
    #[arg(long, value_name = "RATE", value_parser = parse_rate)]
    fail_under: Option<f64>,
}

fn parse_rate(value: &str) -> Result<f64, String> {
    let rate: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(format!("must be between 0 and 1, got {rate}"));
    }
    Ok(rate)
}

struct Invocation {
    steps: Vec<Step>,
    overrides: Overrides,
    options: RunOptions,
}

impl Command {
    fn into_invocation(self) -> Invocation {
        match self {
            Command::ScanCode {
                root,
                output,
                include_private,
                include_tests,
                keep_trivial_inits,
            } => Invocation {
                steps: vec![Step::ScanCode],
                overrides: overrides(root.root, None, output.output),
                options: RunOptions {
                    scan: ScanOptions {
                        include_private,
                        include_tests,
                        skip_trivial_init: !keep_trivial_inits,
                    },
                    ..RunOptions::default()
                },
            },
            Command::ScanDocs { docs, output } => Invocation {
                steps: vec![Step::ScanDocs],
                overrides: overrides(None, docs.docs, output.output),
                options: RunOptions::default(),
            },
            Command::Coverage {
                root,
                docs,
                output,
                gate,
            } => Invocation {
                steps: vec![Step::ScanCode, Step::ScanDocs, Step::ComputeCoverage],
                overrides: overrides(root.root, docs.docs, output.output),
                options: RunOptions {
                    strict: gate.strict,
                    fail_under: gate.fail_under,
                    ..RunOptions::default()
                },
            },
            Command::Probe { output } => Invocation {
                steps: vec![
                    Step::ScanCode,
                    Step::ScanDocs,
                    Step::ComputeCoverage,
                    Step::ProbeRootCause,
                ],
                overrides: overrides(None, None, output.output),
                options: RunOptions::default(),
            },
            Command::Run {
                root,
                docs,
                output,
                gate,
                include_private,
            } => Invocation {
                steps: Step::ALL.to_vec(),
                overrides: overrides(root.root, docs.docs, output.output),
                options: RunOptions {
                    strict: gate.strict,
                    fail_under: gate.fail_under,
                    scan: ScanOptions {
                        // strict runs inventory private helpers too; coverage
                        // still counts public symbols only
                        include_private: include_private || gate.strict,
                        ..ScanOptions::default()
                    },
                },
            },
        }
    }
}

fn overrides(
    source_root: Option<String>,
    docs: Option<Vec<String>>,
    output_dir: Option<PathBuf>,
) -> Overrides {
    Overrides {
        source_root,
        docs,
        output_dir,
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "docsync=warn,docsync_core=warn",
        1 => "docsync=info,docsync_core=info",
        _ => "docsync=debug,docsync_core=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let repo_root = match cli.repo {
        Some(repo) => repo,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(err) => {
                eprintln!("{} Cannot determine current directory: {err}", "ERROR:".red().bold());
                return ExitCode::from(2);
            }
        },
    };

    let invocation = cli.command.into_invocation();
    let config = match config::load(&repo_root, cli.config.as_deref(), invocation.overrides) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {err:#}", "ERROR:".red().bold());
            return ExitCode::from(2);
        }
    };

    let summary = Pipeline::new(&config, invocation.options).run(&invocation.steps);
    output::print_report(&summary);
    ExitCode::from(summary.exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate_bounds() {
        assert_eq!(parse_rate("0"), Ok(0.0));
        assert_eq!(parse_rate("0.7"), Ok(0.7));
        assert_eq!(parse_rate("1"), Ok(1.0));
        assert!(parse_rate("5").is_err());
        assert!(parse_rate("-0.1").is_err());
        assert!(parse_rate("NaN").is_err());
        assert!(parse_rate("high").is_err());
    }
}
