use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use agecalc::config::DEFAULT_CONFIG_FILE;

mod commands;

/// Evaluation gate for the age calculator agent
///
/// Scores the agent's JUnit evaluation report against a curated ground-truth
/// dataset and turns the result into a pipeline decision.
///
/// QUICK START:
///
///   # Gate a deployment on refusal accuracy (default threshold 1.0)
///   agecalc-eval check --metric refusal_accuracy
///
///   # Gate tool selection with an explicit threshold
///   agecalc-eval check --metric tool_selection --threshold 0.95
///
///   # Verify the dataset and agent surface after editing cases
///   agecalc-eval validate
///
/// EXIT CODES:
///
///   0  gate passed, or report missing (gate assumed enforced upstream)
///   1  gate failed, bad arguments or config, corrupt dataset, bad report
#[derive(Parser)]
#[command(name = "agecalc-eval")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'agecalc-eval <command> --help' for more information on a specific command.")]
struct Cli {
    /// Configuration file (missing file means defaults)
    #[arg(long, global = true, env = "AGECALC_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a JUnit report for one metric and gate on its threshold
    ///
    /// Prints one status line. Exits 0 on PASS, 1 on FAIL. A missing
    /// report prints a warning and exits 0.
    Check(commands::CheckArgs),

    /// Run the dataset integrity checks and the capability surface audit
    ///
    /// Reports every violation at once. Exits 1 if any check fails.
    Validate(commands::ValidateArgs),

    /// List the ground-truth cases
    Dataset(commands::DatasetArgs),
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let _telemetry = agecalc::telemetry::init();

    let result = match cli.command {
        Commands::Check(ref args) => commands::check(&cli.config, args),
        Commands::Validate(ref args) => commands::validate(args),
        Commands::Dataset(ref args) => commands::dataset(args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
