//! Subcommand handlers for the `agecalc-eval` binary.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use agecalc::agent::{RegisteredTools, SYSTEM_PROMPT};
use agecalc::check::run_check;
use agecalc::config::EvalConfig;
use agecalc::error::EvalError;
use agecalc::eval::case::{Case, Category};
use agecalc::eval::gate::Threshold;
use agecalc::eval::ground_truth::{Dataset, GROUND_TRUTH};
use agecalc::eval::integrity::{self, IntegrityReport};
use agecalc::eval::metric::{Metric, MetricKind};
use agecalc::eval::surface::{SurfaceViolation, audit_registry, audit_system_prompt};
use agecalc::format::OutputFormat;

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Metric to gate on: tool_selection or refusal_accuracy
    #[arg(long)]
    pub metric: MetricKind,

    /// Required pass rate in [0.0, 1.0] (default: configured value for the metric)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// JUnit XML report (default: [report] path from config)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

pub fn check(config_path: &Path, args: &CheckArgs) -> Result<ExitCode> {
    // Validated before anything is read from disk.
    let cli_threshold = args
        .threshold
        .map(Threshold::new)
        .transpose()
        .map_err(EvalError::from)?;
    let config = EvalConfig::load(config_path).map_err(EvalError::from)?;
    let metric = Metric {
        kind: args.metric,
        threshold: cli_threshold.unwrap_or_else(|| config.thresholds.for_metric(args.metric)),
    };
    let report = args.report.clone().unwrap_or(config.report.path);

    let outcome = run_check(metric, &report)?;
    match args.format {
        OutputFormat::Text => println!("{}", outcome.render_text()),
        OutputFormat::Json => println!("{}", args.format.serialize(&outcome)?),
    }
    Ok(outcome.decision().exit_code())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Output format: text or json
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct Validation<'a> {
    clean: bool,
    cases: usize,
    integrity: &'a IntegrityReport,
    surface: &'a [SurfaceViolation],
}

pub fn validate(args: &ValidateArgs) -> Result<ExitCode> {
    let report = integrity::check(GROUND_TRUTH);
    let mut surface = audit_registry(&RegisteredTools);
    surface.extend(audit_system_prompt(SYSTEM_PROMPT));
    let clean = report.is_clean() && surface.is_empty();

    match args.format {
        OutputFormat::Text => {
            println!("{report}");
            if surface.is_empty() {
                println!("capability surface: ok");
            } else {
                println!("capability surface: {} violation(s)", surface.len());
                for v in &surface {
                    println!("- {v}");
                }
            }
        }
        OutputFormat::Json => {
            let out = Validation {
                clean,
                cases: GROUND_TRUTH.len(),
                integrity: &report,
                surface: &surface,
            };
            println!("{}", args.format.serialize(&out)?);
        }
    }

    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// ---------------------------------------------------------------------------
// dataset
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct DatasetArgs {
    /// Only list cases in this category
    #[arg(long)]
    pub category: Option<Category>,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

pub fn dataset(args: &DatasetArgs) -> Result<ExitCode> {
    let dataset = Dataset::ground_truth().map_err(EvalError::from)?;
    let cases: Vec<&Case> = dataset
        .cases()
        .iter()
        .filter(|c| args.category.is_none_or(|cat| c.category() == cat))
        .collect();

    match args.format {
        OutputFormat::Text => {
            for case in &cases {
                let expect = if case.should_refuse() {
                    "refuse".to_owned()
                } else {
                    case.expected_tool()
                        .map_or_else(|| "respond".to_owned(), |t| t.to_string())
                };
                println!(
                    "{:<8} {:<13} {:<23} {}",
                    case.id().as_str(),
                    case.category().as_str(),
                    expect,
                    case.user_input().trim()
                );
            }
            println!("{} case(s)", cases.len());
        }
        OutputFormat::Json => println!("{}", args.format.serialize(&cases)?),
    }
    Ok(ExitCode::SUCCESS)
}
