//! `stackguard gate` - the full pipeline gate.
//!
//! Sync-and-wait, then assess, then correlate and score, with exit codes a
//! CI job can branch on: 0 clean, 1 no convergence, 2 severity gate tripped.

use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeSet;
use std::process::ExitCode;
use std::time::Duration;

use super::{account_ref, parse_min_severity, Context};
use crate::cli::args::GateArgs;
use crate::output::{print_convergence, print_failed_tests, write_result_file, OutputFormat};
use crate::resources::FileStackResourceProvider;
use stackguard::{
    severity_gate_tripped, ComplianceGate, EntityType, GateConfig, ResourceTypeMapper, RiskPolicy,
};

pub async fn execute(ctx: Context, args: GateArgs) -> Result<ExitCode> {
    if args.scope.account_number.is_none() {
        anyhow::bail!("gate polling requires --account-number");
    }
    let min_severity = args
        .min_severity
        .as_deref()
        .map(parse_min_severity)
        .transpose()?;

    let client = ctx.client()?;
    let account = account_ref(&args.scope)?;
    let mapper = ResourceTypeMapper::embedded()?;

    let mut config = GateConfig::new(args.bundle_id);
    config.region = args.scope.region.clone();
    config.excluded_types = args
        .excluded_types
        .iter()
        .map(|t| EntityType::from(t.as_str()))
        .collect::<BTreeSet<_>>();
    config.max_sync_wait = Duration::from_secs(args.max_timeout_minutes * 60);
    config.assess_on_timeout = args.assess_on_timeout;
    config.risk_policy = if args.flat_risk {
        RiskPolicy::FlatOnAnyFailure
    } else {
        RiskPolicy::SeverityTiered
    };

    let gate = ComplianceGate::new(&client, &mapper, config);

    let report = match (&args.scope.stack_name, &args.scope.resources_file) {
        (Some(stack_name), Some(file)) => {
            let provider = FileStackResourceProvider::load(file)?;
            provider.verify_account(args.scope.account_number.as_deref())?;
            gate.run_stack_scoped(&account, stack_name, &provider).await?
        }
        _ => gate.run_account(&account).await?,
    };

    match ctx.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Pretty => {
            print_convergence(&report.convergence);
            if !report.unsupported_types.is_empty() {
                println!(
                    "\n{} {} stack resource types have no compliance coverage",
                    "Note:".bold(),
                    report.unsupported_types.len()
                );
            }
            if report.assessment_ran {
                print_failed_tests(&report.failed_tests);
                println!("\n{} {}", "Risk:".bold(), report.risk);
            }
        }
    }

    if let Some(path) = &args.result_file {
        write_result_file(path, &report.failed_tests)?;
        println!("Result written to {}", path.display());
    }

    if !report.convergence.is_converged() && !report.assessment_ran {
        eprintln!(
            "{} inventory did not converge ({})",
            "Gate failed:".red().bold(),
            report.convergence.outcome
        );
        return Ok(ExitCode::from(1));
    }

    if let Some(minimum) = min_severity {
        if severity_gate_tripped(&report.failed_tests, minimum) {
            eprintln!(
                "{} failed rules at or above {minimum} severity",
                "Gate tripped:".red().bold()
            );
            return Ok(ExitCode::from(2));
        }
    }

    Ok(ExitCode::SUCCESS)
}
