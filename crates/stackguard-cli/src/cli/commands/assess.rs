//! `stackguard assess` - execute a rule bundle and correlate failures.

use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;

use super::{account_ref, parse_min_severity, Context};
use crate::cli::args::AssessArgs;
use crate::output::{print_failed_tests, write_result_file, OutputFormat};
use crate::resources::FileStackResourceProvider;
use stackguard::{
    analyze, severity_gate_tripped, AssessmentRunner, ResourceTypeMapper, RiskPolicy,
    StackResourceInventory, StackResourceProvider,
};

pub async fn execute(ctx: Context, args: AssessArgs) -> Result<ExitCode> {
    let min_severity = args
        .min_severity
        .as_deref()
        .map(parse_min_severity)
        .transpose()?;

    let client = ctx.client()?;
    let account = account_ref(&args.scope)?;

    let runner = AssessmentRunner::new(&client);
    let result = runner
        .run(args.bundle_id, &account, args.scope.region.as_deref())
        .await?;

    // Stack-scoped runs correlate failures back to the stack's physical ids
    let inventory = match (&args.scope.stack_name, &args.scope.resources_file) {
        (Some(stack_name), Some(file)) => {
            let mapper = ResourceTypeMapper::embedded()?;
            let provider = FileStackResourceProvider::load(file)?;
            provider.verify_account(args.scope.account_number.as_deref())?;
            let resources = provider.list_physical_resources(stack_name).await?;
            Some(StackResourceInventory::from_resources(&mapper, stack_name.clone(), &resources))
        }
        _ => None,
    };

    let failed_tests = analyze(&result, inventory.as_ref());
    let policy = if args.flat_risk {
        RiskPolicy::FlatOnAnyFailure
    } else {
        RiskPolicy::SeverityTiered
    };
    let risk = policy.score(&failed_tests);

    match ctx.output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "bundle": result.request.name,
                    "failed_tests": failed_tests,
                    "risk": risk,
                }))?
            );
        }
        OutputFormat::Pretty => {
            println!(
                "{} {}",
                "Bundle:".bold(),
                result.request.name.as_deref().unwrap_or("?")
            );
            print_failed_tests(&failed_tests);
            println!("\n{} {}", "Risk:".bold(), risk);
        }
    }

    if let Some(path) = &args.result_file {
        write_result_file(path, &failed_tests)?;
        println!("Result written to {}", path.display());
    }

    if let Some(minimum) = min_severity {
        if severity_gate_tripped(&failed_tests, minimum) {
            eprintln!(
                "{} failed rules at or above {minimum} severity",
                "Gate tripped:".red().bold()
            );
            return Ok(ExitCode::from(2));
        }
    }

    Ok(ExitCode::SUCCESS)
}
