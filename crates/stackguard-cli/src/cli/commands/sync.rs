//! `stackguard sync` - force an inventory refresh and wait for convergence.

use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeSet;
use std::process::ExitCode;
use std::time::Duration;

use super::{account_ref, Context};
use crate::cli::args::SyncArgs;
use crate::output::{print_convergence, print_list, OutputFormat};
use crate::resources::FileStackResourceProvider;
use stackguard::{
    AccountSyncBackend, EntityType, PollConfig, ResourceTypeMapper, StackResourceProvider,
    SyncPoller, DEFAULT_POLL_INTERVAL,
};

pub async fn execute(ctx: Context, args: SyncArgs) -> Result<ExitCode> {
    if args.scope.account_number.is_none() {
        anyhow::bail!("sync polling requires --account-number");
    }

    let client = ctx.client()?;
    let account = account_ref(&args.scope)?;
    let excluded: BTreeSet<EntityType> =
        args.excluded_types.iter().map(|t| EntityType::from(t.as_str())).collect();
    let max_wait = Duration::from_secs(args.max_timeout_minutes * 60);

    // Stack-scoped runs only wait on the entity types the stack maps to
    let relevant = match (&args.scope.stack_name, &args.scope.resources_file) {
        (Some(stack_name), Some(file)) => {
            let mapper = ResourceTypeMapper::embedded()?;
            let provider = FileStackResourceProvider::load(file)?;
            provider.verify_account(args.scope.account_number.as_deref())?;
            let resources = provider.list_physical_resources(stack_name).await?;

            let native_types: BTreeSet<&str> =
                resources.iter().map(|r| r.resource_type.as_str()).collect();
            let (supported, unsupported) = mapper.partition(native_types.iter().copied());

            if ctx.output_format == OutputFormat::Pretty {
                let supported: Vec<String> = supported.iter().map(ToString::to_string).collect();
                let unsupported: Vec<String> =
                    unsupported.iter().map(ToString::to_string).collect();
                print_list("Stack resource types with compliance coverage", &supported);
                print_list("Stack resource types without compliance coverage", &unsupported);
            }

            Some(mapper.relevant_entity_types(native_types.iter().copied(), &excluded))
        }
        _ => None,
    };

    if ctx.output_format == OutputFormat::Pretty {
        if let Some(relevant) = &relevant {
            let types: Vec<String> = relevant.iter().map(ToString::to_string).collect();
            print_list("Entity types to wait for", &types);
        }
        if !excluded.is_empty() {
            let types: Vec<String> = excluded.iter().map(ToString::to_string).collect();
            print_list("Excluded entity types (not waited on)", &types);
        }
    }

    let backend = AccountSyncBackend::new(&client, account);
    let poller = SyncPoller::with_config(
        backend,
        PollConfig {
            interval: DEFAULT_POLL_INTERVAL,
            region: args.scope.region.clone(),
            excluded_types: excluded,
        },
    );
    let result = poller.wait_for_convergence(relevant.as_ref(), max_wait).await;

    match ctx.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Pretty => print_convergence(&result),
    }

    if result.is_converged() {
        Ok(ExitCode::SUCCESS)
    } else {
        if ctx.output_format == OutputFormat::Pretty {
            let pending: Vec<String> = result.pending.iter().map(ToString::to_string).collect();
            println!(
                "\n{} not all types were refreshed. Consider a longer timeout, or excluding: {}",
                "Warning:".yellow().bold(),
                pending.join(",")
            );
        }
        Ok(ExitCode::from(1))
    }
}
