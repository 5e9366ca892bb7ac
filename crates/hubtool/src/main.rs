use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use hubtool_core::client::{HubClient, HubClientConfig, HubReadApi};
use hubtool_core::config::{CredentialOverrides, load_config};
use hubtool_core::filter::ItemFilter;
use hubtool_core::locate::LocateOptions;
use hubtool_core::removal::{RemovalOptions, RunOutcome, run_removal};
use hubtool_core::reporter::{ConsoleReporter, StdinPrompt};
use hubtool_core::runtime::{
    PathOverrides, ResolutionContext, ResolvedPaths, normalize_for_display, resolve_paths,
};
use hubtool_core::target::RemovalTarget;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "hubtool",
    version,
    about = "Bulk maintenance for archived content items in a content hub"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    project_root: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long = "clientId", global = true, value_name = "ID")]
    client_id: Option<String>,
    #[arg(long = "clientSecret", global = true, value_name = "SECRET")]
    client_secret: Option<String>,
    #[arg(long = "hubId", global = true, value_name = "ID")]
    hub_id: Option<String>,
    #[arg(long, global = true, help = "Print resolved runtime diagnostics")]
    diagnostics: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone)]
struct RuntimeOptions {
    project_root: Option<PathBuf>,
    config: Option<PathBuf>,
    credentials: CredentialOverrides,
    diagnostics: bool,
}

impl RuntimeOptions {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            project_root: cli.project_root.clone(),
            config: cli.config.clone(),
            credentials: CredentialOverrides {
                hub_id: cli.hub_id.clone(),
                client_id: cli.client_id.clone(),
                client_secret: cli.client_secret.clone(),
            },
            diagnostics: cli.diagnostics,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(
        name = "remove-archived-delivery-key",
        about = "Remove delivery keys from archived content items and re-archive them"
    )]
    RemoveArchivedDeliveryKey(RemoveArchivedArgs),
    #[command(
        name = "remove-archived-active-flag",
        about = "Clear the active flag on published archived content items and queue a republish"
    )]
    RemoveArchivedActiveFlag(RemoveArchivedArgs),
}

#[derive(Debug, Args)]
struct RemoveArchivedArgs {
    #[arg(
        value_name = "ID",
        help = "Content item ID; repository and folder filters are ignored when given"
    )]
    id: Option<String>,
    #[arg(long = "repoId", value_name = "ID", help = "Repository to search (repeatable)")]
    repo_id: Vec<String>,
    #[arg(
        long = "folderId",
        value_name = "ID",
        help = "Folder to search (repeatable); repository filters are ignored when given"
    )]
    folder_id: Vec<String>,
    #[arg(
        long,
        value_name = "PATTERN",
        help = "Label to match, exact or /regex/ (repeatable)"
    )]
    name: Vec<String>,
    #[arg(
        long = "contentType",
        value_name = "PATTERN",
        help = "Schema id to match, exact or /regex/ (repeatable); ignored when --name is given"
    )]
    content_type: Vec<String>,
    #[arg(short = 'f', long, help = "Skip the confirmation prompt")]
    force: bool,
    #[arg(short = 's', long, help = "Do not write a log file")]
    silent: bool,
    #[arg(long = "ignoreError", help = "Continue with the next item after a failure")]
    ignore_error: bool,
    #[arg(
        long = "logFile",
        value_name = "PATH",
        help = "Log file path; <DATE> is replaced with the run timestamp"
    )]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let runtime = RuntimeOptions::from_cli(&cli);

    match cli.command {
        Some(Commands::RemoveArchivedDeliveryKey(args)) => {
            run_remove_archived(&runtime, RemovalTarget::DeliveryKey, args)
        }
        Some(Commands::RemoveArchivedActiveFlag(args)) => {
            run_remove_archived(&runtime, RemovalTarget::ActiveFlag, args)
        }
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run_remove_archived(
    runtime: &RuntimeOptions,
    target: RemovalTarget,
    args: RemoveArchivedArgs,
) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let config = load_config(&paths.config_path)?.with_overrides(&runtime.credentials);
    let mut client = HubClient::new(HubClientConfig::from_config(&config)?)?;

    let log_template = args
        .log_file
        .unwrap_or_else(|| paths.default_log_template(target.command_name()));

    let options = RemovalOptions {
        target,
        location: LocateOptions {
            id: args.id,
            repo_ids: args.repo_id,
            folder_ids: args.folder_id,
        },
        filter: ItemFilter {
            names: args.name,
            content_types: args.content_type,
        },
        force: args.force,
        silent: args.silent,
        ignore_error: args.ignore_error,
        log_file: Some(log_template.clone()),
    };

    let outcome = run_removal(
        &mut client,
        &options,
        &mut ConsoleReporter,
        &mut StdinPrompt,
    );

    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
        println!("log_template={}", normalize_for_display(&log_template));
        println!("requests={}", client.request_count());
        println!("outcome={}", describe_outcome(&outcome));
    }

    Ok(())
}

fn describe_outcome(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::NothingFound => "nothing-found".to_string(),
        RunOutcome::Declined => "declined".to_string(),
        RunOutcome::Completed(summary) => format!(
            "completed (selected={}, succeeded={}, failed={}, stopped_early={})",
            summary.selected,
            summary.report.succeeded,
            summary.report.failed,
            summary.report.stopped_early
        ),
    }
}

fn resolve_runtime_paths(runtime: &RuntimeOptions) -> Result<ResolvedPaths> {
    dotenvy::dotenv().ok();

    let context = ResolutionContext::from_process()?;
    let overrides = PathOverrides {
        project_root: runtime.project_root.clone(),
        config: runtime.config.clone(),
    };

    let initial = resolve_paths(&context, &overrides)?;
    let project_env = initial.project_root.join(".env");
    if project_env.exists() {
        let _ = dotenvy::from_path_override(&project_env);
    }

    resolve_paths(&context, &overrides)
}
