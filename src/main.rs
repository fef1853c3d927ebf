//! toolgate CLI
//!
//! Probes, runs, plans and executes configured external tools. Results are
//! printed as JSON on stdout; tool output streams to stderr.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use toolgate::{
    BackgroundInvocation, ExecuteRequest, OrchestratorConfig, OutputSink, PlanRequest, RunRequest,
    StreamKind, ToolOrchestrator, spawn_invocation,
};
use tracing::{Level, error, info, warn};
use tracing_subscriber::fmt;

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "toolgate")]
#[command(about = "Safety-gated orchestration of external command-line tools")]
struct Cli {
    /// Tools file (overrides TOOLGATE_TOOLS_FILE)
    #[arg(long, global = true)]
    tools_file: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that a tool is available and report its version
    Probe { tool: String },
    /// One-shot call of a flat-template tool
    Run {
        tool: String,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output_file: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Plan phase of a two-phase tool
    Plan(PhaseArgs),
    /// Plan, confirm interactively, then execute
    Execute(PhaseArgs),
}

#[derive(Debug, Args)]
struct PhaseArgs {
    tool: String,
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    output_dir: PathBuf,
    /// Root the output directory must stay inside
    #[arg(long)]
    destination_root: Option<PathBuf>,
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let mut config = OrchestratorConfig::from_env();
    if let Some(path) = cli.tools_file {
        config.tools_file = path;
    }

    let orchestrator = match ToolOrchestrator::load(config) {
        Ok(orchestrator) => Arc::new(orchestrator),
        Err(e) => {
            error!(error = %e, "failed to load tools file");
            process::exit(2);
        }
    };
    info!(tools = orchestrator.tool_keys().count(), "configuration loaded");

    let ok = match cli.command {
        Command::Probe { tool } => {
            let result = orchestrator.probe(&tool).await;
            print_json(&result);
            result.available
        }
        Command::Run {
            tool,
            input,
            output_file,
            output_dir,
            dry_run,
        } => {
            let request = RunRequest {
                input,
                output_file,
                output_dir,
                dry_run,
            };
            let orch = orchestrator.clone();
            let result = until_ctrl_c(spawn_invocation(move |cancel| async move {
                orch.run(&tool, &request, &cancel, Some(stderr_sink())).await
            }))
            .await;
            result
                .map(|r| {
                    print_json(&r);
                    r.succeeded
                })
                .unwrap_or(false)
        }
        Command::Plan(args) => plan(&orchestrator, &args).await,
        Command::Execute(args) => execute(&orchestrator, args).await,
    };

    if !ok {
        process::exit(1);
    }
}

async fn plan(orchestrator: &Arc<ToolOrchestrator>, args: &PhaseArgs) -> bool {
    let request = PlanRequest {
        input: args.input.clone(),
        output_dir: args.output_dir.clone(),
        destination_root: args.destination_root.clone(),
        dry_run: args.dry_run,
    };
    let orch = orchestrator.clone();
    let tool = args.tool.clone();
    let result = until_ctrl_c(spawn_invocation(move |cancel| async move {
        orch.plan(&tool, &request, &cancel, Some(stderr_sink())).await
    }))
    .await;
    result
        .map(|r| {
            print_json(&r);
            r.accepted
        })
        .unwrap_or(false)
}

async fn execute(orchestrator: &Arc<ToolOrchestrator>, args: PhaseArgs) -> bool {
    if !plan(orchestrator, &args).await {
        warn!(tool = %args.tool, "plan not accepted, execute skipped");
        return false;
    }

    let explicit_confirmation = if args.dry_run {
        false
    } else {
        match confirm(&args).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "failed to read confirmation");
                false
            }
        }
    };

    let request = ExecuteRequest {
        input: args.input,
        output_dir: args.output_dir,
        destination_root: args.destination_root,
        plan_confirmed: true,
        explicit_confirmation,
        dry_run: args.dry_run,
    };
    let orch = orchestrator.clone();
    let tool = args.tool;
    let result = until_ctrl_c(spawn_invocation(move |cancel| async move {
        orch.execute(&tool, &request, &cancel, Some(stderr_sink())).await
    }))
    .await;
    result
        .map(|r| {
            print_json(&r);
            r.accepted
        })
        .unwrap_or(false)
}

/// Ask on stderr, read one line from stdin
async fn confirm(args: &PhaseArgs) -> std::io::Result<bool> {
    eprint!(
        "Execute {} into {}? [y/N] ",
        args.tool,
        args.output_dir.display()
    );
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes" | "YES"))
}

/// Await an invocation, cancelling it on Ctrl+C
async fn until_ctrl_c<T>(invocation: BackgroundInvocation<T>) -> Option<T> {
    let token = invocation.cancel_token().clone();
    let join = invocation.join();
    tokio::pin!(join);

    let finished = tokio::select! {
        joined = &mut join => Some(joined),
        _ = signal::ctrl_c() => None,
    };
    let joined = match finished {
        Some(joined) => joined,
        None => {
            warn!("Ctrl+C received, cancelling");
            token.request_cancel();
            join.await
        }
    };

    match joined {
        Ok(value) => Some(value),
        Err(e) => {
            error!(error = %e, "invocation task failed");
            None
        }
    }
}

fn stderr_sink() -> OutputSink {
    Arc::new(|stream: StreamKind, line: &str| eprintln!("[{}] {}", stream.as_str(), line))
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "failed to serialize result"),
    }
}
