//! # pyro CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pyro_cli::applications::{run_applications, ApplicationsArgs};
use pyro_cli::context::ConnectArgs;
use pyro_cli::documents::{run_documents, DocumentsArgs};
use pyro_cli::forms::{run_validate, ValidateArgs};
use pyro_cli::permissions::{run_permissions, PermissionsArgs};
use pyro_cli::report::{run_metrics, run_render, MetricsArgs, RenderArgs};

/// Fireworks permit and license portal CLI.
#[derive(Parser, Debug)]
#[command(name = "pyro", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    connect: ConnectArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse, submit, and review applications.
    #[command(alias = "apps")]
    Applications(ApplicationsArgs),

    /// Upload and view supporting documents.
    Documents(DocumentsArgs),

    /// Print the permission table in effect.
    Permissions(PermissionsArgs),

    /// Check a form file without contacting the portal.
    Validate(ValidateArgs),

    /// Print the permit or license layout of an application.
    Render(RenderArgs),

    /// Application counts by status and type.
    Metrics(MetricsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(dispatch(&cli)),
        Err(e) => Err(anyhow::Error::new(e).context("starting async runtime")),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn dispatch(cli: &Cli) -> anyhow::Result<u8> {
    match &cli.command {
        Commands::Applications(args) => run_applications(args, &cli.connect).await,
        Commands::Documents(args) => run_documents(args, &cli.connect).await,
        Commands::Permissions(args) => run_permissions(args, cli.connect.permissions.as_deref()),
        Commands::Validate(args) => run_validate(args),
        Commands::Render(args) => run_render(args, &cli.connect).await,
        Commands::Metrics(args) => run_metrics(args, &cli.connect).await,
    }
}
