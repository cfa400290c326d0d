//! `unleash` runs multiple copies of a child command until they all finish.
//!
//! ```text
//! unleash [-n N] [-r R] [--] child-program [child args]
//! ```
//!
//! Exit status is 0 when every copy succeeded, 1 otherwise (with a single
//! `unleash: <error>` line on stderr), 2 on usage errors.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use unleash::{
    Config, DEFAULT_LOG_FILTER, LogWriter, Subscribe, Supervisor, default_workers,
};

/// Command-line interface definition.
#[derive(Debug, Parser)]
#[command(
    name = "unleash",
    version,
    about = "Runs multiple copies of a child command until they all finish",
    override_usage = "unleash [OPTIONS] -- <CHILD>..."
)]
struct Cli {
    /// Number of child processes to start (defaults to number of CPUs).
    #[arg(
        short = 'n',
        long = "workers",
        value_name = "N",
        default_value_t = default_workers().get() as i64,
        allow_negative_numbers = true
    )]
    workers: i64,

    /// Max number of times to restart a child if it fails.
    #[arg(
        short = 'r',
        long = "restarts",
        value_name = "R",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    restarts: i64,

    /// Child program followed by its arguments.
    #[arg(
        value_name = "CHILD",
        required = true,
        num_args = 1..,
        trailing_var_arg = true
    )]
    command: Vec<String>,
}

/// Installs a stderr `fmt` subscriber filtered by `UNLEASH_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("UNLEASH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let cfg = Config::new(cli.workers, cli.restarts);
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let sup = Supervisor::new(cfg, subs);

    match sup.run_command(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unleash: {err}");
            ExitCode::FAILURE
        }
    }
}
