//! check-db - verify the configured database answers queries
//!
//! Prints one line per probe and exits 1 on any failure.

use std::process::ExitCode;

use clap::Parser;
use stats_admin::check::run_db_check;
use stats_common::config::resolve_database_url;

#[derive(Parser, Debug)]
#[command(name = "check-db")]
#[command(about = "Check connectivity to the stats-admin database")]
#[command(version)]
struct Args {
    /// Print the connection URL without masking the password
    #[arg(long)]
    show_uri: bool,

    /// Database connection URL (overrides DATABASE_URL and the config file)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let database_url = resolve_database_url(args.database_url.as_deref());

    let report = run_db_check(&database_url, args.show_uri).await;
    for line in &report.lines {
        println!("{}", line);
    }

    if report.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
