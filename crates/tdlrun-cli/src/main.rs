//! CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use tdlrun_cli::{Cli, CliError, init_tracing, run};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before parsing so clap sees them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}
