use bugzero_lib::{commands, Args};
use clap::Parser;
use dotenv::dotenv;
use std::process::ExitCode;
use tracing::Level;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let args = Args::parse();

    // Logs go to stderr; stdout carries results.
    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match commands::run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(e) if e.is_github() => {
            eprintln!("GitHub API error: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
