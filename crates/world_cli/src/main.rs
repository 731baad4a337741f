use std::env;
use std::io;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use world_cli::{parse_args, run, usage_text};

fn main() -> ExitCode {
    init_tracing();
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    match parse_args(&args)? {
        Some(invocation) => run(&invocation, &mut io::stdout()),
        None => {
            println!("{}", usage_text());
            Ok(())
        }
    }
}

/// Load warnings go to stderr so stdout stays the command's output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .init();
}
