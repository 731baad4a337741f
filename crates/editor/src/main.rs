use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::error;

mod app;

fn main() -> ExitCode {
    let world_arg = env::args_os().nth(1).map(PathBuf::from);
    match app::bootstrap::build_app(world_arg) {
        Ok(wiring) => app::loop_runner::run(wiring),
        Err(err) => {
            error!(error = %err, "startup_failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
