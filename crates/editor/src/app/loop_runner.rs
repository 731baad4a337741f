use std::process::ExitCode;

use region_engine::run_app;
use tracing::error;

use super::bootstrap::AppWiring;

pub(crate) fn run(wiring: AppWiring) -> ExitCode {
    if let Err(err) = run_app(wiring.config, Box::new(wiring.app)) {
        error!(error = %err, "event_loop_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
