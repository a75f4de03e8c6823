use std::process::ExitCode;

fn main() -> ExitCode {
    // Failures are already reported on stderr by `run`; only the exit code
    // is decided here.
    match epi_curves::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(err.exit_code()),
    }
}
