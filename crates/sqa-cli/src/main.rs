//! `sqa` binary

use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = sqa_cli::command().get_matches();
    let verbosity = matches.get_count("verbose");
    if let Err(error) = sqa_cli::init_tracing(verbosity) {
        eprintln!("warning: {error}");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("error: failed to start runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(sqa_cli::run(&matches));
    // Timed-out passes may still hold blocking threads; do not wait for them.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
