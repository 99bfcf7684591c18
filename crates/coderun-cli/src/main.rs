//! Binary entrypoint for the coderun JSONL tool surface.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin = io::stdin();
    let stdout = io::stdout();
    match coderun_cli::run(std::env::args_os(), stdin.lock(), stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(io::stderr().lock(), "coderun: {error}").ok();
            ExitCode::FAILURE
        }
    }
}
