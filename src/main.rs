//! ccron - construction schedule auditor

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = ccron::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
