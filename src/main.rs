use std::process::ExitCode;
use tbo_particles::{fatal_diagnostic, run};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", fatal_diagnostic(&e));
            ExitCode::from(1)
        }
    }
}
