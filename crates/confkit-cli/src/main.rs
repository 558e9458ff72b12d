use std::process::ExitCode;

fn main() -> ExitCode {
    confkit_cli::run()
}
