use std::process::ExitCode;

fn main() -> ExitCode {
    deskvoice_cli::run()
}
