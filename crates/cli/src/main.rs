use std::process::ExitCode;

fn main() -> ExitCode {
    giftmatch_cli::run()
}
