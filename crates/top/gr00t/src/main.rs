//! Entry point of the `gr00t` command line tool, see [`gr00t::run`].

use std::process::ExitCode;

fn main() -> ExitCode {
    gr_log::setup_logging();

    match gr00t::run(std::env::args()) {
        Ok(exit_code) => ExitCode::from(exit_code),
        Err(err) => {
            gr_log::error!("{}", gr_log::format_error(&err));
            ExitCode::FAILURE
        }
    }
}
