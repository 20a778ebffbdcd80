//! Entry point for the koisheed watcher daemon.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Workers log to stderr from their own threads, so the handle must stay
    // unlocked while the daemon runs.
    koisheed::run(std::env::args_os(), &mut io::stdout(), &mut io::stderr())
}
