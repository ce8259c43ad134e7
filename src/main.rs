//! Parley CLI binary entry point.
//!
//! `main` stays synchronous: every remote call goes through the invocation
//! bridge, which builds whatever execution context the call needs.

use parley::cli::{commands, Cli};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_env("PARLEY_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    if let Err(e) = commands::run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
