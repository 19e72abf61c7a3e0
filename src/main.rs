use std::process::ExitCode;

use dockhand::cli::{self, Cli};
use dockhand::ui::output::{self, Verbosity};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // DOCKHAND_LOG wins over RUST_LOG; flags pick the default.
    let default = Verbosity::from_flags(cli.quiet, cli.debug).log_directive();
    let filter = std::env::var("DOCKHAND_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
