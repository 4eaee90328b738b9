//! `jnu-exam` binary entry point.

use anyhow::{Context, Result};
use clap::Parser;
use jnu_exam::cli;
use jnu_exam::core::error::user_friendly_error;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    let cli_config = cli.build_config();
    // SAFETY: the runtime is built below, so this thread is the only one.
    unsafe { cli_config.apply_to_env() };
    cli_config.init_logging();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    match runtime.block_on(cli.execute()) {
        Ok(()) => Ok(()),
        Err(e) => {
            // Convert to user-friendly error with context and suggestions
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
