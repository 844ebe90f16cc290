//! Bulwark - Entry Point
//!
//! Binary entry point for the `bulwark` operator CLI. Lives in the facade
//! crate next to the library re-exports.

use bulwark::cli::{Cli, run};
use clap::Parser;

/// Main entry point for Bulwark
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    run(cli).await?;
    Ok(())
}
