//! shipwright - versioned installer build pipeline.
//!
//! This binary compiles a project in release mode, optionally bundles its
//! documentation, runs the installer generator for each configured variant,
//! and renames the produced installers to embed the manifest version.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match shipwright::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
