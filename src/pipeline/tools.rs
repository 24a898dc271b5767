//! External tool detection.
//!
//! Availability is probed up front purely for diagnostics. Stages still run
//! unconditionally; a genuinely missing tool fails its stage with the full
//! spawn error.

use crate::config::BuildConfiguration;

/// Logs whether each configured external tool resolves on the PATH.
pub fn log_availability(config: &BuildConfiguration) {
    let mut programs = vec![config.compile.program(), config.packager.program()];
    if config.docs.enabled {
        programs.push(config.docs.command.program());
    }
    programs.sort_unstable();
    programs.dedup();

    for program in programs {
        match which::which(program) {
            Ok(path) => log::debug!("found {} at {}", program, path.display()),
            Err(_) => log::warn!(
                "{} not found in PATH; its stage will fail if reached",
                program
            ),
        }
    }
}
