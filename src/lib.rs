//! Build-release pipeline for producing versioned installer packages.
//!
//! This library drives a fixed sequence of external tools (native compiler,
//! optional documentation generator, one installer generator per distribution
//! variant) and stamps the resulting installers with the version string read
//! from the project manifest. It can be used both as a CLI tool and as a
//! library dependency.

pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod util;

// Re-export commonly used types
pub use config::BuildConfiguration;
pub use error::{ErrorExt, PipelineError, Result};
pub use pipeline::{Pipeline, PipelineRun};
