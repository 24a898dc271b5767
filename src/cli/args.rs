//! Command line argument parsing and validation.

use clap::Parser;
use std::path::PathBuf;

/// Build-release pipeline producing versioned installer packages
#[derive(Parser, Debug)]
#[command(
    name = "shipwright",
    version,
    about = "Build-release pipeline producing versioned installer packages",
    long_about = "Compiles the project in release mode, optionally bundles generated \
documentation, runs the installer generator for each configured distribution variant, \
and renames the produced installers to embed the manifest version.

Configuration is read from shipwright.toml in the project root when present; every \
value has a built-in default, so no arguments are required.

Usage:
  shipwright
  shipwright --docs --output-dir dist
  shipwright --variant user --variant admin --report-json run.json

Exit code 0 = every stage succeeded and the versioned installers exist in the output \
directory."
)]
pub struct Args {
    /// Project root containing the manifest (defaults to the current directory)
    #[arg(short = 'C', long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    /// Configuration file path (defaults to <project-root>/shipwright.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output directory receiving the versioned installers
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Enable the documentation bundling stage
    #[arg(long)]
    pub docs: bool,

    /// Variant to package; repeatable, restricts and reorders the configured set
    #[arg(short, long, value_name = "NAME")]
    pub variant: Vec<String>,

    /// Write the machine-readable run report to this path
    #[arg(long, value_name = "FILE")]
    pub report_json: Option<PathBuf>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_are_required() {
        let args = Args::try_parse_from(["shipwright"]).unwrap();
        assert!(args.project_root.is_none());
        assert!(!args.docs);
        assert!(args.variant.is_empty());
    }

    #[test]
    fn variants_accumulate_in_order() {
        let args =
            Args::try_parse_from(["shipwright", "-v", "admin", "-v", "user"]).unwrap();
        assert_eq!(args.variant, ["admin", "user"]);
    }
}
