//! Build configuration for a pipeline run.
//!
//! A [`BuildConfiguration`] is constructed once at pipeline start from an
//! optional `shipwright.toml` plus CLI overrides, and is immutable for the
//! run's duration. All paths are resolved to absolute paths against the
//! project root at load time, so stages never depend on the process-wide
//! current directory.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default configuration file name looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "shipwright.toml";

/// An external tool invocation: program followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolCommand(Vec<String>);

impl ToolCommand {
    /// Creates a command from program-and-arguments parts.
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Returns the program to execute.
    ///
    /// Commands are validated non-empty at configuration load.
    pub fn program(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    /// Returns the arguments following the program.
    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    /// Returns a copy of this command with one extra trailing argument.
    pub fn with_arg(&self, arg: &str) -> Self {
        let mut parts = self.0.clone();
        parts.push(arg.to_string());
        Self(parts)
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

/// Documentation bundling settings.
#[derive(Debug, Clone)]
pub struct DocsConfig {
    /// Whether the docs stage runs at all.
    pub enabled: bool,
    /// When true, a docs failure is logged and the run proceeds.
    pub best_effort: bool,
    /// Documentation generator invocation, run from the project root.
    pub command: ToolCommand,
    /// Directory the generator writes its site into (absolute).
    pub site_dir: PathBuf,
    /// Optional static resource tree merged into the output directory root.
    pub resources: Option<PathBuf>,
}

/// One installer distribution variant.
#[derive(Debug, Clone)]
pub struct VariantConfig {
    /// Variant name, e.g. `user` or `admin`.
    pub name: String,
    /// Directory holding the variant's installer script (absolute).
    pub script_dir: PathBuf,
    /// Installer script file name within the script directory.
    pub script: String,
    /// Executable name the installer generator writes into the script directory.
    pub produces: String,
    /// Canonical artifact name the installer is collected under in the
    /// output directory, before version stamping.
    pub artifact: String,
}

/// Complete, immutable configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    /// Project root the compiler and docs generator run from (absolute).
    pub project_root: PathBuf,
    /// Manifest file supplying the version string (absolute).
    pub manifest: PathBuf,
    /// Output directory receiving all artifacts (absolute).
    pub output_dir: PathBuf,
    /// Native compiler invocation, run from the project root.
    pub compile: ToolCommand,
    /// Documentation bundling settings.
    pub docs: DocsConfig,
    /// Installer generator invocation; the variant script name is appended.
    pub packager: ToolCommand,
    /// Ordered distribution variants to package.
    pub variants: Vec<VariantConfig>,
}

/// CLI-level overrides applied on top of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Project root; defaults to the current directory.
    pub project_root: Option<PathBuf>,
    /// Explicit configuration file path; errors if missing.
    pub config_file: Option<PathBuf>,
    /// Output directory override.
    pub output_dir: Option<PathBuf>,
    /// Docs stage enable/disable override.
    pub docs: Option<bool>,
    /// Restricts and reorders the configured variant set.
    pub variants: Vec<String>,
}

// Raw shapes deserialized from shipwright.toml. Everything is optional;
// defaults fill the gaps.

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    manifest: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    #[serde(default)]
    compile: CompileSection,
    #[serde(default)]
    docs: DocsSection,
    #[serde(default)]
    package: PackageSection,
    #[serde(default, rename = "variant")]
    variants: Vec<VariantSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CompileSection {
    command: Option<ToolCommand>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocsSection {
    enabled: Option<bool>,
    best_effort: Option<bool>,
    command: Option<ToolCommand>,
    site_dir: Option<PathBuf>,
    resources: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackageSection {
    command: Option<ToolCommand>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VariantSection {
    name: String,
    script_dir: Option<PathBuf>,
    script: Option<String>,
    produces: Option<String>,
    artifact: Option<String>,
}

impl BuildConfiguration {
    /// Loads the configuration from disk and applies CLI overrides.
    ///
    /// Lookup order: an explicit `--config` path (missing file is an error),
    /// otherwise `shipwright.toml` in the project root if present, otherwise
    /// built-in defaults (single `user` variant, `windows_builds` output,
    /// `cargo build --release`, docs disabled).
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let project_root = absolutize(
            overrides
                .project_root
                .clone()
                .unwrap_or_else(|| PathBuf::from("."))
                .as_path(),
        )?;

        let file = match &overrides.config_file {
            Some(path) => {
                let path = resolve(&project_root, path);
                let contents = std::fs::read_to_string(&path).map_err(|e| {
                    PipelineError::Config(format!(
                        "cannot read config file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                toml::from_str::<ConfigFile>(&contents)?
            }
            None => {
                let path = project_root.join(CONFIG_FILE_NAME);
                if path.is_file() {
                    let contents = std::fs::read_to_string(&path).map_err(|e| {
                        PipelineError::Config(format!(
                            "cannot read config file {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                    toml::from_str::<ConfigFile>(&contents)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        Self::assemble(project_root, file, overrides)
    }

    fn assemble(
        project_root: PathBuf,
        file: ConfigFile,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let manifest = resolve(
            &project_root,
            &file.manifest.unwrap_or_else(|| PathBuf::from("Cargo.toml")),
        );
        let output_dir = resolve(
            &project_root,
            overrides
                .output_dir
                .as_ref()
                .or(file.output_dir.as_ref())
                .cloned()
                .unwrap_or_else(|| PathBuf::from("windows_builds"))
                .as_path(),
        );

        let compile = file
            .compile
            .command
            .unwrap_or_else(|| ToolCommand::new(["cargo", "build", "--release"]));

        let docs = DocsConfig {
            enabled: overrides.docs.or(file.docs.enabled).unwrap_or(false),
            best_effort: file.docs.best_effort.unwrap_or(false),
            command: file
                .docs
                .command
                .unwrap_or_else(|| ToolCommand::new(["mkdocs", "build"])),
            site_dir: resolve(
                &project_root,
                &file.docs.site_dir.unwrap_or_else(|| PathBuf::from("site")),
            ),
            resources: file.docs.resources.map(|p| resolve(&project_root, &p)),
        };

        let packager = file
            .package
            .command
            .unwrap_or_else(|| ToolCommand::new(["makensis"]));

        let mut variants: Vec<VariantConfig> = if file.variants.is_empty() {
            vec![VariantConfig::with_defaults(&project_root, "user")]
        } else {
            file.variants
                .into_iter()
                .map(|raw| {
                    let defaults = VariantConfig::with_defaults(&project_root, &raw.name);
                    let artifact = raw.artifact.unwrap_or(defaults.artifact);
                    VariantConfig {
                        name: raw.name,
                        script_dir: raw
                            .script_dir
                            .map(|p| resolve(&project_root, &p))
                            .unwrap_or(defaults.script_dir),
                        script: raw.script.unwrap_or(defaults.script),
                        produces: raw.produces.unwrap_or_else(|| artifact.clone()),
                        artifact,
                    }
                })
                .collect()
        };

        if !overrides.variants.is_empty() {
            variants = select_variants(variants, &overrides.variants)?;
        }

        let config = Self {
            project_root,
            manifest,
            output_dir,
            compile,
            docs,
            packager,
            variants,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks internal consistency of a fully assembled configuration.
    fn validate(&self) -> Result<()> {
        if self.compile.is_empty() {
            return Err(PipelineError::Config("compile command is empty".into()));
        }
        if self.packager.is_empty() {
            return Err(PipelineError::Config("package command is empty".into()));
        }
        if self.docs.enabled && self.docs.command.is_empty() {
            return Err(PipelineError::Config("docs command is empty".into()));
        }
        if self.variants.is_empty() {
            return Err(PipelineError::Config(
                "at least one variant must be configured".into(),
            ));
        }

        let mut names = HashSet::new();
        let mut artifacts = HashSet::new();
        for variant in &self.variants {
            if !names.insert(variant.name.as_str()) {
                return Err(PipelineError::Config(format!(
                    "duplicate variant name: {}",
                    variant.name
                )));
            }
            // Canonical names are the collision guard for the shared output
            // directory; duplicates would make one variant clobber another.
            if !artifacts.insert(variant.artifact.as_str()) {
                return Err(PipelineError::Config(format!(
                    "variants collide on artifact name: {}",
                    variant.artifact
                )));
            }
        }

        Ok(())
    }
}

impl VariantConfig {
    /// Builds the default settings for a named variant: scripts under
    /// `installer/<name>`, script file `installer.nsi`, artifact
    /// `<Name>Setup.exe`.
    fn with_defaults(project_root: &Path, name: &str) -> Self {
        let artifact = format!("{}Setup.exe", capitalize(name));
        Self {
            name: name.to_string(),
            script_dir: project_root.join("installer").join(name),
            script: "installer.nsi".to_string(),
            produces: artifact.clone(),
            artifact,
        }
    }
}

/// Restricts and reorders variants to the requested names.
fn select_variants(
    configured: Vec<VariantConfig>,
    requested: &[String],
) -> Result<Vec<VariantConfig>> {
    let mut selected = Vec::with_capacity(requested.len());
    for name in requested {
        match configured.iter().find(|v| &v.name == name) {
            Some(variant) => selected.push(variant.clone()),
            None => {
                return Err(PipelineError::Config(format!(
                    "unknown variant: {} (configured: {})",
                    name,
                    configured
                        .iter()
                        .map(|v| v.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
        }
    }
    Ok(selected)
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn resolve(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
