//! Packaging stage, run once per configured variant.

use super::process::{self, ToolOutput};
use super::result::Artifact;
use crate::config::{BuildConfiguration, VariantConfig};
use crate::error::{PipelineError, Result};
use crate::util;

/// Runs the installer generator for one variant and collects its installer
/// into the output directory.
///
/// The generator is invoked with the variant's script name appended to the
/// packager command, with the child's working directory set to the variant's
/// script directory. The parent process's current directory is never
/// changed, so variants cannot observe each other's context.
///
/// On success the produced executable is copied into the output directory
/// under the variant's canonical artifact name. A nonzero exit is returned
/// in the [`ToolOutput`] for the driver's fail-fast handling; a zero exit
/// with no produced executable is an external tool error.
pub async fn run_variant(
    config: &BuildConfiguration,
    variant: &VariantConfig,
) -> Result<(ToolOutput, Option<Artifact>)> {
    log::info!("packaging variant `{}`", variant.name);

    let script_path = variant.script_dir.join(&variant.script);
    if !script_path.is_file() {
        return Err(PipelineError::ExternalTool {
            tool: config.packager.program().to_string(),
            reason: format!("installer script not found: {}", script_path.display()),
        });
    }

    let command = config.packager.with_arg(&variant.script);
    let output = process::run_tool(&command, &variant.script_dir).await?;
    if !output.success() {
        return Ok((output, None));
    }

    let produced = variant.script_dir.join(&variant.produces);
    if !produced.is_file() {
        return Err(PipelineError::ExternalTool {
            tool: config.packager.program().to_string(),
            reason: format!(
                "installer generator succeeded but produced no executable at {}",
                produced.display()
            ),
        });
    }

    let collected = config.output_dir.join(&variant.artifact);
    util::fs::copy_file(&produced, &collected).await?;
    log::info!("collected installer {}", collected.display());

    Ok((
        output,
        Some(Artifact {
            variant: variant.name.clone(),
            path: collected,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigOverrides, ToolCommand};
    use tempfile::tempdir;

    async fn config_with_variant(root: &std::path::Path) -> BuildConfiguration {
        let config = BuildConfiguration::load(&ConfigOverrides {
            project_root: Some(root.to_path_buf()),
            ..Default::default()
        })
        .unwrap();
        tokio::fs::create_dir_all(&config.output_dir).await.unwrap();
        tokio::fs::create_dir_all(&config.variants[0].script_dir)
            .await
            .unwrap();
        tokio::fs::write(
            config.variants[0].script_dir.join("installer.nsi"),
            b"; installer script",
        )
        .await
        .unwrap();
        config
    }

    #[tokio::test]
    async fn collects_produced_installer_under_canonical_name() {
        let dir = tempdir().unwrap();
        let mut config = config_with_variant(dir.path()).await;
        // Fake generator writes the installer next to the script
        config.packager = ToolCommand::new(["sh", "-c", "printf payload > UserSetup.exe"]);

        let variant = config.variants[0].clone();
        let (output, artifact) = run_variant(&config, &variant).await.unwrap();

        assert!(output.success());
        let artifact = artifact.unwrap();
        assert_eq!(artifact.variant, "user");
        assert_eq!(artifact.path, config.output_dir.join("UserSetup.exe"));
        assert_eq!(tokio::fs::read(&artifact.path).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn missing_script_is_an_error() {
        let dir = tempdir().unwrap();
        let mut config = config_with_variant(dir.path()).await;
        config.variants[0].script = "absent.nsi".to_string();

        let variant = config.variants[0].clone();
        let err = run_variant(&config, &variant).await.unwrap_err();
        assert!(matches!(err, PipelineError::ExternalTool { .. }));
    }

    #[tokio::test]
    async fn generator_failure_yields_no_artifact() {
        let dir = tempdir().unwrap();
        let mut config = config_with_variant(dir.path()).await;
        config.packager = ToolCommand::new(["sh", "-c", "exit 1"]);

        let variant = config.variants[0].clone();
        let (output, artifact) = run_variant(&config, &variant).await.unwrap();
        assert!(!output.success());
        assert!(artifact.is_none());
    }

    #[tokio::test]
    async fn missing_output_executable_is_an_error() {
        let dir = tempdir().unwrap();
        let mut config = config_with_variant(dir.path()).await;
        config.packager = ToolCommand::new(["sh", "-c", "true"]);

        let variant = config.variants[0].clone();
        let err = run_variant(&config, &variant).await.unwrap_err();
        assert!(matches!(err, PipelineError::ExternalTool { .. }));
    }
}
