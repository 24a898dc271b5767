//! Version extraction from the project manifest.
//!
//! The manifest is owned by the surrounding project and is never mutated
//! here. Only the version declaration is consumed; no other fields are read.

use crate::error::{PipelineError, Result};
use std::path::Path;

/// Extracts the version string from a manifest file.
///
/// Scans lines in order; the first line whose trimmed text begins with the
/// token `version` is the declaration line. The right-hand side of its first
/// `=` is trimmed and stripped of one matching layer of single or double
/// quotes. Lines that merely contain "version" as a substring elsewhere
/// (e.g. `app_version`, `versioning`) do not match.
///
/// # Errors
///
/// Returns [`PipelineError::ManifestParse`] if the file cannot be opened or
/// no line carries a version declaration.
pub fn extract_version(path: &Path) -> Result<String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| PipelineError::ManifestParse {
            path: path.to_path_buf(),
            reason: format!("cannot open manifest: {}", e),
        })?;

    for line in contents.lines() {
        let trimmed = line.trim();
        if !starts_with_version_token(trimmed) {
            continue;
        }
        if let Some((_, rhs)) = trimmed.split_once('=') {
            return Ok(strip_quotes(rhs.trim()).to_string());
        }
    }

    Err(PipelineError::ManifestParse {
        path: path.to_path_buf(),
        reason: "no line declares a version".to_string(),
    })
}

/// Checks that a trimmed line begins with `version` as a whole token,
/// followed by whitespace, `=`, or end of line.
fn starts_with_version_token(line: &str) -> bool {
    match line.strip_prefix("version") {
        Some(rest) => rest.is_empty() || rest.starts_with(['=', ' ', '\t']),
        None => false,
    }
}

/// Strips one matching layer of surrounding single or double quotes.
fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn manifest_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp manifest");
        file.write_all(contents.as_bytes()).expect("write manifest");
        file
    }

    #[test]
    fn extracts_double_quoted_version() {
        let file = manifest_with("[package]\nname = \"flua\"\nversion = \"0.1.9\"\n");
        assert_eq!(extract_version(file.path()).unwrap(), "0.1.9");
    }

    #[test]
    fn extracts_single_quoted_version() {
        let file = manifest_with("version = '2.3.4'\n");
        assert_eq!(extract_version(file.path()).unwrap(), "2.3.4");
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let file = manifest_with("   version   =   \"1.0.0\"   \n");
        assert_eq!(extract_version(file.path()).unwrap(), "1.0.0");
    }

    #[test]
    fn tolerates_unquoted_version() {
        let file = manifest_with("version = 7.8.9\n");
        assert_eq!(extract_version(file.path()).unwrap(), "7.8.9");
    }

    #[test]
    fn skips_lines_with_version_as_substring() {
        let file = manifest_with(
            "app_version = \"9.9.9\"\nversioning = \"strict\"\nversion = \"0.2.0\"\n",
        );
        assert_eq!(extract_version(file.path()).unwrap(), "0.2.0");
    }

    #[test]
    fn first_declaration_wins() {
        let file = manifest_with("version = \"1.0.0\"\nversion = \"2.0.0\"\n");
        assert_eq!(extract_version(file.path()).unwrap(), "1.0.0");
    }

    #[test]
    fn fails_without_version_line() {
        let file = manifest_with("[package]\nname = \"flua\"\n");
        let err = extract_version(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::ManifestParse { .. }));
    }

    #[test]
    fn fails_on_missing_file() {
        let err = extract_version(Path::new("/nonexistent/Cargo.toml")).unwrap_err();
        assert!(matches!(err, PipelineError::ManifestParse { .. }));
    }
}
