//! Configuration file support for typegraph.
//!
//! Project settings live in a `.typegraph/` directory:
//! - `.typegraph/config.toml` - Configuration file
//! - `.typegraph/output/` - Analysis runs, one timestamped directory each
//!
//! Config discovery searches for `.typegraph/config.toml` starting from the
//! current directory and walking up to parent directories.

use std::path::{Path, PathBuf};

/// The typegraph data directory name.
pub const TYPEGRAPH_DIR: &str = ".typegraph";
/// The config file name within the typegraph directory.
pub const CONFIG_FILE: &str = "config.toml";

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use typegraph_core::Language;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Project settings.
    pub project: ProjectConfig,
    /// Output settings.
    pub output: OutputConfig,
    /// Source scanning settings.
    pub scan: ScanConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Project configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Root directory of the sources to analyze.
    pub root: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives analysis runs.
    pub root: PathBuf,
    /// Write each run into a fresh timestamped subdirectory.
    pub run_subdir: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            // Relative to .typegraph/ directory
            root: PathBuf::from("output"),
            run_subdir: true,
        }
    }
}

/// Source scanning configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// File extensions to analyze.
    pub extensions: Vec<String>,
    /// Skip files excluded by `.gitignore`.
    pub respect_gitignore: bool,
    /// Descend into hidden directories.
    pub include_hidden: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["cs".to_string(), "java".to_string()],
            respect_gitignore: false,
            include_hidden: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also log to `typegraph.log` inside the run directory.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { file: true }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Find and load configuration from current or parent directories.
    pub fn find_and_load() -> Result<Option<(Self, PathBuf)>> {
        let current = std::env::current_dir()?;
        Self::find_and_load_from(&current)
    }

    /// Find and load configuration starting from a specific directory.
    ///
    /// Looks for `.typegraph/config.toml` in the directory and its parents and
    /// returns the config together with its `.typegraph` directory.
    pub fn find_and_load_from(start: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start.to_path_buf();

        loop {
            let typegraph_dir = dir.join(TYPEGRAPH_DIR);
            let config_path = typegraph_dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::from_file(&config_path)?;
                return Ok(Some((config, typegraph_dir)));
            }

            if !dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Resolve the source root relative to the .typegraph directory.
    pub fn resolve_project_root(&self, typegraph_dir: Option<&Path>) -> PathBuf {
        match typegraph_dir {
            Some(dir) if self.project.root.is_relative() => dir.join(&self.project.root),
            _ => self.project.root.clone(),
        }
    }

    /// Resolve the output root relative to the .typegraph directory.
    pub fn resolve_output_root(&self, typegraph_dir: Option<&Path>) -> PathBuf {
        if self.output.root.is_absolute() {
            self.output.root.clone()
        } else if let Some(dir) = typegraph_dir {
            dir.join(&self.output.root)
        } else {
            // Fall back to .typegraph in current directory
            PathBuf::from(TYPEGRAPH_DIR).join(&self.output.root)
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigValidationError {}

impl Config {
    /// Validate the configuration.
    ///
    /// Returns a list of validation errors if any are found.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.scan.extensions.is_empty() {
            errors.push(ConfigValidationError {
                field: "scan.extensions".to_string(),
                message: "At least one source extension is required.".to_string(),
            });
        }

        for ext in &self.scan.extensions {
            if Language::from_extension(ext.trim_start_matches('.')).is_none() {
                errors.push(ConfigValidationError {
                    field: "scan.extensions".to_string(),
                    message: format!(
                        "Unsupported extension '{}'. Expected one of: {}.",
                        ext,
                        Language::supported_extensions().join(", ")
                    ),
                });
            }
        }

        if self.output.root.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "output.root".to_string(),
                message: "Output root cannot be empty.".to_string(),
            });
        }

        errors
    }
}

/// Commented config written by `typegraph init`.
pub const DEFAULT_CONFIG: &str = r#"# typegraph configuration
# All paths are relative to this .typegraph/ directory unless absolute

[project]
root = ".."  # Parent directory (the actual project root)

[output]
root = "output"    # Runs are written below .typegraph/output/
run_subdir = true  # One timestamped directory per run

[scan]
extensions = ["cs", "java"]
respect_gitignore = false
include_hidden = false

[logging]
file = true  # Also write typegraph.log into the run directory
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.project.root, PathBuf::from("."));
        assert_eq!(config.output.root, PathBuf::from("output"));
        assert!(config.output.run_subdir);
        assert_eq!(config.scan.extensions, vec!["cs", "java"]);
        assert!(!config.scan.respect_gitignore);
        assert!(config.logging.file);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
[scan]
extensions = ["cs"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.scan.extensions, vec!["cs"]);
        // Defaults should still apply
        assert!(config.output.run_subdir);
        assert!(!config.scan.include_hidden);
    }

    #[test]
    fn test_default_config_template_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.project.root, PathBuf::from(".."));
        assert_eq!(config.output.root, PathBuf::from("output"));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_resolve_paths() {
        let config = Config::default();
        let typegraph_dir = PathBuf::from("/project/.typegraph");
        assert_eq!(
            config.resolve_output_root(Some(&typegraph_dir)),
            PathBuf::from("/project/.typegraph/output")
        );
        assert_eq!(
            config.resolve_output_root(None),
            PathBuf::from(".typegraph/output")
        );
        assert_eq!(
            config.resolve_project_root(Some(&typegraph_dir)),
            PathBuf::from("/project/.typegraph/.")
        );

        let mut absolute = Config::default();
        absolute.project.root = PathBuf::from("/src");
        absolute.output.root = PathBuf::from("/out");
        assert_eq!(absolute.resolve_project_root(Some(&typegraph_dir)), PathBuf::from("/src"));
        assert_eq!(absolute.resolve_output_root(Some(&typegraph_dir)), PathBuf::from("/out"));
    }

    #[test]
    fn test_validate_extensions() {
        let mut config = Config::default();
        config.scan.extensions = vec!["cs".into(), "py".into()];
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "scan.extensions");
        assert!(errors[0].to_string().contains("'py'"));

        config.scan.extensions.clear();
        assert!(config.validate().iter().any(|e| e.field == "scan.extensions"));
    }

    #[test]
    fn test_find_and_load_from_parent() {
        let dir = tempdir().unwrap();
        let typegraph_dir = dir.path().join(TYPEGRAPH_DIR);
        std::fs::create_dir_all(&typegraph_dir).unwrap();
        std::fs::write(typegraph_dir.join(CONFIG_FILE), "[output]\nrun_subdir = false\n").unwrap();

        let nested = dir.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, found) = Config::find_and_load_from(&nested).unwrap().unwrap();
        assert_eq!(found, typegraph_dir);
        assert!(!config.output.run_subdir);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[scan\nextensions = 1").unwrap();
        assert!(Config::from_file(&path).is_err());
    }
}
