//! Configuration loader for the evomark toolchain.
//!
//! `defaults/evomark.default.toml` is embedded into the binary so that docs and runtime
//! behavior stay in sync. User files are layered on top through [`Loader`] before
//! deserializing into [`EvomarkConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../../defaults/evomark.default.toml");

/// Top-level configuration consumed by evomark applications.
#[derive(Debug, Clone, Deserialize)]
pub struct EvomarkConfig {
    pub formatting: FormattingConfig,
    pub exec: ExecConfig,
    pub logging: LoggingConfig,
}

/// Mirrors the knobs exposed by the pretty-printer.
#[derive(Debug, Clone, Deserialize)]
pub struct FormattingConfig {
    pub indent_string: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecConfig {
    /// File holding the persisted cache and saved-variable tables
    pub state_file: PathBuf,
    /// Write the tables back after a successful pass
    pub persist: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive
    pub level: String,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (used for CLI flags).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<EvomarkConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<EvomarkConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.formatting.indent_string, "  ");
        assert_eq!(config.exec.state_file, PathBuf::from(".evomark-state.json"));
        assert!(config.exec.persist);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("exec.persist", false)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert!(!config.exec.persist);
    }

    #[test]
    fn layers_user_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[formatting]\nindent_string = \"\\t\"").unwrap();
        let config = Loader::new().with_file(file.path()).build().unwrap();
        assert_eq!(config.formatting.indent_string, "\t");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn missing_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("/nonexistent/evomark.toml")
            .build()
            .unwrap();
        assert!(config.exec.persist);
    }
}
