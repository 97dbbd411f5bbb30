//! Runtime settings for hook evaluation.
//!
//! [`Config`] controls which Subversion programs are run, how mail is
//! delivered and where the log goes. Use [`Config::default()`] when no
//! settings file exists.
//!
//! # Settings file: `.svnhookrc`
//!
//! - **Global**: `~/.svnhookrc`
//! - **Local**: `.svnhookrc` next to the rule document, overrides global
//!
//! ```toml
//! svnlook = "/usr/local/bin/svnlook"
//! log_level = "debug"
//! log_file = "/var/log/svn/hooks.log"
//! smtp_timeout = 30
//! smtp_port = 2525
//! ```
//!
//! All fields are optional.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const FILE_NAME: &str = ".svnhookrc";

/// TOML-friendly intermediate representation (all fields optional).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    svnlook: Option<String>,
    svn: Option<String>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    /// Mail delivery timeout in seconds.
    smtp_timeout: Option<u64>,
    smtp_port: Option<u16>,
}

impl ConfigFile {
    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn apply(self, config: &mut Config) {
        if let Some(svnlook) = self.svnlook {
            config.svnlook = svnlook;
        }
        if let Some(svn) = self.svn {
            config.svn = svn;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if self.log_file.is_some() {
            config.log_file = self.log_file;
        }
        if let Some(secs) = self.smtp_timeout {
            config.smtp_timeout = Duration::from_secs(secs);
        }
        if let Some(port) = self.smtp_port {
            config.smtp_port = port;
        }
    }
}

/// Runtime settings.
///
/// # Defaults
///
/// | Setting | Default |
/// |---------|---------|
/// | `svnlook` | `"svnlook"` |
/// | `svn` | `"svn"` |
/// | `log_level` | `"info"` |
/// | `log_file` | `None` (next to the rule document) |
/// | `smtp_timeout` | 60 s |
/// | `smtp_port` | 25 |
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Program used for repository queries.
    pub svnlook: String,
    /// Program used for `svn log`.
    pub svn: String,
    /// Maximum log level (`error`, `warn`, `info`, `debug`, `trace`).
    pub log_level: String,
    /// Log destination. `None` means a `.log` file beside the rule document.
    pub log_file: Option<PathBuf>,
    /// Default timeout for mail actions without a `seconds` attribute.
    pub smtp_timeout: Duration,
    /// Default port for mail actions without a `port` attribute.
    pub smtp_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            svnlook: "svnlook".to_string(),
            svn: "svn".to_string(),
            log_level: "info".to_string(),
            log_file: None,
            smtp_timeout: Duration::from_secs(60),
            smtp_port: 25,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads settings by merging `~/.svnhookrc` and `<config_dir>/.svnhookrc`.
    ///
    /// An unreadable global file is ignored; a broken local file is an error.
    pub fn load(config_dir: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global) = Self::find_global_config() {
            if let Ok(file) = ConfigFile::read(&global) {
                file.apply(&mut config);
            }
        }

        let local = config_dir.as_ref().join(FILE_NAME);
        if local.is_file() {
            ConfigFile::read(&local)?.apply(&mut config);
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        ConfigFile::read(path)?.apply(&mut config);
        Ok(config)
    }

    /// Parses settings from a TOML string.
    pub fn from_str(toml_str: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(toml_str).context("Failed to parse settings")?;
        let mut config = Self::default();
        file.apply(&mut config);
        Ok(config)
    }

    fn find_global_config() -> Option<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(FILE_NAME))
            .filter(|p| p.is_file())
    }

    /// Where the log goes for a rule document at `config_path`.
    pub fn log_path(&self, config_path: &Path) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| config_path.with_extension("log"))
    }

    /// Builder: set the `svnlook` program.
    pub fn with_svnlook(mut self, program: impl Into<String>) -> Self {
        self.svnlook = program.into();
        self
    }

    /// Builder: set the `svn` program.
    pub fn with_svn(mut self, program: impl Into<String>) -> Self {
        self.svn = program.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_smtp_timeout(mut self, timeout: Duration) -> Self {
        self.smtp_timeout = timeout;
        self
    }

    pub fn with_smtp_port(mut self, port: u16) -> Self {
        self.smtp_port = port;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.svnlook, "svnlook");
        assert_eq!(cfg.svn, "svn");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.log_file.is_none());
        assert_eq!(cfg.smtp_timeout, Duration::from_secs(60));
        assert_eq!(cfg.smtp_port, 25);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            svnlook = "/opt/svn/bin/svnlook"
            svn = "/opt/svn/bin/svn"
            log_level = "debug"
            log_file = "/var/log/hooks.log"
            smtp_timeout = 5
            smtp_port = 2525
        "#;
        let cfg = Config::from_str(toml).unwrap();
        assert_eq!(cfg.svnlook, "/opt/svn/bin/svnlook");
        assert_eq!(cfg.svn, "/opt/svn/bin/svn");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.log_file, Some(PathBuf::from("/var/log/hooks.log")));
        assert_eq!(cfg.smtp_timeout, Duration::from_secs(5));
        assert_eq!(cfg.smtp_port, 2525);
    }

    #[test]
    fn test_parse_partial_config() {
        let cfg = Config::from_str("smtp_port = 587").unwrap();
        assert_eq!(cfg.smtp_port, 587);
        assert_eq!(cfg.svnlook, "svnlook");
        assert_eq!(cfg.smtp_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_parse_empty_config() {
        assert_eq!(Config::from_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_str("smtp_server = \"mail\"").is_err());
    }

    #[test]
    fn test_local_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".svnhookrc"), "log_level = \"warn\"\n").unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn test_broken_local_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".svnhookrc"), "smtp_port = \"x\"\n").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn test_log_path() {
        let cfg = Config::default();
        assert_eq!(
            cfg.log_path(Path::new("/srv/repo/hooks/pre-commit.xml")),
            PathBuf::from("/srv/repo/hooks/pre-commit.log")
        );

        let cfg = Config {
            log_file: Some(PathBuf::from("/tmp/all.log")),
            ..Config::default()
        };
        assert_eq!(cfg.log_path(Path::new("/x.xml")), PathBuf::from("/tmp/all.log"));
    }

    #[test]
    fn test_builder_methods() {
        let cfg = Config::new()
            .with_svnlook("look")
            .with_svn("svn2")
            .with_log_level("trace")
            .with_smtp_timeout(Duration::from_secs(9))
            .with_smtp_port(26);
        assert_eq!(cfg.svnlook, "look");
        assert_eq!(cfg.svn, "svn2");
        assert_eq!(cfg.log_level, "trace");
        assert_eq!(cfg.smtp_timeout, Duration::from_secs(9));
        assert_eq!(cfg.smtp_port, 26);
    }
}
