//! Optional `guidecheck.toml` project file.
//!
//! Precedence: CLI flags > config file > library defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use guidecheck::{CheckConfig, FsSourceConfig, Severity};
use serde::Deserialize;

/// Name of the config file picked up from the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "guidecheck.toml";

/// Settings read from the TOML file. Every field is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Scan roots used when none are given on the command line.
    pub paths: Vec<PathBuf>,
    pub exclude: Vec<String>,
    pub reference: Option<String>,
    pub fuzzy_threshold: Option<usize>,
    /// `info`, `warning` or `error`.
    pub drift_severity: Option<String>,
    pub skip_languages: Vec<String>,
    /// alias -> canonical language
    pub language_aliases: BTreeMap<String, String>,
    pub report_untagged: Option<bool>,
    pub document_budget_ms: Option<u64>,
    pub strict: Option<bool>,
    pub max_file_size: Option<u64>,
    pub follow_links: Option<bool>,
}

impl FileConfig {
    /// Load `explicit` if given, otherwise `guidecheck.toml` from the current
    /// directory if it exists, otherwise defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid config.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::read(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::read(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML or unknown keys.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Core check config with file values applied over the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `drift_severity` is not a known severity.
    pub fn check_config(&self) -> anyhow::Result<CheckConfig> {
        let mut config = CheckConfig::default();
        config.reference.clone_from(&self.reference);
        if let Some(threshold) = self.fuzzy_threshold {
            config.fuzzy_threshold = threshold;
        }
        if let Some(raw) = &self.drift_severity {
            config.drift_severity = raw.parse::<Severity>()?;
        }
        config.skip_languages.clone_from(&self.skip_languages);
        config.language_aliases.clone_from(&self.language_aliases);
        if let Some(report_untagged) = self.report_untagged {
            config.report_untagged = report_untagged;
        }
        if let Some(ms) = self.document_budget_ms {
            config.document_budget = Duration::from_millis(ms);
        }
        Ok(config)
    }

    /// Filesystem source config with file values applied over the defaults.
    #[must_use]
    pub fn fs_config(&self) -> FsSourceConfig {
        let mut config = FsSourceConfig::default();
        config.paths.clone_from(&self.paths);
        config.exclude.clone_from(&self.exclude);
        if let Some(max) = self.max_file_size {
            config.max_file_size = max;
        }
        if let Some(follow) = self.follow_links {
            config.follow_links = follow;
        }
        config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(FileConfig::parse("").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_values_flow_into_configs() {
        let file = FileConfig::parse(
            r#"
paths = ["guides"]
exclude = ["drafts/*"]
reference = "en"
fuzzy_threshold = 2
drift_severity = "error"
skip_languages = ["php"]
document_budget_ms = 250

[language_aliases]
golang = "go"
"#,
        )
        .unwrap();

        let check = file.check_config().unwrap();
        assert_eq!(check.reference.as_deref(), Some("en"));
        assert_eq!(check.fuzzy_threshold, 2);
        assert_eq!(check.drift_severity, Severity::Error);
        assert_eq!(check.skip_languages, vec!["php".to_owned()]);
        assert_eq!(check.document_budget, Duration::from_millis(250));
        assert_eq!(check.language_aliases.get("golang").map(String::as_str), Some("go"));

        let fs = file.fs_config();
        assert_eq!(fs.paths, vec![PathBuf::from("guides")]);
        assert_eq!(fs.exclude, vec!["drafts/*".to_owned()]);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(FileConfig::parse("refrence = \"en\"\n").is_err());
    }

    #[test]
    fn test_bad_severity_rejected() {
        let file = FileConfig::parse("drift_severity = \"fatal\"\n").unwrap();
        let err = file.check_config().unwrap_err();
        assert!(err.to_string().contains("unknown severity"), "got: {err}");
    }
}
