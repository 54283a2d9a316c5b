use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::Credentials;
use crate::launcher::DEFAULT_POLL_INTERVAL;

/// Configuration file structure for jlaunch.
///
/// Holds the Jenkins connection and output preferences so they don't have to be
/// passed on every invocation. Command-line flags and environment variables
/// override whatever is loaded here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub jenkins: JenkinsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JenkinsConfig {
    /// Jenkins base URL (e.g., 'https://ci.example.com')
    pub url: Option<String>,

    /// Jenkins username
    pub username: Option<String>,

    /// Jenkins API token
    pub token: Option<String>,

    /// Seconds between status polls while following a build
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            token: None,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

/// Connection settings after merging config file, environment and flags.
#[derive(Debug, Clone)]
pub struct JenkinsSettings {
    pub url: String,
    pub credentials: Option<Credentials>,
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path (must exist)
    /// 2. ./jlaunch.toml
    /// 3. ./jlaunch.json
    /// 4. ./jlaunch.yaml
    /// 5. ./jlaunch.yml
    /// 6. `<config dir>/jlaunch/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            return Self::load_from_path(path);
        }

        let candidates = ["jlaunch.toml", "jlaunch.json", "jlaunch.yaml", "jlaunch.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        if let Some(path) = Self::user_config_path().filter(|p| p.exists()) {
            return Self::load_from_path(&path);
        }

        Ok(Self::default())
    }

    /// Per-user config file, e.g. `~/.config/jlaunch/config.toml` on Linux.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("jlaunch").join("config.toml"))
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }

    /// Merges overrides onto the `[jenkins]` section.
    ///
    /// Credentials are only used when both username and token are known.
    pub fn resolve_jenkins(
        &self,
        url: Option<&str>,
        username: Option<&str>,
        token: Option<&str>,
    ) -> Result<JenkinsSettings> {
        let Some(url) = url
            .map(str::to_string)
            .or_else(|| self.jenkins.url.clone())
            .filter(|u| !u.trim().is_empty())
        else {
            bail!("No Jenkins URL configured (use --url, JENKINS_URL or the [jenkins] config section)");
        };

        let username = username
            .map(str::to_string)
            .or_else(|| self.jenkins.username.clone());
        let token = token.map(str::to_string).or_else(|| self.jenkins.token.clone());

        let credentials = match (username, token) {
            (Some(username), Some(token)) => Some(Credentials::new(username, token)),
            (Some(_), None) | (None, Some(_)) => {
                log::warn!("Ignoring incomplete credentials: both username and token are required");
                None
            }
            (None, None) => None,
        };

        if self.jenkins.poll_interval_secs == 0 {
            bail!("poll-interval-secs must be greater than zero");
        }

        Ok(JenkinsSettings {
            url,
            credentials,
            poll_interval: Duration::from_secs(self.jenkins.poll_interval_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.jenkins.url, None);
        assert_eq!(config.jenkins.poll_interval_secs, 2);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert!(!config.output.pretty);
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[jenkins]
url = "https://ci.example.com"
username = "alice"
token = "11aa22bb"
poll-interval-secs = 5

[output]
format = "json"
pretty = true
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.jenkins.url.as_deref(), Some("https://ci.example.com"));
        assert_eq!(config.jenkins.username.as_deref(), Some("alice"));
        assert_eq!(config.jenkins.poll_interval_secs, 5);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(
            temp_file,
            "jenkins:\n  url: https://ci.yaml.example\n  username: bob\n"
        )
        .unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.jenkins.url.as_deref(), Some("https://ci.yaml.example"));
        assert_eq!(config.jenkins.poll_interval_secs, 2);
    }

    #[test]
    fn test_load_json_config_without_extension() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, r#"{{"jenkins": {{"url": "https://ci.json.example"}}}}"#).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.jenkins.url.as_deref(), Some("https://ci.json.example"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let err = Config::load(Some(Path::new("does-not-exist.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_resolve_prefers_overrides() {
        let config = Config {
            jenkins: JenkinsConfig {
                url: Some("https://from-file".to_string()),
                username: Some("file-user".to_string()),
                token: Some("file-token".to_string()),
                poll_interval_secs: 3,
            },
            ..Config::default()
        };

        let settings = config
            .resolve_jenkins(Some("https://from-flag"), Some("flag-user"), None)
            .unwrap();

        assert_eq!(settings.url, "https://from-flag");
        let credentials = settings.credentials.unwrap();
        assert_eq!(credentials.username, "flag-user");
        assert_eq!(credentials.token.as_str(), "file-token");
        assert_eq!(settings.poll_interval, Duration::from_secs(3));
    }

    #[test]
    fn test_resolve_requires_url() {
        let err = Config::default()
            .resolve_jenkins(None, None, None)
            .unwrap_err();
        assert!(err.to_string().contains("No Jenkins URL"));
    }

    #[test]
    fn test_resolve_drops_incomplete_credentials() {
        let settings = Config::default()
            .resolve_jenkins(Some("https://ci"), Some("alice"), None)
            .unwrap();
        assert!(settings.credentials.is_none());
    }

    #[test]
    fn test_resolve_rejects_zero_interval() {
        let mut config = Config::default();
        config.jenkins.poll_interval_secs = 0;
        assert!(config.resolve_jenkins(Some("https://ci"), None, None).is_err());
    }
}
