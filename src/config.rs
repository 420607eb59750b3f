use crate::error::{CopilotError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";
pub const DEFAULT_SPRING_INITIALIZR: &str = "https://start.spring.io";
const CONFIG_ENV: &str = "CO_PILOT_CONFIG";

/// Maven repository queried for `maven-metadata.xml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositoryConfig {
    pub name: String,
    pub url: String,
    /// Regex patterns; when present only matching groups are looked up here
    #[serde(default)]
    pub group_filters: Vec<String>,
}

/// Process-wide settings, passed explicitly into the engine components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Ordered groupId prefixes owned by the organization
    pub second_party_prefixes: Vec<String>,
    /// Seed the classifier from the descriptor's own groupId when no prefixes are set
    pub infer_second_party: bool,
    pub repositories: Vec<RepositoryConfig>,
    pub spring_initializr_url: String,
    pub request_timeout_secs: u64,
    /// Let the stable channels pick pre-releases too
    pub include_prereleases: bool,
    pub allow_private_hosts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            second_party_prefixes: Vec::new(),
            infer_second_party: true,
            repositories: vec![RepositoryConfig {
                name: "Maven Central".to_string(),
                url: DEFAULT_MAVEN_CENTRAL.to_string(),
                group_filters: Vec::new(),
            }],
            spring_initializr_url: DEFAULT_SPRING_INITIALIZR.to_string(),
            request_timeout_secs: 10,
            include_prereleases: false,
            allow_private_hosts: false,
        }
    }
}

impl Config {
    /// Loads the configuration from an explicit path, `$CO_PILOT_CONFIG`, or
    /// `~/.co-pilot/config.toml`, falling back to defaults when none exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }

        match Self::default_location() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CopilotError::Configuration(format!(
                "Failed to read config '{}': {}",
                path.display(),
                e
            ))
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: Config = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    fn default_location() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".co-pilot/config.toml"))
    }

    fn validate(&self) -> Result<()> {
        if self.repositories.is_empty() {
            return Err(CopilotError::Configuration(
                "at least one repository must be configured".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(CopilotError::Configuration(
                "request-timeout-secs must be greater than zero".into(),
            ));
        }
        if let Some(blank) = self.second_party_prefixes.iter().find(|p| p.trim().is_empty()) {
            return Err(CopilotError::Configuration(format!(
                "invalid second-party prefix '{blank}'"
            )));
        }
        Ok(())
    }
}
