//! Configuration loading from gmp.toml.

use policy::SecurityPolicy;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server identity and asset location.
    #[serde(default)]
    pub server: ServerConfig,

    /// Origins the map surface may contact. A list left out of `[csp]` keeps
    /// the Maps defaults.
    #[serde(default = "SecurityPolicy::maps", deserialize_with = "csp_section")]
    pub csp: SecurityPolicy,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CspSection {
    #[serde(default, alias = "connect_domains")]
    connect_domains: Option<Vec<String>>,
    #[serde(default, alias = "resource_domains")]
    resource_domains: Option<Vec<String>>,
}

fn csp_section<'de, D>(deserializer: D) -> Result<SecurityPolicy, D::Error>
where
    D: Deserializer<'de>,
{
    let section = CspSection::deserialize(deserializer)?;
    let defaults = SecurityPolicy::maps();
    Ok(SecurityPolicy {
        connect_domains: section.connect_domains.unwrap_or(defaults.connect_domains),
        resource_domains: section
            .resource_domains
            .unwrap_or(defaults.resource_domains),
    })
}

/// Server section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Directory holding the built `mcp-app.html`.
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            asset_dir: default_asset_dir(),
        }
    }
}

fn default_name() -> String {
    "Google Maps Server".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_asset_dir() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            csp: SecurityPolicy::maps(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.name, "Google Maps Server");
        assert_eq!(config.server.asset_dir, PathBuf::from("dist"));
        assert_eq!(config.csp, SecurityPolicy::maps());
    }

    #[test]
    fn overrides_sections() {
        let config = Config::parse(
            r#"
[server]
asset_dir = "/srv/gmp"

[csp]
connect_domains = ["https://tiles.example.com"]
"#,
        )
        .unwrap();
        assert_eq!(config.server.asset_dir, PathBuf::from("/srv/gmp"));
        assert_eq!(config.server.version, "1.0.0");
        assert_eq!(config.csp.connect_domains, vec!["https://tiles.example.com"]);
        assert_eq!(
            config.csp.resource_domains,
            SecurityPolicy::maps().resource_domains
        );
    }

    #[test]
    fn csp_lists_override_independently() {
        let config = Config::parse(
            r#"
[csp]
resourceDomains = []
"#,
        )
        .unwrap();
        assert!(config.csp.resource_domains.is_empty());
        assert_eq!(
            config.csp.connect_domains,
            SecurityPolicy::maps().connect_domains
        );

        let config = Config::parse("[csp]
").unwrap();
        assert_eq!(config.csp, SecurityPolicy::maps());
    }

    #[test]
    fn parse_error() {
        let err = Config::parse("[server\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
