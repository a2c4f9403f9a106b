//! Content security policy for the rendered surface.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Origins an embedded surface may contact.
///
/// Serializes with the camelCase keys hosts expect inside resource metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPolicy {
    /// Origins the surface may open connections to (fetch, XHR, websockets).
    #[serde(default, alias = "connect_domains")]
    pub connect_domains: Vec<String>,

    /// Origins the surface may load sub-resources from (scripts, images, fonts).
    #[serde(default, alias = "resource_domains")]
    pub resource_domains: Vec<String>,
}

impl SecurityPolicy {
    /// Parse policy from TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))
    }

    /// Allow-lists needed by the Google Maps JavaScript widget.
    pub fn maps() -> Self {
        Self {
            connect_domains: vec![
                "https://maps.googleapis.com".to_string(),
                "https://maps.gstatic.com".to_string(),
                "https://lh3.googleusercontent.com".to_string(),
                "https://*.googleapis.com".to_string(),
            ],
            resource_domains: vec![
                "https://maps.googleapis.com".to_string(),
                "https://maps.gstatic.com".to_string(),
                "https://fonts.googleapis.com".to_string(),
                "https://fonts.gstatic.com".to_string(),
                "https://lh3.googleusercontent.com".to_string(),
                "https://*.googleapis.com".to_string(),
                // Street view imagery
                "https://*.ggpht.com".to_string(),
            ],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.connect_domains.is_empty() && self.resource_domains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_policy_lists() {
        let policy = SecurityPolicy::maps();
        assert_eq!(policy.connect_domains.len(), 4);
        assert_eq!(policy.resource_domains.len(), 7);
        assert!(policy.resource_domains.contains(&"https://*.ggpht.com".to_string()));
    }

    #[test]
    fn test_serializes_camel_case() {
        let policy = SecurityPolicy {
            connect_domains: vec!["https://a.example".to_string()],
            resource_domains: vec![],
        };
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "connectDomains": ["https://a.example"],
                "resourceDomains": []
            })
        );
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
connect_domains = ["https://api.example.com"]
resourceDomains = ["https://cdn.example.com", "https://*.example.net"]
"#;
        let policy = SecurityPolicy::parse(toml).unwrap();
        assert_eq!(policy.connect_domains, vec!["https://api.example.com"]);
        assert_eq!(policy.resource_domains.len(), 2);
    }

    #[test]
    fn test_parse_empty_defaults() {
        let policy = SecurityPolicy::parse("").unwrap();
        assert!(policy.is_empty());
    }

    #[test]
    fn test_parse_rejects_wrong_type() {
        let err = SecurityPolicy::parse("connect_domains = 5").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
