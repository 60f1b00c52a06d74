//! OAuth settings catalog (spec §4.9/§6): a YAML document keyed by source
//! `short_name`, loaded once at startup alongside `Config`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use airweave_common::AirweaveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthType {
    AccessOnly,
    WithRefresh,
    WithRotatingRefresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Json,
    #[serde(rename = "application/x-www-form-urlencoded")]
    FormUrlencoded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientCredentialLocation {
    Header,
    Body,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthCatalogEntry {
    pub oauth_type: Option<OAuthType>,
    pub url: Option<String>,
    pub backend_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
    #[serde(default)]
    pub grant_type: Option<String>,
    #[serde(default)]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub client_credential_location: Option<ClientCredentialLocation>,
    #[serde(default)]
    pub requires_pkce: bool,
    /// Self-hosted providers carry `{instance_url}`-style placeholders in
    /// `url`/`backend_url`; set when the entry needs per-connection
    /// substitution before use.
    #[serde(default)]
    pub url_template: bool,
}

impl OAuthCatalogEntry {
    /// Entries with no `oauth_type` are `direct` auth (API key / config
    /// struct) per spec §4.9.
    pub fn is_direct(&self) -> bool {
        self.oauth_type.is_none()
    }

    /// Substitutes `{placeholder}` tokens in `url`/`backend_url` with values
    /// from `params` (e.g. `instance_url` for self-hosted providers).
    pub fn resolve_urls(&self, params: &HashMap<String, String>) -> (Option<String>, Option<String>) {
        if !self.url_template {
            return (self.url.clone(), self.backend_url.clone());
        }
        (
            self.url.as_deref().map(|u| substitute(u, params)),
            self.backend_url.as_deref().map(|u| substitute(u, params)),
        )
    }
}

fn substitute(template: &str, params: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in params {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCatalog {
    #[serde(flatten)]
    entries: HashMap<String, OAuthCatalogEntry>,
}

impl OAuthCatalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AirweaveError> {
        let raw = fs::read_to_string(path.as_ref())
            .map_err(|e| AirweaveError::Config(format!("reading oauth catalog: {e}")))?;
        serde_yaml::from_str(&raw).map_err(|e| AirweaveError::Config(format!("parsing oauth catalog: {e}")))
    }

    pub fn get(&self, short_name: &str) -> Option<&OAuthCatalogEntry> {
        self.entries.get(short_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG_YAML: &str = r#"
asana:
  oauth_type: with_refresh
  url: https://app.asana.com/-/oauth_authorize
  backend_url: https://app.asana.com/-/oauth_token
  client_id: asana-client-id
  client_secret: asana-client-secret
  scope: default
  grant_type: authorization_code
  content_type: application/json
  client_credential_location: body
  requires_pkce: false

github_enterprise:
  oauth_type: with_rotating_refresh
  url: "https://{instance_url}/login/oauth/authorize"
  backend_url: "https://{instance_url}/login/oauth/access_token"
  client_id: gh-client-id
  client_secret: gh-client-secret
  url_template: true

stripe:
  description: direct API key auth, no oauth_type entry
"#;

    #[test]
    fn parses_with_refresh_entry() {
        let catalog: OAuthCatalog = serde_yaml::from_str(CATALOG_YAML).unwrap();
        let asana = catalog.get("asana").unwrap();
        assert_eq!(asana.oauth_type, Some(OAuthType::WithRefresh));
        assert_eq!(asana.client_credential_location, Some(ClientCredentialLocation::Body));
        assert!(!asana.is_direct());
    }

    #[test]
    fn resolves_url_template_placeholders() {
        let catalog: OAuthCatalog = serde_yaml::from_str(CATALOG_YAML).unwrap();
        let entry = catalog.get("github_enterprise").unwrap();

        let mut params = HashMap::new();
        params.insert("instance_url".to_string(), "git.example.com".to_string());
        let (url, backend_url) = entry.resolve_urls(&params);

        assert_eq!(url.unwrap(), "https://git.example.com/login/oauth/authorize");
        assert_eq!(backend_url.unwrap(), "https://git.example.com/login/oauth/access_token");
    }

    #[test]
    fn entry_with_no_oauth_type_is_direct() {
        let catalog: OAuthCatalog = serde_yaml::from_str(CATALOG_YAML).unwrap();
        assert!(catalog.get("stripe").unwrap().is_direct());
    }
}
