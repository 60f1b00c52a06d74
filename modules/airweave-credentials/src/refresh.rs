//! OAuth token refresh over HTTP (spec §4.9): "call the source-specific
//! token endpoint with the client_id/client_secret from the source's auth
//! settings".

use serde::Deserialize;
use serde_json::json;

use airweave_common::AirweaveError;

use crate::catalog::{ClientCredentialLocation, ContentType, OAuthCatalogEntry};

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedToken {
    pub access_token: String,
    /// Present only for `oauth_with_rotating_refresh` providers, which
    /// issue a new refresh token on every use.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Exchanges a stored refresh token for a new access token. Errors surface
/// as `AirweaveError::TokenRefresh` per spec §7's TokenRefresh error kind.
pub async fn refresh_access_token(
    client: &reqwest::Client,
    entry: &OAuthCatalogEntry,
    backend_url: &str,
    refresh_token: &str,
) -> Result<RefreshedToken, AirweaveError> {
    let client_id = entry
        .client_id
        .as_deref()
        .ok_or_else(|| AirweaveError::Config("oauth catalog entry missing client_id".into()))?;
    let client_secret = entry
        .client_secret
        .as_deref()
        .ok_or_else(|| AirweaveError::Config("oauth catalog entry missing client_secret".into()))?;

    let mut request = client.post(backend_url);
    let in_header = matches!(entry.client_credential_location, Some(ClientCredentialLocation::Header));
    if in_header {
        request = request.basic_auth(client_id, Some(client_secret));
    }

    let grant_type = entry.grant_type.as_deref().unwrap_or("refresh_token");
    let body_fields: Vec<(&str, &str)> = if in_header {
        vec![("grant_type", grant_type), ("refresh_token", refresh_token)]
    } else {
        vec![
            ("grant_type", grant_type),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ]
    };

    let response = match entry.content_type {
        Some(ContentType::FormUrlencoded) => request.form(&body_fields),
        _ => {
            let mut map = serde_json::Map::new();
            for (k, v) in &body_fields {
                map.insert((*k).to_string(), json!(v));
            }
            request.json(&map)
        }
    }
    .send()
    .await
    .map_err(|e| AirweaveError::TokenRefresh(format!("token endpoint request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AirweaveError::TokenRefresh(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<RefreshedToken>()
        .await
        .map_err(|e| AirweaveError::TokenRefresh(format!("malformed token response: {e}")))
}
