//! LinkedIn publisher.
//!
//! `authenticate` exchanges the configured member credentials for an access
//! token and resolves the member URN; the returned session then posts shares
//! through the UGC API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::{Value, json};

use postline_core::ports::{PublishError, PublishSession, Publisher};

const DEFAULT_API_BASE: &str = "https://api.linkedin.com";
const RESTLI_ID_HEADER: &str = "x-restli-id";

/// LinkedIn client configuration.
#[derive(Debug, Clone)]
pub struct LinkedInConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for LinkedInConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl LinkedInConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        Self {
            username: non_empty("LINKEDIN_USERNAME"),
            password: non_empty("LINKEDIN_PASSWORD"),
            api_base: std::env::var("LINKEDIN_API_BASE").unwrap_or(defaults.api_base),
            timeout: std::env::var("LINKEDIN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
}

pub struct LinkedInPublisher {
    client: reqwest::Client,
    config: LinkedInConfig,
}

impl LinkedInPublisher {
    pub fn new(config: LinkedInConfig) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, PublishError> {
        Self::new(LinkedInConfig::from_env())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn access_token(&self, username: &str, password: &str) -> Result<String, PublishError> {
        let resp = self
            .client
            .post(self.url("/oauth/v2/accessToken"))
            .form(&[
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
            ])
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::AuthenticationRejected(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| PublishError::AuthenticationRejected(e.to_string()))?;
        Ok(token.access_token)
    }

    async fn member_urn(&self, access_token: &str) -> Result<String, PublishError> {
        let resp = self
            .client
            .get(self.url("/v2/userinfo"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::AuthenticationRejected(format!(
                "userinfo returned {status}: {body}"
            )));
        }

        let info: UserInfo = resp
            .json()
            .await
            .map_err(|e| PublishError::AuthenticationRejected(e.to_string()))?;
        Ok(format!("urn:li:person:{}", info.sub))
    }
}

#[async_trait]
impl Publisher for LinkedInPublisher {
    async fn authenticate(&self) -> Result<Box<dyn PublishSession>, PublishError> {
        let (Some(username), Some(password)) = (&self.config.username, &self.config.password)
        else {
            return Err(PublishError::MissingCredentials);
        };

        let access_token = self.access_token(username, password).await?;
        let author = self.member_urn(&access_token).await?;
        tracing::debug!(author = %author, "Authenticated with LinkedIn");

        Ok(Box::new(LinkedInSession {
            client: self.client.clone(),
            endpoint: self.url("/v2/ugcPosts"),
            access_token,
            author,
        }))
    }
}

/// One authenticated session; lives for a single worker tick.
struct LinkedInSession {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    author: String,
}

fn share_payload(author: &str, text: &str) -> Value {
    json!({
        "author": author,
        "lifecycleState": "PUBLISHED",
        "specificContent": {
            "com.linkedin.ugc.ShareContent": {
                "shareCommentary": { "text": text },
                "shareMediaCategory": "NONE"
            }
        },
        "visibility": {
            "com.linkedin.ugc.MemberNetworkVisibility": "CONNECTIONS"
        }
    })
}

/// The share id comes from the `x-restli-id` header, or the body's `id`.
fn share_id(headers: &HeaderMap, body: &str) -> Result<String, PublishError> {
    let from_header = headers
        .get(RESTLI_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    if let Some(id) = from_header {
        return Ok(id);
    }

    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("id").and_then(Value::as_str).map(str::to_string))
        .filter(|id| !id.trim().is_empty())
        .ok_or(PublishError::MissingIdentifier)
}

#[async_trait]
impl PublishSession for LinkedInSession {
    async fn publish(&self, text: &str) -> Result<String, PublishError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&share_payload(&self.author, text))
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .text()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(PublishError::Api {
                status: status.as_u16(),
                body,
            });
        }

        share_id(&headers, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_share_id_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(RESTLI_ID_HEADER, HeaderValue::from_static("urn:li:share:1"));

        let id = share_id(&headers, r#"{"id": "urn:li:share:2"}"#).unwrap();
        assert_eq!(id, "urn:li:share:1");
    }

    #[test]
    fn test_share_id_falls_back_to_body() {
        let id = share_id(&HeaderMap::new(), r#"{"id": "urn:li:share:2"}"#).unwrap();
        assert_eq!(id, "urn:li:share:2");
    }

    #[test]
    fn test_share_id_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(RESTLI_ID_HEADER, HeaderValue::from_static("  "));

        assert!(matches!(
            share_id(&headers, ""),
            Err(PublishError::MissingIdentifier)
        ));
        assert!(matches!(
            share_id(&HeaderMap::new(), r#"{"id": ""}"#),
            Err(PublishError::MissingIdentifier)
        ));
    }

    #[test]
    fn test_share_payload() {
        let payload = share_payload("urn:li:person:abc", "Hello\n\n#rust");

        assert_eq!(payload["author"], "urn:li:person:abc");
        assert_eq!(
            payload["specificContent"]["com.linkedin.ugc.ShareContent"]["shareCommentary"]["text"],
            "Hello\n\n#rust"
        );
        assert_eq!(
            payload["visibility"]["com.linkedin.ugc.MemberNetworkVisibility"],
            "CONNECTIONS"
        );
    }

    #[tokio::test]
    async fn test_authenticate_without_credentials() {
        let publisher = LinkedInPublisher::new(LinkedInConfig {
            username: Some("someone".to_string()),
            ..LinkedInConfig::default()
        })
        .unwrap();

        assert!(matches!(
            publisher.authenticate().await,
            Err(PublishError::MissingCredentials)
        ));
    }
}
