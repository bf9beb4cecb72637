//! GitHub OAuth web flow

use crate::error::GitHubError;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Default OAuth base
pub const GITHUB_OAUTH_BASE: &str = "https://github.com/login/oauth";

/// Scopes requested at login
pub const DEFAULT_SCOPE: &str = "repo,user";

/// OAuth application credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthApp {
    /// Client id
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Redirect URI registered for the app
    pub callback_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// OAuth authorize/exchange client
#[derive(Debug, Clone)]
pub struct GitHubOAuth {
    http: reqwest::Client,
    app: OAuthApp,
    oauth_base: String,
}

impl GitHubOAuth {
    /// Create client against github.com
    #[must_use]
    pub fn new(app: OAuthApp) -> Self {
        Self {
            http: reqwest::Client::new(),
            app,
            oauth_base: GITHUB_OAUTH_BASE.to_string(),
        }
    }

    /// With OAuth base URL
    #[must_use]
    pub fn with_oauth_base(mut self, base: impl Into<String>) -> Self {
        self.oauth_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Browser redirect target for the login step
    ///
    /// # Errors
    /// - `GitHubError::OAuth` if the configured base is not a URL
    pub fn authorize_url(&self, scope: &str) -> Result<String, GitHubError> {
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.oauth_base),
            &[
                ("client_id", self.app.client_id.as_str()),
                ("redirect_uri", self.app.callback_url.as_str()),
                ("scope", scope),
            ],
        )
        .map_err(|e| GitHubError::OAuth(e.to_string()))?;
        Ok(url.into())
    }

    /// Exchange an authorization code for an access token
    ///
    /// # Errors
    /// - `GitHubError::OAuth` if GitHub answers without a token
    pub async fn exchange_code(&self, code: &str) -> Result<String, GitHubError> {
        let response = self
            .http
            .post(format!("{}/access_token", self.oauth_base))
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, "casegen")
            .form(&[
                ("client_id", self.app.client_id.as_str()),
                ("client_secret", self.app.client_secret.as_str()),
                ("code", code),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GitHubError::OAuth(format!("token endpoint returned {status}: {body}")));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        match token.access_token {
            Some(t) if !t.is_empty() => {
                tracing::info!("exchanged oauth code for access token");
                Ok(t)
            }
            _ => Err(GitHubError::OAuth(
                token
                    .error_description
                    .or(token.error)
                    .unwrap_or_else(|| "Failed to retrieve access token".to_string()),
            )),
        }
    }
}
