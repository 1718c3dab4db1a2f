//! HTTP implementation of [`AuthClient`] against the authentication service's
//! REST surface.

use crate::client::{AuthClient, AuthError, OtpPurpose, SocialProvider};
use crate::APP_USER_AGENT;
use anyhow::Result;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    base_url: Url,
    client: Client,
}

impl HttpAuthClient {
    /// Build a client for the service rooted at `base_url`,
    /// example: `https://app.tld/api/auth`
    ///
    /// # Errors
    /// Returns an error if the URL does not parse or the HTTP client cannot
    /// be constructed.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;

        // Joining endpoints replaces the last path segment unless the base
        // ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().user_agent(APP_USER_AGENT).build()?;

        Ok(Self { base_url, client })
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, AuthError> {
        self.base_url
            .join(endpoint)
            .map_err(|e| AuthError::Transport(Some(e.to_string())))
    }

    async fn post_json(&self, endpoint: &str, payload: &Value) -> Result<Value, AuthError> {
        let url = self.endpoint_url(endpoint)?;

        debug!("endpoint URL: {}", url);

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| AuthError::Transport(Some(e.to_string())))?;

        read_body(response).await
    }
}

async fn read_body(response: Response) -> Result<Value, AuthError> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        Ok(body)
    } else {
        Err(auth_error_from(status, &body))
    }
}

/// Map a non-success response to the error taxonomy: a client error is a
/// rejection the user can act on, anything else is a transport failure.
fn auth_error_from(status: StatusCode, body: &Value) -> AuthError {
    let message = body["message"].as_str().map(ToString::to_string);

    if status.is_client_error() {
        AuthError::Rejected(message.unwrap_or_else(|| status.to_string()))
    } else {
        AuthError::Transport(message)
    }
}

impl AuthClient for HttpAuthClient {
    #[instrument(skip(self, password))]
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.post_json("sign-in/email", &json!({ "email": email, "password": password }))
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn send_otp(&self, email: &str, purpose: OtpPurpose) -> Result<(), AuthError> {
        self.post_json(
            "email-otp/send-verification-otp",
            &json!({ "email": email, "type": purpose.as_str() }),
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self, code))]
    async fn sign_in_with_otp(&self, email: &str, code: &str) -> Result<(), AuthError> {
        self.post_json("sign-in/email-otp", &json!({ "email": email, "otp": code }))
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn sign_in_with_social(
        &self,
        provider: SocialProvider,
        callback_url: &str,
    ) -> Result<Url, AuthError> {
        let body = self
            .post_json(
                "sign-in/social",
                &json!({ "provider": provider.as_str(), "callbackURL": callback_url }),
            )
            .await?;

        let url = body["url"]
            .as_str()
            .ok_or_else(|| AuthError::Transport(Some("no redirect URL in response".to_string())))?;

        Url::parse(url).map_err(|e| AuthError::Transport(Some(e.to_string())))
    }
}
