//! Auth Service Client: the capability set the sign-in flow consumes.
//!
//! The authentication service is an external collaborator. The flow controller
//! only needs four operations from it, expressed by [`AuthClient`]; outcomes
//! come back as a `Result` the caller pattern-matches instead of a pair of
//! success/error callbacks.

pub mod http;
pub use self::http::HttpAuthClient;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The service rejected the attempt: invalid credentials, unknown user,
    /// or an invalid/expired code. The message is shown to the user verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Network or unexpected failure; a human-readable message may be absent.
    #[error("{}", .0.as_deref().unwrap_or("transport failure"))]
    Transport(Option<String>),
}

impl AuthError {
    /// Message carried by the error, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Rejected(message) => Some(message),
            Self::Transport(message) => message.as_deref(),
        }
    }
}

/// Why an OTP is being sent; the service keys code purpose on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    SignIn,
    EmailVerification,
    ForgetPassword,
}

impl OtpPurpose {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SignIn => "sign-in",
            Self::EmailVerification => "email-verification",
            Self::ForgetPassword => "forget-password",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialProvider {
    Google,
    Github,
}

impl SocialProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
        }
    }
}

impl std::fmt::Display for SocialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations the sign-in flow requests from the authentication service.
#[allow(async_fn_in_trait)]
pub trait AuthClient {
    /// Email + password sign-in. `Ok` means a session was issued.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// Ask the service to email a one-time passcode.
    async fn send_otp(&self, email: &str, purpose: OtpPurpose) -> Result<(), AuthError>;

    /// Sign in with a previously emailed one-time passcode.
    async fn sign_in_with_otp(&self, email: &str, code: &str) -> Result<(), AuthError>;

    /// Redirect-based social sign-in. Returns the authorization URL the
    /// front-end must send the user to; the provider handles the rest.
    async fn sign_in_with_social(
        &self,
        provider: SocialProvider,
        callback_url: &str,
    ) -> Result<Url, AuthError>;
}
