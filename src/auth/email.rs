//! OTP delivery for the email OTP plugin.
//!
//! The auth service generates and expires the codes; delivering them is the
//! injected callback this module provides. Delivery goes through the
//! [`EmailSender`] trait so the transport can be swapped: [`SmtpSender`] for
//! real mail, [`LogSender`] for local dev.

use crate::client::OtpPurpose;
use anyhow::{Context, Result};
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use secrecy::{ExposeSecret, SecretString};
use std::{env, sync::Arc};
use tracing::{debug, info};

/// Sender used when `SMTP_FROM` is not set.
pub const DEFAULT_FROM: &str = "Entrata <no-reply@example.com>";

/// Implicit-TLS SMTP port; everything else starts plain and upgrades.
const SMTPS_PORT: u16 = 465;

const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Email delivery abstraction used by the OTP plugin.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error.
    ///
    /// # Errors
    /// Returns an error if delivery fails.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogSender;

impl EmailSender for LogSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            text = %message.text,
            "email send stub"
        );

        Ok(())
    }
}

/// SMTP transport settings, environment-provided.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS, true exactly for port 465.
    pub secure: bool,
    pub user: Option<String>,
    pub pass: Option<SecretString>,
    pub from: String,
}

impl SmtpConfig {
    /// Read `SMTP_HOST`, `SMTP_PORT` (default 587), `SMTP_USER`, `SMTP_PASS`
    /// and `SMTP_FROM` (default [`DEFAULT_FROM`]).
    ///
    /// # Errors
    /// Returns an error if `SMTP_HOST` is not set.
    pub fn from_env() -> Result<Self> {
        let host = env::var("SMTP_HOST").context("SMTP_HOST not set")?;

        let port = env::var("SMTP_PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(DEFAULT_SMTP_PORT);

        Ok(Self {
            host,
            port,
            secure: port == SMTPS_PORT,
            user: env::var("SMTP_USER").ok(),
            pass: env::var("SMTP_PASS").ok().map(SecretString::from),
            from: env::var("SMTP_FROM").unwrap_or_else(|_| DEFAULT_FROM.to_string()),
        })
    }
}

/// Real SMTP delivery via lettre.
pub struct SmtpSender {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpSender {
    /// # Errors
    /// Returns an error if the relay cannot be configured or the from
    /// address does not parse.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let builder = if config.secure {
            SmtpTransport::relay(&config.host)?
        } else {
            SmtpTransport::starttls_relay(&config.host)?
        };

        let mut builder = builder.port(config.port);

        if let (Some(user), Some(pass)) = (&config.user, &config.pass) {
            builder = builder.credentials(Credentials::new(
                user.clone(),
                pass.expose_secret().to_string(),
            ));
        }

        let from = config.from.parse().context("invalid SMTP_FROM address")?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl EmailSender for SmtpSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(message.to.parse().context("invalid recipient address")?)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                message.html.clone(),
            ))?;

        self.transport.send(&email).context("SMTP send failed")?;

        Ok(())
    }
}

/// The email OTP plugin: holds the injected sender and formats the
/// verification message for it.
#[derive(Clone)]
pub struct EmailOtp {
    sender: Arc<dyn EmailSender>,
}

impl EmailOtp {
    #[must_use]
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    /// The injected "send verification OTP" callback.
    ///
    /// # Errors
    /// Returns an error if delivery fails.
    pub fn send_verification_otp(
        &self,
        email: &str,
        otp: &str,
        purpose: OtpPurpose,
    ) -> Result<()> {
        debug!(purpose = purpose.as_str(), "sending verification OTP");

        self.sender.send(&verification_message(email, otp))
    }
}

#[must_use]
pub fn verification_message(email: &str, otp: &str) -> EmailMessage {
    EmailMessage {
        to: email.to_string(),
        subject: "Your OTP Code".to_string(),
        text: format!("Your OTP is {otp}"),
        html: format!("<p>Your OTP is <b>{otp}</b></p>"),
    }
}
