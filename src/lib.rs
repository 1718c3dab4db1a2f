//! # Entrata
//!
//! `entrata` is a thin sign-in flow for a web application: one page offering
//! password, social (OAuth), and email one-time-passcode (OTP) login. The hard
//! parts (credential verification, session issuance, OAuth handshakes, OTP
//! generation and expiry) live inside an external authentication service; this
//! crate owns the multi-step sign-in state machine, the client used to reach
//! that service, the server-side configuration the service consumes, and a
//! database connectivity diagnostic.
//!
//! ## Layout
//!
//! - [`flow`] — the sign-in flow controller: which form to show, loading
//!   state, and dispatch of authentication requests.
//! - [`client`] — the `AuthClient` capability set and its HTTP implementation.
//! - [`auth`] — server-side auth service configuration: database, social
//!   providers, and the email OTP plugin with its SMTP delivery.
//! - [`console`] — a terminal front-end that renders one form per flow state.
//! - [`cli`] — command line entry points, including the `check-db` diagnostic.

pub mod auth;
pub mod cli;
pub mod client;
pub mod console;
pub mod flow;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
