//! Sign-in flow controller.
//!
//! One page, three forms: password login, email entry for a one-time code,
//! and code entry. The controller owns which form is visible, the field
//! values, and the loading flag, and it is the only thing that talks to the
//! [`AuthClient`]. Successful authentication never changes the visible form;
//! it fires the [`Navigator`] once and the hosting view is expected to go
//! away.
//!
//! State machine:
//!
//! ```text
//! Password --switch_to_otp_login()--> OtpEmailEntry
//! OtpEmailEntry --back()-----------> Password
//! OtpEmailEntry --request_otp() ok-> OtpCodeEntry
//! OtpCodeEntry --back()-----------> OtpEmailEntry
//! OtpCodeEntry --verify_otp() ok--> navigate away
//! Password --submit ok------------> navigate away
//! ```

use crate::client::{AuthClient, AuthError, OtpPurpose, SocialProvider};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Post-login destination for every successful sign-in.
pub const HOME: &str = "/";

/// Shown when the OTP send fails without a message of its own.
pub const OTP_SEND_FALLBACK: &str = "Failed to send OTP";

/// Shown when password or code sign-in fails without a message of its own.
pub const SIGN_IN_FALLBACK: &str = "Authentication failed";

/// Which form the page is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Email + password form, plus the social and code-login buttons.
    Password,
    /// Code login, collecting the email to send the code to.
    OtpEmailEntry,
    /// Code login, collecting the emailed code.
    OtpCodeEntry,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    /// Alert text to show the user; the attempt failed and may be retried.
    #[error("{0}")]
    Auth(String),

    /// A request is already in flight; the submission was rejected without
    /// touching any state.
    #[error("a request is already in flight")]
    Busy,

    /// The submission came from a form that does not offer it; nothing was
    /// sent and no state changed.
    #[error("not available from the current form")]
    Unavailable,
}

/// Redirect-on-success collaborator. The browser router in the original; a
/// println in the console front-end; a recorder in tests.
pub trait Navigator {
    fn navigate(&self, path: &str);
}

/// The flow controller. All fields are transient and scoped to one mounted
/// view; dropping the controller is the only reset.
#[derive(Debug)]
pub struct SignInFlow<C, N> {
    client: C,
    navigator: N,
    state: FlowState,
    email: String,
    password: String,
    code: String,
    loading: bool,
}

impl<C: AuthClient, N: Navigator> SignInFlow<C, N> {
    #[must_use]
    pub fn new(client: C, navigator: N) -> Self {
        Self {
            client,
            navigator,
            state: FlowState::Password,
            email: String::new(),
            password: String::new(),
            code: String::new(),
            loading: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> FlowState {
        self.state
    }

    /// True exactly while a request to the auth service is outstanding.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    /// "Login with Code" button: switch from the password form to code login.
    pub fn switch_to_otp_login(&mut self) {
        if self.state == FlowState::Password {
            self.state = FlowState::OtpEmailEntry;
        }
    }

    /// "Back" button: one step towards the password form.
    pub fn back(&mut self) {
        self.state = match self.state {
            FlowState::Password | FlowState::OtpEmailEntry => FlowState::Password,
            FlowState::OtpCodeEntry => FlowState::OtpEmailEntry,
        };
    }

    // At most one request in flight per controller. The original relied on
    // disabled buttons; here a second submission is rejected outright.
    fn begin_request(&mut self) -> Result<(), FlowError> {
        if self.loading {
            return Err(FlowError::Busy);
        }
        self.loading = true;
        Ok(())
    }

    /// Submit the password form. On success navigates to [`HOME`] and leaves
    /// the loading flag set, since the view is about to unmount. Single
    /// attempt per call, no retry.
    ///
    /// # Errors
    /// Returns the alert text when the service rejects the attempt or the
    /// request fails, or [`FlowError::Busy`] while another request is pending.
    pub async fn submit_password_sign_in(&mut self) -> Result<(), FlowError> {
        self.begin_request()?;

        match self
            .client
            .sign_in_with_password(&self.email, &self.password)
            .await
        {
            Ok(()) => {
                debug!("password sign-in succeeded");
                self.navigator.navigate(HOME);
                Ok(())
            }
            Err(err) => {
                self.loading = false;
                Err(FlowError::Auth(alert_text(&err, SIGN_IN_FALLBACK)))
            }
        }
    }

    /// Submit the email-entry form: ask the service to email a sign-in code.
    /// On success advances to [`FlowState::OtpCodeEntry`]. Only the
    /// email-entry form offers this submission; the only way into code entry
    /// is a successful send.
    ///
    /// # Errors
    /// Returns the alert text (falling back to [`OTP_SEND_FALLBACK`] when the
    /// failure carries no message), [`FlowError::Busy`], or
    /// [`FlowError::Unavailable`] from any other form.
    pub async fn request_otp(&mut self) -> Result<(), FlowError> {
        if self.state != FlowState::OtpEmailEntry {
            return Err(FlowError::Unavailable);
        }

        self.begin_request()?;

        match self.client.send_otp(&self.email, OtpPurpose::SignIn).await {
            Ok(()) => {
                self.state = FlowState::OtpCodeEntry;
                self.loading = false;
                Ok(())
            }
            Err(err) => {
                self.loading = false;
                Err(FlowError::Auth(alert_text(&err, OTP_SEND_FALLBACK)))
            }
        }
    }

    /// Submit the code-entry form. On success navigates to [`HOME`] and
    /// leaves the loading flag set. On failure the form stays on code entry
    /// so the user can retype or go back.
    ///
    /// # Errors
    /// Returns the alert text, or [`FlowError::Busy`].
    pub async fn verify_otp(&mut self) -> Result<(), FlowError> {
        self.begin_request()?;

        match self.client.sign_in_with_otp(&self.email, &self.code).await {
            Ok(()) => {
                debug!("otp sign-in succeeded");
                self.navigator.navigate(HOME);
                Ok(())
            }
            Err(err) => {
                self.loading = false;
                Err(FlowError::Auth(alert_text(&err, SIGN_IN_FALLBACK)))
            }
        }
    }

    /// Redirect-based social sign-in with [`HOME`] as the post-login target.
    /// No loading flag and no error mapping: failures propagate to the caller
    /// untouched, the provider's redirect flow owns the rest.
    ///
    /// # Errors
    /// Returns the client error as-is.
    pub async fn sign_in_with_social(&self, provider: SocialProvider) -> Result<Url, AuthError> {
        self.client.sign_in_with_social(provider, HOME).await
    }
}

fn alert_text(err: &AuthError, fallback: &str) -> String {
    err.message()
        .map_or_else(|| fallback.to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockClient {
        password: Mutex<Vec<Result<(), AuthError>>>,
        send: Mutex<Vec<Result<(), AuthError>>>,
        verify: Mutex<Vec<Result<(), AuthError>>>,
        seen_emails: Mutex<Vec<String>>,
        seen_codes: Mutex<Vec<String>>,
    }

    impl MockClient {
        fn with_password(result: Result<(), AuthError>) -> Self {
            let client = Self::default();
            client.password.lock().unwrap().push(result);
            client
        }

        fn with_send(result: Result<(), AuthError>) -> Self {
            let client = Self::default();
            client.send.lock().unwrap().push(result);
            client
        }

        fn with_verify(result: Result<(), AuthError>) -> Self {
            let client = Self::default();
            client.verify.lock().unwrap().push(result);
            client
        }
    }

    impl AuthClient for MockClient {
        async fn sign_in_with_password(
            &self,
            email: &str,
            _password: &str,
        ) -> Result<(), AuthError> {
            self.seen_emails.lock().unwrap().push(email.to_string());
            self.password.lock().unwrap().pop().unwrap_or(Ok(()))
        }

        async fn send_otp(&self, email: &str, purpose: OtpPurpose) -> Result<(), AuthError> {
            assert_eq!(purpose, OtpPurpose::SignIn);
            self.seen_emails.lock().unwrap().push(email.to_string());
            self.send.lock().unwrap().pop().unwrap_or(Ok(()))
        }

        async fn sign_in_with_otp(&self, email: &str, code: &str) -> Result<(), AuthError> {
            self.seen_emails.lock().unwrap().push(email.to_string());
            self.seen_codes.lock().unwrap().push(code.to_string());
            self.verify.lock().unwrap().pop().unwrap_or(Ok(()))
        }

        async fn sign_in_with_social(
            &self,
            provider: SocialProvider,
            callback_url: &str,
        ) -> Result<Url, AuthError> {
            assert_eq!(callback_url, HOME);
            let url = format!("https://auth.example.com/authorize/{provider}");
            Ok(Url::parse(&url).unwrap())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNavigator(Rc<RefCell<Vec<String>>>);

    impl Navigator for RecordingNavigator {
        fn navigate(&self, path: &str) {
            self.0.borrow_mut().push(path.to_string());
        }
    }

    fn flow(client: MockClient) -> (SignInFlow<MockClient, RecordingNavigator>, RecordingNavigator)
    {
        let navigator = RecordingNavigator::default();
        (SignInFlow::new(client, navigator.clone()), navigator)
    }

    #[test]
    fn test_initial_state() {
        let (mut flow, _) = flow(MockClient::default());
        assert_eq!(flow.state(), FlowState::Password);
        assert!(!flow.loading());
        assert_eq!(flow.email(), "");

        flow.set_email("a@b.com");
        assert_eq!(flow.email(), "a@b.com");
    }

    #[test]
    fn test_transition_table() {
        let (mut flow, _) = flow(MockClient::default());

        flow.switch_to_otp_login();
        assert_eq!(flow.state(), FlowState::OtpEmailEntry);

        // "Login with Code" is only offered on the password form
        flow.switch_to_otp_login();
        assert_eq!(flow.state(), FlowState::OtpEmailEntry);

        flow.back();
        assert_eq!(flow.state(), FlowState::Password);

        flow.back();
        assert_eq!(flow.state(), FlowState::Password);
    }

    #[tokio::test]
    async fn test_back_from_code_entry_returns_to_email_entry() {
        let (mut flow, _) = flow(MockClient::default());
        flow.switch_to_otp_login();
        flow.set_email("a@b.com");
        flow.request_otp().await.unwrap();
        assert_eq!(flow.state(), FlowState::OtpCodeEntry);

        flow.back();
        assert_eq!(flow.state(), FlowState::OtpEmailEntry);
    }

    #[tokio::test]
    async fn test_password_sign_in_success_navigates_home_once() {
        let (mut flow, navigator) = flow(MockClient::with_password(Ok(())));
        flow.set_email("a@b.com");
        flow.set_password("hunter2");

        flow.submit_password_sign_in().await.unwrap();

        assert_eq!(*navigator.0.borrow(), vec![HOME.to_string()]);
        // unmount expected: the flag stays set until the view goes away
        assert!(flow.loading());
        assert_eq!(flow.state(), FlowState::Password);
    }

    #[tokio::test]
    async fn test_password_sign_in_failure_surfaces_message_and_clears_loading() {
        let rejected = AuthError::Rejected("Invalid email or password".to_string());
        let (mut flow, navigator) = flow(MockClient::with_password(Err(rejected)));
        flow.set_email("a@b.com");
        flow.set_password("wrong");

        let err = flow.submit_password_sign_in().await.unwrap_err();

        assert_eq!(
            err,
            FlowError::Auth("Invalid email or password".to_string())
        );
        assert!(!flow.loading());
        assert!(navigator.0.borrow().is_empty());
        assert_eq!(flow.state(), FlowState::Password);
    }

    #[tokio::test]
    async fn test_loading_idempotent_across_repeated_failures() {
        let client = MockClient::default();
        {
            let mut password = client.password.lock().unwrap();
            password.push(Err(AuthError::Rejected("no".to_string())));
            password.push(Err(AuthError::Rejected("no".to_string())));
        }
        let (mut flow, _) = flow(client);
        flow.set_email("a@b.com");

        for _ in 0..2 {
            assert!(flow.submit_password_sign_in().await.is_err());
            assert!(!flow.loading());
        }
    }

    #[tokio::test]
    async fn test_otp_send_failure_without_message_uses_fallback() {
        let (mut flow, _) = flow(MockClient::with_send(Err(AuthError::Transport(None))));
        flow.switch_to_otp_login();
        flow.set_email("a@b.com");

        let err = flow.request_otp().await.unwrap_err();

        assert_eq!(err, FlowError::Auth(OTP_SEND_FALLBACK.to_string()));
        assert_eq!(flow.state(), FlowState::OtpEmailEntry);
        assert!(!flow.loading());
    }

    #[tokio::test]
    async fn test_otp_send_failure_with_message_surfaces_it() {
        let transport = AuthError::Transport(Some("smtp unreachable".to_string()));
        let (mut flow, _) = flow(MockClient::with_send(Err(transport)));
        flow.switch_to_otp_login();
        flow.set_email("a@b.com");

        let err = flow.request_otp().await.unwrap_err();

        assert_eq!(err, FlowError::Auth("smtp unreachable".to_string()));
        assert_eq!(flow.state(), FlowState::OtpEmailEntry);
    }

    #[tokio::test]
    async fn test_otp_verify_failure_stays_on_code_entry() {
        let expired = AuthError::Rejected("Invalid or expired OTP".to_string());
        let (mut flow, navigator) = flow(MockClient::with_verify(Err(expired)));
        flow.switch_to_otp_login();
        flow.set_email("a@b.com");
        flow.request_otp().await.unwrap();
        flow.set_code("000000");

        let err = flow.verify_otp().await.unwrap_err();

        assert_eq!(err, FlowError::Auth("Invalid or expired OTP".to_string()));
        assert_eq!(flow.state(), FlowState::OtpCodeEntry);
        assert!(!flow.loading());
        assert!(navigator.0.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_full_otp_scenario() {
        let (mut flow, navigator) = flow(MockClient::default());

        flow.set_email("a@b.com");
        flow.switch_to_otp_login();
        assert_eq!(flow.state(), FlowState::OtpEmailEntry);

        flow.request_otp().await.unwrap();
        assert_eq!(flow.state(), FlowState::OtpCodeEntry);
        assert!(!flow.loading());

        flow.set_code("123456");
        flow.verify_otp().await.unwrap();

        assert_eq!(*navigator.0.borrow(), vec![HOME.to_string()]);
        let client_codes = flow.client.seen_codes.lock().unwrap();
        assert_eq!(*client_codes, vec!["123456".to_string()]);
    }

    #[tokio::test]
    async fn test_busy_guard_rejects_overlapping_submission() {
        // After a successful sign-in the flag stays set; any further
        // submission must be rejected without touching state.
        let (mut flow, _) = flow(MockClient::with_password(Ok(())));
        flow.set_email("a@b.com");
        flow.submit_password_sign_in().await.unwrap();
        assert!(flow.loading());

        assert_eq!(
            flow.submit_password_sign_in().await.unwrap_err(),
            FlowError::Busy
        );
        assert_eq!(flow.verify_otp().await.unwrap_err(), FlowError::Busy);
        assert_eq!(flow.state(), FlowState::Password);
        assert!(flow.loading());
    }

    #[tokio::test]
    async fn test_request_otp_only_from_email_entry() {
        // Sending a code is an email-entry submission; from the password or
        // code-entry form nothing is sent and nothing changes.
        let (mut flow, _) = flow(MockClient::default());
        flow.set_email("a@b.com");

        assert_eq!(flow.request_otp().await.unwrap_err(), FlowError::Unavailable);
        assert_eq!(flow.state(), FlowState::Password);
        assert!(!flow.loading());
        assert!(flow.client.seen_emails.lock().unwrap().is_empty());

        flow.switch_to_otp_login();
        flow.request_otp().await.unwrap();
        assert_eq!(flow.state(), FlowState::OtpCodeEntry);

        assert_eq!(flow.request_otp().await.unwrap_err(), FlowError::Unavailable);
        assert_eq!(flow.state(), FlowState::OtpCodeEntry);
    }

    #[tokio::test]
    async fn test_social_sign_in_delegates_without_loading() {
        let (flow, navigator) = flow(MockClient::default());

        let url = flow.sign_in_with_social(SocialProvider::Google).await.unwrap();

        assert_eq!(url.as_str(), "https://auth.example.com/authorize/google");
        assert!(!flow.loading());
        assert!(navigator.0.borrow().is_empty());
    }
}
