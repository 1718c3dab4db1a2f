//! Terminal front-end for the sign-in flow.
//!
//! Renders exactly one form per flow state, reads input lines, and dispatches
//! the controller operations. Errors surfaced by the controller are printed
//! as alerts and the form is shown again; a successful sign-in "navigates"
//! and the loop ends, like the browser page unmounting.

use crate::client::{AuthClient, SocialProvider};
use crate::flow::{FlowState, Navigator, SignInFlow};
use anyhow::Result;
use regex::Regex;
use std::io::{self, BufRead, Write};
use tracing::debug;

pub struct Form {
    pub title: &'static str,
    pub description: &'static str,
}

/// The one form visible in a given state.
#[must_use]
pub const fn form(state: FlowState) -> Form {
    match state {
        FlowState::Password => Form {
            title: "Sign In",
            description: "Enter your email below to login to your account",
        },
        FlowState::OtpEmailEntry => Form {
            title: "Login with OTP",
            description: "Enter your email to receive a code",
        },
        FlowState::OtpCodeEntry => Form {
            title: "Enter OTP",
            description: "Enter the code sent to your email",
        },
    }
}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

/// Terminal stand-in for the browser router.
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, path: &str) {
        println!("Signed in. Redirecting to {path}");
    }
}

/// Drive the sign-in flow until the user signs in, hands off to a provider,
/// or quits.
///
/// # Errors
/// Returns an error on I/O failure or when social sign-in fails (the
/// controller does not catch those).
pub async fn run<C: AuthClient>(client: C) -> Result<()> {
    let mut input = io::stdin().lock().lines();
    let mut flow = SignInFlow::new(client, ConsoleNavigator);

    loop {
        let form = form(flow.state());
        println!();
        println!("== {} ==", form.title);
        println!("{}", form.description);

        match flow.state() {
            FlowState::Password => {
                println!("[1] email & password  [2] Google  [3] GitHub  [4] login with code  [q] quit");
                let Some(choice) = prompt(&mut input, "choice")? else {
                    return Ok(());
                };

                match choice.as_str() {
                    "1" => {
                        let Some(email) = prompt(&mut input, "email")? else {
                            return Ok(());
                        };
                        if !valid_email(&email) {
                            eprintln!("Invalid email address");
                            continue;
                        }
                        let Some(password) = prompt(&mut input, "password")? else {
                            return Ok(());
                        };

                        flow.set_email(email);
                        flow.set_password(password);

                        match flow.submit_password_sign_in().await {
                            Ok(()) => return Ok(()),
                            Err(err) => eprintln!("{err}"),
                        }
                    }
                    "2" | "3" => {
                        let provider = if choice == "2" {
                            SocialProvider::Google
                        } else {
                            SocialProvider::Github
                        };

                        debug!("social sign-in with {provider}");

                        let url = flow.sign_in_with_social(provider).await?;
                        println!("Continue in your browser: {url}");

                        return Ok(());
                    }
                    "4" => flow.switch_to_otp_login(),
                    "q" => return Ok(()),
                    _ => eprintln!("Unknown choice: {choice}"),
                }
            }
            FlowState::OtpEmailEntry => {
                let Some(email) = prompt(&mut input, "email (or 'back')")? else {
                    return Ok(());
                };
                if email == "back" {
                    flow.back();
                    continue;
                }
                if !valid_email(&email) {
                    eprintln!("Invalid email address");
                    continue;
                }

                flow.set_email(email);

                if let Err(err) = flow.request_otp().await {
                    eprintln!("{err}");
                }
            }
            FlowState::OtpCodeEntry => {
                let Some(code) = prompt(&mut input, "code (or 'back')")? else {
                    return Ok(());
                };
                if code == "back" {
                    flow.back();
                    continue;
                }

                flow.set_code(code);

                match flow.verify_otp().await {
                    Ok(()) => return Ok(()),
                    Err(err) => eprintln!("{err}"),
                }
            }
        }
    }
}

// None on EOF
fn prompt<B: BufRead>(lines: &mut io::Lines<B>, label: &str) -> Result<Option<String>> {
    print!("{label}> ");
    io::stdout().flush()?;

    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}
