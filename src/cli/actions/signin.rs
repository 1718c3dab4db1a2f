use crate::client::HttpAuthClient;
use crate::console;
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    /// Base URL of the authentication service.
    pub auth_url: String,
}

/// Run the interactive sign-in flow against the configured service.
///
/// # Errors
/// Returns an error if the client cannot be built or an uncaught sign-in
/// failure propagates (social sign-in).
pub async fn execute(args: Args) -> Result<()> {
    let client = HttpAuthClient::new(&args.auth_url)?;

    console::run(client).await
}
