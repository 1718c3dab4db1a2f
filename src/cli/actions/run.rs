use crate::cli::actions::{checkdb, signin, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::SignIn(args) => signin::execute(args).await,
        Action::CheckDb(args) => checkdb::execute(args).await,
    }
}
