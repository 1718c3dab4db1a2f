use crate::auth::Database;
use anyhow::Result;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub dsn: String,
}

/// Database connectivity diagnostic: connect and `SELECT 1`. The process
/// exits 0 when this returns `Ok`, 1 otherwise.
///
/// # Errors
/// Returns an error if the connection or the query fails.
pub async fn execute(args: Args) -> Result<()> {
    info!("Testing DB connection");

    let database = Database::new(args.dsn);
    let pool = database.connect().await?;

    Database::ping(&pool).await?;

    info!("Connection successful");

    Ok(())
}
