use crate::api;
use anyhow::Result;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database cannot be prepared or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    api::new(args.port, &args.dsn).await
}
