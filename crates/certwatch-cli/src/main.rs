//! certwatch - keeps an index of the certificates inside a directory of
//! archives and answers questions about their expiry.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    certwatch_cli::run().await
}
