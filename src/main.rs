//! Server binary entry point.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    transparency_ledger::server::run().await
}
