use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    droste_cli::main_entry().await
}
