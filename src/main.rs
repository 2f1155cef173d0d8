use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    soulrecorder_cli::cli::app::run().await
}
