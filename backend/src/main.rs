#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pelagica::start_server().await?;

    Ok(())
}
