#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = scoremark::run().await {
        eprintln!("scoremark fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
