#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = scoremark::run_worker().await {
        eprintln!("scoremark-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
