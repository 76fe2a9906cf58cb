use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    shopee_scraper::run().await
}
