use dotenv::dotenv;

use stock_forecast::app::bootstrap;
use stock_forecast::app_config::log::setup_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    setup_logging().await?;

    bootstrap::run().await
}
