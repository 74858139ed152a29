use flowradar::core::types::{AccountType, Category};
use flowradar::exchanges::bybit::build_connector_from_env;
use flowradar::{AccountInfo, MarketDataSource};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let symbol = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "BTCUSDT".to_string());

    let connector = build_connector_from_env()?;

    println!("Fetching ticker for {}...", symbol);
    let ticker = connector.get_ticker(&symbol).await;
    println!("{}", serde_json::to_string_pretty(&ticker)?);

    let funding = connector.get_funding_rate(Category::Linear, &symbol).await;
    println!("{}", serde_json::to_string_pretty(&funding)?);

    if !connector.can_sign() {
        println!("No usable private key configured; skipping account queries");
        return Ok(());
    }

    let wallet = connector.get_wallet_balance(AccountType::Unified).await;
    println!("{}", serde_json::to_string_pretty(&wallet)?);

    let positions = connector.get_positions(Category::Linear, None).await;
    println!("{}", serde_json::to_string_pretty(&positions)?);

    Ok(())
}
