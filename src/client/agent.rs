use anyhow::{bail, Result};
use unt_purchase::{client::ApiClient, models::units::format_native};

const USAGE: &str = "usage: unt-agent <plan|quote <address>|token|buy|admin-balance|withdraw <amount>>";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let base_url =
        std::env::var("UNT_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let mut client = ApiClient::new(&base_url);
    if let Ok(key) = std::env::var("UNT_API_KEY") {
        client = client.with_api_key(key);
    }
    if let Ok(key) = std::env::var("UNT_ADMIN_API_KEY") {
        client = client.with_admin_api_key(key);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("plan");

    match (command, args.get(1)) {
        ("plan", _) => {
            let status = client.plan().await?;
            let snapshot = &status.snapshot;
            println!("Account:          {:?}", snapshot.account);
            println!("ETH balance:      {} ETH", format_native(snapshot.balance));
            println!("Gas reserve:      {} ETH", format_native(snapshot.gas_cost));
            println!("Maximum purchase: {} ETH", format_native(snapshot.plan.max_spend));
            if !snapshot.plan.shortfall.is_zero() {
                println!(
                    "Additional ETH required: {} ETH",
                    format_native(snapshot.plan.shortfall)
                );
            }
            if status.recent_success {
                println!("Purchase successful! Check your wallet for UNT tokens.");
            }
        }
        ("quote", Some(address)) => {
            let snapshot = client.quote(address).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        ("token", _) => {
            let token = client.token().await?;
            println!("Symbol:  {}", token.metadata.symbol);
            println!("Name:    {}", token.metadata.name);
            println!("Price:   {}", token.price);
            println!("Network: {}", token.network);
        }
        ("buy", _) => {
            println!("Buying maximum tokens...");
            let receipt = client.buy().await?;
            println!("[OK] Spent {} ETH", format_native(receipt.value));
            println!("Transaction: {:?}", receipt.tx_hash);
        }
        ("admin-balance", _) => {
            let balance = client.contract_balance().await?;
            println!("Token balance in contract: {} {}", balance.balance, balance.symbol);
        }
        ("withdraw", Some(amount)) => {
            let receipt = client.withdraw(amount).await?;
            println!("[OK] Withdrew {}: {:?}", receipt.amount, receipt.tx_hash);
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
