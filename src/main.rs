use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use unt_purchase::{
    app,
    config::Config,
    handlers::AppState,
    services::{
        submitter::connect_signer, Activity, AdminService, CacheService, ChainState,
        EthereumService, PurchasePlanner, PurchaseSender, PurchaseSubmitter, PurchaseWatcher,
        Withdrawer,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting UNT purchase service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);

    let cache = Arc::new(CacheService::new(&config.redis_url).await?);
    let ethereum = Arc::new(
        EthereumService::new(
            &config.eth_rpc_url,
            config.eth_rpc_fallback.as_deref(),
            config.token_address,
            cache.clone(),
        )
        .await?,
    );
    let chain: Arc<dyn ChainState> = ethereum.clone();
    let activity = Arc::new(Activity::new());

    let chain_id = chain.chain_id().await?;
    if chain_id != config.expected_chain_id {
        tracing::warn!(
            "RPC reports chain {}, purchases require chain {}",
            chain_id,
            config.expected_chain_id
        );
    }

    let sender: Option<Arc<dyn PurchaseSender>> = match &config.purchaser_private_key {
        Some(key) => {
            let client = connect_signer(&config.eth_rpc_url, key, config.expected_chain_id)
                .context("Invalid PURCHASER_PRIVATE_KEY")?;
            Some(Arc::new(PurchaseSubmitter::new(client, config.token_address)))
        }
        None => None,
    };

    let admin: Option<Arc<dyn Withdrawer>> = match &config.admin_private_key {
        Some(key) => {
            let client = connect_signer(&config.eth_rpc_url, key, config.expected_chain_id)
                .context("Invalid ADMIN_PRIVATE_KEY")?;
            Some(Arc::new(AdminService::new(client, config.token_address)))
        }
        None => None,
    };

    let account = sender
        .as_ref()
        .map(|sender| sender.account())
        .or(config.purchaser_address);

    let planner = account.map(|account| {
        Arc::new(PurchasePlanner::new(
            chain.clone(),
            config.policy,
            account,
            config.balance_poll_interval,
            config.debounce_window,
            activity.clone(),
        ))
    });
    match &planner {
        Some(planner) => {
            tokio::spawn(planner.clone().run());
        }
        None => tracing::warn!("No purchasing account configured, only quotes are available"),
    }

    let watcher = Arc::new(PurchaseWatcher::new(activity.clone()));
    if let Some(ws_url) = config.eth_ws_url.clone() {
        let watcher = watcher.clone();
        let token_address = config.token_address;
        tokio::spawn(async move {
            if let Err(e) = watcher.run(ws_url, token_address).await {
                tracing::error!("Purchase event watcher stopped: {}", e);
            }
        });
    }

    let state = AppState {
        chain,
        cache,
        policy: config.policy,
        expected_chain_id: config.expected_chain_id,
        network: config.network_name(),
        planner,
        sender,
        admin,
        api_key: config.api_key.clone(),
        admin_api_key: config.admin_api_key.clone(),
        watcher,
        activity,
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("WebSocket dashboard: ws://{}/ws/dashboard", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl+c");
    tracing::info!("Shutting down gracefully...");
}
