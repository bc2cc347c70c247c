use clap::Parser;
use ledger_core::adapters::{
    notifier::DEFAULT_QUEUE_CAPACITY, ChannelNotifier, InMemoryTransactionRepository,
    PaystackClient, PostgresTransactionRepository,
};
use ledger_core::cli::{Cli, Commands, DbCommands, TxCommands};
use ledger_core::config::{Config, LogFormat};
use ledger_core::health::{DependencyChecker, StoreChecker};
use ledger_core::ports::TransactionRepository;
use ledger_core::services::{BalanceProjector, HmacSha512Verifier, WebhookReconciler};
use ledger_core::{cli, create_app, db, secrets, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const BREAKER_FAILURE_THRESHOLD: u32 = 5;
const BREAKER_RESET_TIMEOUT_SECS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    init_tracing(config.log_format);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Tx(command) => {
            let repository = build_repository(&config).await?;
            match command {
                TxCommands::Show { tx_id } => cli::handle_tx_show(repository.as_ref(), tx_id).await,
                TxCommands::Lookup { reference } => {
                    cli::handle_tx_lookup(repository.as_ref(), &reference).await
                }
            }
        }
        Commands::Config => cli::handle_config_validate(&config).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn build_repository(config: &Config) -> anyhow::Result<Arc<dyn TransactionRepository>> {
    match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;
            Ok(Arc::new(PostgresTransactionRepository::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory transaction store");
            Ok(Arc::new(InMemoryTransactionRepository::new()))
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let secret_key = secrets::resolve_provider_secret(config.paystack_secret_key.clone()).await?;
    let repository = build_repository(&config).await?;

    let (notifier, notifications) = ChannelNotifier::new(DEFAULT_QUEUE_CAPACITY);
    let balances = Arc::new(BalanceProjector::new(repository.clone()));
    tokio::spawn(balances.clone().run(notifications));

    let gateway = PaystackClient::with_circuit_breaker(
        config.paystack_base_url.clone(),
        secret_key.clone(),
        BREAKER_FAILURE_THRESHOLD,
        BREAKER_RESET_TIMEOUT_SECS,
    );
    tracing::info!(base_url = %config.paystack_base_url, "Paystack client initialized");

    let reconciler = WebhookReconciler::new(
        Arc::new(HmacSha512Verifier::new(secret_key.as_str())),
        repository.clone(),
        Arc::new(notifier),
    );

    let health_checkers: Vec<Arc<dyn DependencyChecker>> =
        vec![Arc::new(StoreChecker::new(repository.clone()))];

    let state = AppState {
        repository,
        gateway: Arc::new(gateway),
        reconciler: Arc::new(reconciler),
        balances,
        health_checkers,
        webhook_allowed_ips: config.webhook_allowed_ips.clone(),
        trusted_proxy_depth: config.trusted_proxy_depth,
        start_time: Instant::now(),
    };

    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
