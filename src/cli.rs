use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::config::{AllowedIps, Config};
use crate::domain::Transaction;
use crate::ports::TransactionRepository;

#[derive(Parser)]
#[command(name = "ledger-core")]
#[command(about = "Ledger Core - wallet funding and payment webhook reconciliation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Transaction inspection commands
    #[command(subcommand)]
    Tx(TxCommands),

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Show a transaction by ID
    Show {
        #[arg(value_name = "TX_ID")]
        tx_id: Uuid,
    },

    /// Find a transaction by provider reference
    Lookup {
        #[arg(value_name = "REFERENCE")]
        reference: String,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

pub async fn handle_tx_show(repository: &dyn TransactionRepository, tx_id: Uuid) -> anyhow::Result<()> {
    match repository.find_by_id(tx_id).await? {
        Some(tx) => {
            print_transaction(&tx);
            Ok(())
        }
        None => {
            tracing::warn!("Transaction {} not found", tx_id);
            anyhow::bail!("Transaction {} not found", tx_id)
        }
    }
}

pub async fn handle_tx_lookup(
    repository: &dyn TransactionRepository,
    reference: &str,
) -> anyhow::Result<()> {
    match repository.find_by_reference(reference).await? {
        Some(tx) => {
            print_transaction(&tx);
            Ok(())
        }
        None => {
            tracing::warn!("No transaction with reference {}", reference);
            anyhow::bail!("No transaction with reference {}", reference)
        }
    }
}

fn print_transaction(tx: &Transaction) {
    let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

    println!("Transaction {}", tx.id);
    println!("  Reference:     {}", tx.reference);
    println!("  Owner:         {}", tx.owner);
    println!("  Status:        {}", tx.status);
    println!("  Type:          {}", tx.transaction_type.as_str());
    println!("  Intent:        {}", tx.intent.as_str());
    println!("  Provider:      {}", tx.provider.as_str());
    println!("  Amount:        {}", tx.amount);
    println!("  Amount paid:   {}", or_dash(tx.amount_paid.as_ref().map(ToString::to_string)));
    println!("  Native amount: {}", or_dash(tx.native_amount().map(|v| v.to_string())));
    println!("  Created:       {}", tx.created_at);
    println!("  Updated:       {}", tx.updated_at);
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let Some(database_url) = config.database_url.as_deref() else {
        anyhow::bail!("DATABASE_URL must be set to run migrations");
    };

    let pool = crate::db::create_pool(database_url).await?;
    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool).await?;
    println!("✓ Database migrations completed");

    Ok(())
}

pub async fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!(
        "  Database URL: {}",
        config
            .database_url
            .as_deref()
            .map(mask_password)
            .unwrap_or_else(|| "(unset, in-memory store)".to_string())
    );
    println!("  Paystack Base URL: {}", config.paystack_base_url);
    println!(
        "  Paystack Secret: {}",
        if config.paystack_secret_key.is_some() { "set" } else { "from Vault" }
    );
    println!(
        "  Webhook Allowed IPs: {}",
        match &config.webhook_allowed_ips {
            AllowedIps::Any => "*".to_string(),
            AllowedIps::Cidrs(cidrs) => cidrs
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    );

    let pool = match config.database_url.as_deref() {
        Some(url) => Some(crate::db::create_pool(url).await?),
        None => None,
    };
    let report = crate::startup::validate_environment(config, pool.as_ref()).await;
    report.print();

    if !report.is_valid() {
        anyhow::bail!("Configuration is invalid");
    }

    tracing::info!("Configuration is valid");
    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
