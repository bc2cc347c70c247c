use crate::config::{AllowedIps, Config};
use anyhow::{Context, Result};
use sqlx::PgPool;

pub struct ValidationReport {
    pub environment: bool,
    /// `None` when running on the in-memory store.
    pub database: Option<bool>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.environment && self.database.unwrap_or(true)
    }

    pub fn print(&self) {
        println!("\n=== Startup Validation Report ===");
        println!("Environment Variables: {}", status(Some(self.environment)));
        println!("Database Connectivity: {}", status(self.database));

        if !self.warnings.is_empty() {
            println!("\nWarnings:");
            for warning in &self.warnings {
                println!("  ⚠️  {}", warning);
            }
        }

        if !self.errors.is_empty() {
            println!("\nErrors:");
            for error in &self.errors {
                println!("  ❌ {}", error);
            }
        }

        println!("\nOverall Status: {}", if self.is_valid() { "✅ PASS" } else { "❌ FAIL" });
        println!("=================================\n");
    }
}

fn status(ok: Option<bool>) -> &'static str {
    match ok {
        Some(true) => "✅ OK",
        Some(false) => "❌ FAIL",
        None => "➖ SKIPPED (in-memory store)",
    }
}

pub async fn validate_environment(config: &Config, pool: Option<&PgPool>) -> ValidationReport {
    let mut report = ValidationReport {
        environment: true,
        database: None,
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    if let Err(e) = validate_env_vars(config) {
        report.environment = false;
        report.errors.push(format!("Environment: {}", e));
    }

    if config.webhook_allowed_ips == AllowedIps::Any {
        report
            .warnings
            .push("WEBHOOK_ALLOWED_IPS is '*'; webhooks are accepted from any address".to_string());
    }
    if config.database_url.is_none() {
        report
            .warnings
            .push("DATABASE_URL is not set; transactions are kept in memory only".to_string());
    }

    if let Some(pool) = pool {
        let result = validate_database(pool).await;
        report.database = Some(result.is_ok());
        if let Err(e) = result {
            report.errors.push(format!("Database: {}", e));
        }
    }

    report
}

fn validate_env_vars(config: &Config) -> Result<()> {
    if config.server_port == 0 {
        anyhow::bail!("SERVER_PORT must be greater than 0");
    }

    url::Url::parse(&config.paystack_base_url)
        .context("PAYSTACK_BASE_URL is not a valid URL")?;

    if let Some(database_url) = &config.database_url {
        url::Url::parse(database_url).context("DATABASE_URL is not a valid URL")?;
    }

    Ok(())
}

async fn validate_database(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Failed to connect to database")?;

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .context("Failed to check migrations table")?;

    if applied == 0 {
        anyhow::bail!("No migrations applied");
    }

    Ok(())
}
