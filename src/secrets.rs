use std::collections::HashMap;
use std::env;

use anyhow::{Context, Result};
use vaultrs::auth::approle;
use vaultrs::client::{Client, VaultClient, VaultClientSettingsBuilder};
use vaultrs::kv2;

const PROVIDER_SECRET_PATH: &str = "paystack";
const PROVIDER_SECRET_KEY: &str = "secret_key";

/// Reads provider credentials from Vault's KV v2 engine using AppRole login.
pub struct SecretsManager {
    client: VaultClient,
    kv_mount: String,
}

impl SecretsManager {
    pub async fn new() -> Result<Self> {
        let vault_addr =
            env::var("VAULT_ADDR").unwrap_or_else(|_| "http://127.0.0.1:8200".to_string());
        let role_id = env::var("VAULT_ROLE_ID").context("VAULT_ROLE_ID is required")?;
        let secret_id = env::var("VAULT_SECRET_ID").context("VAULT_SECRET_ID is required")?;
        let auth_mount =
            env::var("VAULT_AUTH_MOUNT").unwrap_or_else(|_| "approle".to_string());
        let kv_mount = env::var("VAULT_KV_MOUNT").unwrap_or_else(|_| "secret".to_string());

        let mut client = VaultClient::new(
            VaultClientSettingsBuilder::default()
                .address(&vault_addr)
                .build()
                .context("failed to build Vault client settings")?,
        )
        .context("failed to create Vault client")?;

        let auth = approle::login(&client, &auth_mount, &role_id, &secret_id)
            .await
            .context("failed to authenticate to Vault with AppRole")?;
        client.set_token(&auth.client_token);

        Ok(Self { client, kv_mount })
    }

    /// Key used both for API calls and for verifying webhook signatures.
    pub async fn get_provider_secret(&self) -> Result<String> {
        let secret: HashMap<String, String> =
            kv2::read(&self.client, &self.kv_mount, PROVIDER_SECRET_PATH)
                .await
                .with_context(|| {
                    format!("failed to read {}/{PROVIDER_SECRET_PATH} from Vault", self.kv_mount)
                })?;

        secret
            .get(PROVIDER_SECRET_KEY)
            .cloned()
            .with_context(|| {
                format!("{PROVIDER_SECRET_KEY} not found in Vault {}/{PROVIDER_SECRET_PATH}", self.kv_mount)
            })
    }
}

/// Environment first, Vault as the fallback.
pub async fn resolve_provider_secret(from_env: Option<String>) -> Result<String> {
    if let Some(secret) = from_env {
        return Ok(secret);
    }
    tracing::info!("PAYSTACK_SECRET_KEY not set, reading provider secret from Vault");
    SecretsManager::new().await?.get_provider_secret().await
}
