use dotenvy::dotenv;
use ipnet::IpNet;
use std::env;

use crate::adapters::paystack::DEFAULT_BASE_URL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedIps {
    Any,
    Cidrs(Vec<IpNet>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// When unset the service runs on the in-memory store.
    pub database_url: Option<String>,
    /// When unset the secret is read from Vault at startup.
    pub paystack_secret_key: Option<String>,
    pub paystack_base_url: String,
    pub webhook_allowed_ips: AllowedIps,
    pub trusted_proxy_depth: usize,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: non_empty_var("DATABASE_URL"),
            paystack_secret_key: non_empty_var("PAYSTACK_SECRET_KEY"),
            paystack_base_url: env::var("PAYSTACK_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            webhook_allowed_ips: parse_allowed_ips(
                &env::var("WEBHOOK_ALLOWED_IPS").unwrap_or_else(|_| "*".to_string()),
            )?,
            trusted_proxy_depth: env::var("TRUSTED_PROXY_DEPTH")
                .unwrap_or_else(|_| "0".to_string())
                .parse()?,
            log_format: parse_log_format(&env::var("LOG_FORMAT").unwrap_or_default()),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_log_format(raw: &str) -> LogFormat {
    if raw.trim().eq_ignore_ascii_case("json") {
        LogFormat::Json
    } else {
        LogFormat::Text
    }
}

pub fn parse_allowed_ips(raw: &str) -> anyhow::Result<AllowedIps> {
    let value = raw.trim();
    if value == "*" {
        return Ok(AllowedIps::Any);
    }

    let cidrs = value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_cidr_or_ip)
        .collect::<Result<Vec<_>, _>>()?;

    if cidrs.is_empty() {
        anyhow::bail!("WEBHOOK_ALLOWED_IPS must be '*' or a comma-separated list of CIDRs");
    }

    Ok(AllowedIps::Cidrs(cidrs))
}

/// Bare addresses are accepted as single-host networks.
fn parse_cidr_or_ip(entry: &str) -> anyhow::Result<IpNet> {
    if let Ok(net) = entry.parse::<IpNet>() {
        return Ok(net);
    }
    let ip: std::net::IpAddr = entry.parse()?;
    Ok(IpNet::from(ip))
}
