//! Configuration Module
//!
//! This module defines all configuration structures for the gateway.
//! Configuration is loaded from TOML files and parsed using serde.

use serde::Deserialize;
use std::fs;

/// Main configuration structure
///
/// Contains all configuration sections for the gateway.
/// Loaded from a TOML file (e.g., config/default.toml).
///
/// # Example TOML
/// ```toml
/// [api]
/// host = "127.0.0.1"
/// port = 3000
///
/// [ledger]
/// rpc_url = "https://sepolia.infura.io/v3/..."
/// contract_address = "0x..."
/// private_key = "..."
/// chain_id = 11155111
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub ledger: LedgerConfig,
    pub media: MediaConfig,
    pub auth: AuthConfig,
}

/// API server configuration
///
/// # Fields
/// - `host`: IP address to bind to (e.g., "127.0.0.1" or "0.0.0.0")
/// - `port`: TCP port to listen on (e.g., 3000)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

/// Ledger connection configuration
///
/// Settings for reaching the deployed voting contract.
///
/// # Fields
/// - `rpc_url`: JSON-RPC endpoint of the chain the contract lives on
/// - `contract_address`: address of the deployed voting contract
/// - `private_key`: hex-encoded signing key for state-changing calls
/// - `chain_id`: chain id used when signing transactions
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub contract_address: String,
    pub private_key: String,
    pub chain_id: u64,
}

/// Media host configuration
///
/// Credentials for the external image host that candidate images are
/// uploaded to before their URLs are written on-chain.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
}

/// Auth token configuration
///
/// # Fields
/// - `secret`: shared secret for signing/verifying bearer tokens
/// - `token_ttl_secs`: token lifetime in seconds (typically 3600)
/// - `enforce`: whether the auth/admin middleware actually rejects
///   requests; the original deployments ran with it off
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
    pub token_ttl_secs: u64,
    pub enforce: bool,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    /// * `Ok(Config)` if the file was successfully loaded and parsed
    /// * `Err` if the file couldn't be read or the TOML is invalid
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
