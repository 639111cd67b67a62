//! Configuration management for the Crosslock coordinator
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::error::SwapResult;
use crate::escrow::Timelocks;
use crate::order::coordinator::OrderPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub coordinator: CoordinatorConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
    pub timelocks: TimelockConfig,
    pub chains: HashMap<String, ChainConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorConfig {
    pub instance_id: String,
    /// Numeric id of the chain whose runtime hosts this coordinator
    pub home_chain: u64,
    /// Interval of the expired-order sweep
    pub sweep_interval_ms: u64,
    pub max_active_orders: usize,
    pub max_expiration_secs: u64,
    /// Empty list means open resolver competition
    #[serde(default)]
    pub resolver_allowlist: Vec<String>,
    /// Counter-order matching is unsupported; resolvers fill from private
    /// liquidity. Kept as explicit policy rather than silent assumption.
    #[serde(default)]
    pub require_counter_order: bool,
    pub auction_duration_secs: u64,
    pub auction_start_premium_bps: u32,
}

impl CoordinatorConfig {
    pub fn order_policy(&self) -> OrderPolicy {
        OrderPolicy {
            home_chain: self.home_chain,
            max_active_orders: self.max_active_orders,
            max_expiration_secs: self.max_expiration_secs,
            resolver_allowlist: self.resolver_allowlist.clone(),
            require_counter_order: self.require_counter_order,
            auction_duration_secs: self.auction_duration_secs,
            auction_start_premium_bps: self.auction_start_premium_bps,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

/// Default stage offsets, seconds from escrow deployment. The destination
/// set is strictly tighter than the source set so a destination escrow
/// anchored any time before source cancellation still unwinds first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelockConfig {
    pub src_withdrawal: u32,
    pub src_public_withdrawal: u32,
    pub src_cancellation: u32,
    pub src_public_cancellation: u32,
    pub dst_withdrawal: u32,
    pub dst_public_withdrawal: u32,
    pub dst_cancellation: u32,
    pub dst_public_cancellation: u32,
    pub finality_lock: u32,
}

impl TimelockConfig {
    /// Source-side timelocks at the given deployment anchor
    pub fn source(&self, deployed_at: u64) -> SwapResult<Timelocks> {
        Timelocks::new(
            deployed_at,
            self.finality_lock,
            self.src_withdrawal,
            self.src_public_withdrawal,
            self.src_cancellation,
            self.src_public_cancellation,
        )
    }

    /// Destination-side timelocks at the given deployment anchor
    pub fn destination(&self, deployed_at: u64) -> SwapResult<Timelocks> {
        Timelocks::new(
            deployed_at,
            self.finality_lock,
            self.dst_withdrawal,
            self.dst_public_withdrawal,
            self.dst_cancellation,
            self.dst_public_cancellation,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub enabled: bool,
}

impl Settings {
    /// Load settings from configuration files
    pub fn load() -> Result<Self> {
        let config_path = env::var("CROSSLOCK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.enabled_chains().is_empty() {
            anyhow::bail!("At least one chain must be enabled");
        }
        if self
            .enabled_chains()
            .iter()
            .all(|(_, c)| c.chain_id != self.coordinator.home_chain)
        {
            anyhow::bail!(
                "Home chain {} is not among the enabled chains",
                self.coordinator.home_chain
            );
        }

        let t = &self.timelocks;
        for (label, w, pw, c, pc) in [
            (
                "source",
                t.src_withdrawal,
                t.src_public_withdrawal,
                t.src_cancellation,
                t.src_public_cancellation,
            ),
            (
                "destination",
                t.dst_withdrawal,
                t.dst_public_withdrawal,
                t.dst_cancellation,
                t.dst_public_cancellation,
            ),
        ] {
            if !(w < pw && pw < c && c < pc) {
                anyhow::bail!("{} timelock offsets must be strictly increasing", label);
            }
        }
        if t.dst_cancellation >= t.src_cancellation {
            anyhow::bail!(
                "Destination cancellation offset must be below the source offset \
                 so the resolver's side always unwinds first"
            );
        }

        if self.coordinator.require_counter_order {
            anyhow::bail!("Counter-order matching is not supported");
        }

        Ok(())
    }

    /// Get list of enabled chains
    pub fn enabled_chains(&self) -> Vec<(&String, &ChainConfig)> {
        self.chains.iter().filter(|(_, c)| c.enabled).collect()
    }

    /// Get chain config by chain ID
    pub fn get_chain_by_id(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.values().find(|c| c.chain_id == chain_id)
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TEST_VAR", "test_value");
        let input = "url = \"postgres://db/${TEST_VAR}\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"postgres://db/test_value\"");
    }

    fn settings() -> Settings {
        let toml_str = r#"
            [coordinator]
            instance_id = "test"
            home_chain = 1
            sweep_interval_ms = 5000
            max_active_orders = 100
            max_expiration_secs = 604800
            auction_duration_secs = 300
            auction_start_premium_bps = 500

            [database]
            url = "postgres://localhost/crosslock"
            max_connections = 5
            min_connections = 1

            [api]
            host = "127.0.0.1"
            port = 8080

            [metrics]
            enabled = false
            port = 9090

            [timelocks]
            src_withdrawal = 3600
            src_public_withdrawal = 7200
            src_cancellation = 10800
            src_public_cancellation = 14400
            dst_withdrawal = 1800
            dst_public_withdrawal = 3600
            dst_cancellation = 5400
            dst_public_cancellation = 7200
            finality_lock = 180

            [chains.home]
            chain_id = 1
            name = "home"
            enabled = true

            [chains.evm]
            chain_id = 2
            name = "evm"
            enabled = true
        "#;
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn load_reads_file_with_env_substitution() {
        env::set_var("LOAD_TEST_DB", "postgres://localhost/crosslock_test");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.toml");
        let contents = r#"
            [coordinator]
            instance_id = "load-test"
            home_chain = 1
            sweep_interval_ms = 5000
            max_active_orders = 100
            max_expiration_secs = 604800
            auction_duration_secs = 300
            auction_start_premium_bps = 500

            [database]
            url = "${LOAD_TEST_DB}"
            max_connections = 5
            min_connections = 1

            [api]
            host = "127.0.0.1"
            port = 8080

            [metrics]
            enabled = false
            port = 9090

            [timelocks]
            src_withdrawal = 3600
            src_public_withdrawal = 7200
            src_cancellation = 10800
            src_public_cancellation = 14400
            dst_withdrawal = 1800
            dst_public_withdrawal = 3600
            dst_cancellation = 5400
            dst_public_cancellation = 7200
            finality_lock = 180

            [chains.home]
            chain_id = 1
            name = "home"
            enabled = true
        "#;
        std::fs::write(&path, contents).unwrap();
        env::set_var("CROSSLOCK_CONFIG", path.to_str().unwrap());

        let settings = Settings::load().unwrap();
        assert_eq!(settings.database.url, "postgres://localhost/crosslock_test");
        assert_eq!(settings.coordinator.instance_id, "load-test");
        env::remove_var("CROSSLOCK_CONFIG");
    }

    #[test]
    fn timelock_defaults_build_valid_timelocks() {
        let s = settings();
        let src = s.timelocks.source(1000).unwrap();
        assert_eq!(src.cancellation_at(), 1000 + 10800);
        let dst = s.timelocks.destination(1000).unwrap();
        assert!(dst.cancellation_at() < src.cancellation_at());
    }

    #[test]
    fn valid_settings_pass_validation() {
        assert!(settings().validate().is_ok());
        assert_eq!(settings().enabled_chains().len(), 2);
        assert_eq!(settings().get_chain_by_id(2).unwrap().name, "evm");
    }

    #[test]
    fn home_chain_must_be_enabled() {
        let mut s = settings();
        s.chains.get_mut("home").unwrap().enabled = false;
        assert!(s.validate().is_err());
    }

    #[test]
    fn destination_offsets_must_undercut_source() {
        let mut s = settings();
        s.timelocks.dst_cancellation = s.timelocks.src_cancellation;
        assert!(s.validate().is_err());
    }

    #[test]
    fn counter_order_policy_rejected() {
        let mut s = settings();
        s.coordinator.require_counter_order = true;
        assert!(s.validate().is_err());
    }
}
