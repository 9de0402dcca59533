//! Token Configuration
//!
//! Construction-time parameters, loadable from a JSON file. Every field is
//! optional in the file; missing fields take the defaults below.

use std::fs;
use std::path::Path;

use ftoken_common::constants::token;
use ftoken_common::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("token name must not be empty")]
    EmptyName,

    #[error("token symbol must not be empty")]
    EmptySymbol,
}

/// Construction parameters of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenConfig {
    /// Display name
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// Base units minted to the deployer
    pub initial_supply: Amount,
    /// Honor `Amount::MAX` as a never-decremented allowance
    pub unlimited_allowance: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: token::DEFAULT_NAME.to_string(),
            symbol: token::DEFAULT_SYMBOL.to_string(),
            initial_supply: token::INITIAL_SUPPLY,
            unlimited_allowance: false,
        }
    }
}

impl TokenConfig {
    /// Default configuration with the given metadata
    pub fn with_metadata(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TokenConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TokenConfig::default();
        assert_eq!(config.name, "Fungible Token");
        assert_eq!(config.symbol, "FTK");
        assert_eq!(config.initial_supply, 1_000_000 * 10u128.pow(18));
        assert!(!config.unlimited_allowance);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = TokenConfig::from_json(r#"{ "symbol": "ABC", "initial_supply": 42 }"#).unwrap();
        assert_eq!(config.symbol, "ABC");
        assert_eq!(config.initial_supply, 42);
        assert_eq!(config.name, token::DEFAULT_NAME);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            TokenConfig::from_json(r#"{ "name": "  " }"#),
            Err(ConfigError::EmptyName)
        ));
        assert!(matches!(
            TokenConfig::from_json(r#"{ "symbol": "" }"#),
            Err(ConfigError::EmptySymbol)
        ));
        assert!(matches!(
            TokenConfig::from_json(r#"{ "decimals": 6 }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, r#"{ "name": "Gold", "symbol": "GLD", "unlimited_allowance": true }"#).unwrap();

        let config = TokenConfig::load(&path).unwrap();
        assert_eq!(config.name, "Gold");
        assert!(config.unlimited_allowance);
    }
}
