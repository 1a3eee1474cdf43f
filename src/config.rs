//! Configuration for the `pix-rs` binary.
//!
//! Merchant identity and charge policy come from an optional JSON file. Any
//! string value may be a literal or an environment reference (`$VAR` or
//! `${VAR}`), which keeps keys out of the file:
//!
//! ```json
//! {
//!   "pix_key": "$PIX_KEY",
//!   "merchant_name": "Sistema de Pagamentos",
//!   "merchant_city": "SAO PAULO",
//!   "expiration_minutes": 30
//! }
//! ```
//!
//! Fields missing from the file, or the whole file when `--config` is not
//! given, fall back to `PIX_*` environment variables and then to defaults.

use clap::{Parser, Subcommand};
use pix_codec::PixAmount;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::charge::Merchant;

/// CLI arguments for the `pix-rs` binary.
#[derive(Parser, Debug)]
#[command(name = "pix-rs")]
#[command(about = "Generate, verify and decode PIX QR payloads", version)]
pub struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print a payload for the configured merchant
    Generate {
        /// Fixed amount; omit for an open-amount code
        #[arg(long)]
        amount: Option<PixAmount>,
        /// Free-text reference label (truncated to 25 characters)
        #[arg(long, default_value = "")]
        reference: String,
        /// Override the configured beneficiary key
        #[arg(long)]
        key: Option<String>,
        /// Override the configured merchant name
        #[arg(long)]
        name: Option<String>,
        /// Override the configured merchant city
        #[arg(long)]
        city: Option<String>,
    },
    /// Check the trailing checksum of a payload
    Verify { payload: String },
    /// Verify a payload and print its fields as JSON
    Decode { payload: String },
    /// Issue a charge: payload, render URL and expiry, as JSON
    Charge {
        #[arg(long)]
        id: String,
        #[arg(long)]
        amount: PixAmount,
        #[arg(long, default_value = "")]
        description: String,
    },
}

/// Merchant and charge settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "config_defaults::default_pix_key")]
    pix_key: LiteralOrEnv<String>,
    #[serde(default = "config_defaults::default_merchant_name")]
    merchant_name: LiteralOrEnv<String>,
    #[serde(default = "config_defaults::default_merchant_city")]
    merchant_city: LiteralOrEnv<String>,
    #[serde(default = "config_defaults::default_expiration_minutes")]
    expiration_minutes: u64,
    #[serde(default = "config_defaults::default_qr_renderer_url")]
    qr_renderer_url: LiteralOrEnv<Url>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pix_key: config_defaults::default_pix_key(),
            merchant_name: config_defaults::default_merchant_name(),
            merchant_city: config_defaults::default_merchant_city(),
            expiration_minutes: config_defaults::default_expiration_minutes(),
            qr_renderer_url: config_defaults::default_qr_renderer_url(),
        }
    }
}

pub mod config_defaults {
    use super::LiteralOrEnv;
    use std::env;
    use url::Url;

    pub const DEFAULT_PIX_KEY: &str = "test@pagamentos.com";
    pub const DEFAULT_MERCHANT_NAME: &str = "Sistema de Pagamentos";
    pub const DEFAULT_MERCHANT_CITY: &str = "SAO PAULO";
    pub const DEFAULT_EXPIRATION_MINUTES: u64 = 30;
    pub const DEFAULT_QR_RENDERER_URL: &str =
        "https://api.qrserver.com/v1/create-qr-code/?size=200x200";

    fn string_or(var: &str, default: &str) -> LiteralOrEnv<String> {
        LiteralOrEnv::from_literal(env::var(var).unwrap_or_else(|_| default.to_string()))
    }

    /// $PIX_KEY -> "test@pagamentos.com"
    pub fn default_pix_key() -> LiteralOrEnv<String> {
        string_or("PIX_KEY", DEFAULT_PIX_KEY)
    }

    /// $PIX_MERCHANT_NAME -> "Sistema de Pagamentos"
    pub fn default_merchant_name() -> LiteralOrEnv<String> {
        string_or("PIX_MERCHANT_NAME", DEFAULT_MERCHANT_NAME)
    }

    /// $PIX_MERCHANT_CITY -> "SAO PAULO"
    pub fn default_merchant_city() -> LiteralOrEnv<String> {
        string_or("PIX_MERCHANT_CITY", DEFAULT_MERCHANT_CITY)
    }

    /// $PIX_EXPIRATION_MINUTES -> 30
    pub fn default_expiration_minutes() -> u64 {
        env::var("PIX_EXPIRATION_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EXPIRATION_MINUTES)
    }

    /// $PIX_QR_RENDERER_URL -> qrserver.com
    pub fn default_qr_renderer_url() -> LiteralOrEnv<Url> {
        let url = env::var("PIX_QR_RENDERER_URL")
            .ok()
            .and_then(|s| Url::parse(&s).ok())
            .unwrap_or_else(|| Url::parse(DEFAULT_QR_RENDERER_URL).expect("valid default url"));
        LiteralOrEnv::from_literal(url)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Config {
    /// Loads the config file at `path`, or builds one from the environment
    /// when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Ok(Config::default()),
        }
    }

    fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn merchant(&self) -> Merchant {
        Merchant {
            pix_key: self.pix_key.inner().clone(),
            name: self.merchant_name.inner().clone(),
            city: self.merchant_city.inner().clone(),
        }
    }

    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_minutes.saturating_mul(60))
    }

    pub fn qr_renderer_url(&self) -> &Url {
        &self.qr_renderer_url
    }
}

/// A value given either literally or as an environment variable reference.
///
/// - Literal: `"SAO PAULO"`
/// - Simple env var: `"$PIX_MERCHANT_CITY"`
/// - Braced env var: `"${PIX_MERCHANT_CITY}"`
///
/// The reference is resolved once, during deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn from_literal(value: T) -> Self {
        Self(value)
    }

    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Returns the variable name if `s` is `$VAR` or `${VAR}`.
    fn parse_env_var_syntax(s: &str) -> Option<&str> {
        if let Some(braced) = s.strip_prefix("${").and_then(|r| r.strip_suffix('}')) {
            return Some(braced);
        }
        let name = s.strip_prefix('$')?;
        let valid = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
        valid.then_some(name)
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let value = match Self::parse_env_var_syntax(&s) {
            Some(var_name) => std::env::var(var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "Environment variable '{var_name}' not found (referenced as '{s}')"
                ))
            })?,
            None => s.clone(),
        };

        let parsed = value
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse value: {e}")))?;

        Ok(LiteralOrEnv(parsed))
    }
}

impl<T> Serialize for LiteralOrEnv<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_syntax() {
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("$PIX_KEY"), Some("PIX_KEY"));
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("${PIX_KEY}"), Some("PIX_KEY"));
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("$"), None);
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("$a-b"), None);
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("SAO PAULO"), None);
    }

    #[test]
    fn test_literal_values() {
        let json = r#"{
            "pix_key": "loja@example.com",
            "merchant_name": "Loja do Joao",
            "merchant_city": "RECIFE",
            "expiration_minutes": 15,
            "qr_renderer_url": "https://qr.example.com/render"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let merchant = config.merchant();
        assert_eq!(merchant.pix_key, "loja@example.com");
        assert_eq!(merchant.name, "Loja do Joao");
        assert_eq!(merchant.city, "RECIFE");
        assert_eq!(config.expiration(), Duration::from_secs(15 * 60));
        assert_eq!(config.qr_renderer_url().as_str(), "https://qr.example.com/render");
    }

    #[test]
    fn test_env_reference_is_resolved() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("PIX_RS_TEST_CONFIG_KEY", "env@example.com") };
        let json = r#"{ "pix_key": "${PIX_RS_TEST_CONFIG_KEY}" }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.merchant().pix_key, "env@example.com");
    }

    #[test]
    fn test_missing_env_reference_fails() {
        let json = r#"{ "pix_key": "$PIX_RS_TEST_CONFIG_UNSET" }"#;
        let err = serde_json::from_str::<Config>(json).unwrap_err();
        assert!(err.to_string().contains("PIX_RS_TEST_CONFIG_UNSET"));
    }

    #[test]
    fn test_invalid_url_fails() {
        let json = r#"{ "qr_renderer_url": "not a url" }"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/pix-rs.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_, _)));
    }

    #[test]
    fn test_cli_parses_generate() {
        let args = CliArgs::try_parse_from([
            "pix-rs", "generate", "--amount", "10.5", "--reference", "Pedido 123",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Command::Generate {
                amount: Some(PixAmount::parse("10.50").unwrap()),
                reference: "Pedido 123".to_string(),
                key: None,
                name: None,
                city: None,
            }
        );
    }

    #[test]
    fn test_cli_rejects_bad_amount() {
        let result = CliArgs::try_parse_from(["pix-rs", "charge", "--id", "c1", "--amount", "-5"]);
        assert!(result.is_err());
    }
}
