//! # Chain Secret Blob
//!
//! The chain integration is configured by a single JSON secret blob
//! containing the Infura project key, the signing key, and the deployed
//! contract address. It is fetched once at bootstrap; a missing or
//! empty field is a hard bootstrap failure (the process runs degraded).
//!
//! The private key is held in a [`Zeroizing`] wrapper and must never be
//! logged or serialized.

use thiserror::Error;
use zeroize::Zeroizing;

/// Environment variable holding the secret blob inline as JSON.
pub const SECRETS_ENV: &str = "CHAIN_SECRETS";
/// Environment variable pointing at a file containing the secret blob.
pub const SECRETS_FILE_ENV: &str = "CHAIN_SECRETS_FILE";

/// Errors loading or validating the secret blob.
#[derive(Debug, Error)]
pub enum SecretsError {
    /// Neither `CHAIN_SECRETS` nor `CHAIN_SECRETS_FILE` is set.
    #[error("chain secrets not configured: set {SECRETS_ENV} or {SECRETS_FILE_ENV}")]
    NotConfigured,

    /// The blob parsed but a required field is missing or empty.
    #[error("missing required blockchain configuration field: {name}")]
    MissingField {
        /// The absent field's name as it appears in the blob.
        name: &'static str,
    },

    /// The blob is not valid JSON.
    #[error("chain secrets are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The secrets file could not be read.
    #[error("failed to read chain secrets file: {0}")]
    Io(#[from] std::io::Error),
}

/// The decoded secret blob.
pub struct ChainSecrets {
    pub infura_api_key: String,
    pub private_key: Zeroizing<String>,
    pub contract_address: String,
}

impl std::fmt::Debug for ChainSecrets {
    // Never print the key material.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSecrets")
            .field("infura_api_key", &"<redacted>")
            .field("private_key", &"<redacted>")
            .field("contract_address", &self.contract_address)
            .finish()
    }
}

impl ChainSecrets {
    /// Parse the secret blob from its JSON form, rejecting missing or
    /// empty fields.
    pub fn from_json(blob: &str) -> Result<Self, SecretsError> {
        let value: serde_json::Value = serde_json::from_str(blob)?;

        let field = |name: &'static str| -> Result<String, SecretsError> {
            value
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or(SecretsError::MissingField { name })
        };

        Ok(Self {
            infura_api_key: field("INFURA_API_KEY")?,
            private_key: Zeroizing::new(field("PRIVATE_KEY")?),
            contract_address: field("CONTRACT_ADDRESS")?,
        })
    }

    /// Load the blob from the environment: inline JSON first, then a
    /// file path.
    pub fn from_env() -> Result<Self, SecretsError> {
        if let Ok(blob) = std::env::var(SECRETS_ENV) {
            return Self::from_json(&blob);
        }
        if let Ok(path) = std::env::var(SECRETS_FILE_ENV) {
            let blob = std::fs::read_to_string(path)?;
            return Self::from_json(&blob);
        }
        Err(SecretsError::NotConfigured)
    }

    /// The HTTPS provider endpoint derived from the Infura key.
    pub fn provider_url(&self) -> String {
        format!("https://sepolia.infura.io/v3/{}", self.infura_api_key)
    }

    /// The signing key as raw hex, tolerating an optional `0x` prefix
    /// in the stored blob.
    pub fn raw_private_key(&self) -> Zeroizing<String> {
        let raw = self
            .private_key
            .strip_prefix("0x")
            .unwrap_or(&self.private_key);
        Zeroizing::new(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn parses_complete_blob() {
        let blob = format!(
            r#"{{"INFURA_API_KEY":"abc123","PRIVATE_KEY":"0x{KEY}","CONTRACT_ADDRESS":"0x5FbDB2315678afecb367f032d93F642f64180aa3"}}"#
        );
        let secrets = ChainSecrets::from_json(&blob).unwrap();
        assert_eq!(secrets.infura_api_key, "abc123");
        assert_eq!(
            secrets.contract_address,
            "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
        assert_eq!(
            secrets.provider_url(),
            "https://sepolia.infura.io/v3/abc123"
        );
    }

    #[test]
    fn missing_field_is_hard_failure() {
        let blob = r#"{"INFURA_API_KEY":"abc123","PRIVATE_KEY":"0xdead"}"#;
        let err = ChainSecrets::from_json(blob).unwrap_err();
        assert!(matches!(
            err,
            SecretsError::MissingField {
                name: "CONTRACT_ADDRESS"
            }
        ));
    }

    #[test]
    fn empty_field_is_hard_failure() {
        let blob = r#"{"INFURA_API_KEY":"  ","PRIVATE_KEY":"0xdead","CONTRACT_ADDRESS":"0x1"}"#;
        let err = ChainSecrets::from_json(blob).unwrap_err();
        assert!(matches!(
            err,
            SecretsError::MissingField {
                name: "INFURA_API_KEY"
            }
        ));
    }

    #[test]
    fn private_key_prefix_is_normalized() {
        for stored in [format!("0x{KEY}"), KEY.to_string()] {
            let blob = format!(
                r#"{{"INFURA_API_KEY":"k","PRIVATE_KEY":"{stored}","CONTRACT_ADDRESS":"0x1"}}"#
            );
            let secrets = ChainSecrets::from_json(&blob).unwrap();
            assert_eq!(secrets.raw_private_key().as_str(), KEY);
        }
    }

    #[test]
    fn debug_redacts_key_material() {
        let blob = format!(
            r#"{{"INFURA_API_KEY":"k","PRIVATE_KEY":"{KEY}","CONTRACT_ADDRESS":"0x1"}}"#
        );
        let secrets = ChainSecrets::from_json(&blob).unwrap();
        let printed = format!("{secrets:?}");
        assert!(!printed.contains(KEY));
        assert!(printed.contains("<redacted>"));
    }
}
