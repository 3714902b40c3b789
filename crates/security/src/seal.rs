//! Artifact sealing with HMAC-SHA256.
//!
//! The orchestrator signs a canonical encoding of every artifact it builds;
//! the gateway verifies the signature before a call goes out. An artifact
//! that was deserialized from elsewhere, edited, or assembled by hand fails
//! verification.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of generated keys, in bytes.
pub const KEY_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error("Invalid seal key: {0}")]
    InvalidKey(String),
}

/// A keyed signer shared by the orchestrator and the gateway.
#[derive(Clone)]
pub struct SealKey {
    mac: HmacSha256,
}

impl std::fmt::Debug for SealKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SealKey([REDACTED])")
    }
}

impl SealKey {
    /// A fresh random key, valid for this process only.
    pub fn generate() -> Result<Self, SealError> {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SealError> {
        if bytes.is_empty() {
            return Err(SealError::InvalidKey("key must not be empty".into()));
        }
        let mac = HmacSha256::new_from_slice(bytes)
            .map_err(|e| SealError::InvalidKey(e.to_string()))?;
        Ok(Self { mac })
    }

    pub fn from_hex(key_hex: &str) -> Result<Self, SealError> {
        let bytes = hex::decode(key_hex.trim())
            .map_err(|e| SealError::InvalidKey(format!("not valid hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Use the configured key if present, otherwise generate one.
    pub fn from_config(key_hex: Option<&str>) -> Result<Self, SealError> {
        match key_hex {
            Some(hex) => Self::from_hex(hex),
            None => {
                tracing::debug!("No seal key configured, generating a per-process key");
                Self::generate()
            }
        }
    }

    /// Hex-encoded signature over `payload`.
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time check of a hex signature.
    pub fn verify(&self, payload: &[u8], signature_hex: &str) -> bool {
        let Ok(provided) = hex::decode(signature_hex) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.verify_slice(&provided).is_ok()
    }
}
