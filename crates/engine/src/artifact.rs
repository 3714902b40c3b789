//! The prompt artifact: the only thing the gateway will send to a model.
//!
//! Fields are private and the constructor is crate-private, so outside this
//! crate an artifact can only come from [`Orchestrator::build`] or from
//! deserialization. The seal tells the two apart: it is an HMAC over the
//! canonical encoding, keyed with the process's [`SealKey`].
//!
//! [`Orchestrator::build`]: crate::Orchestrator::build

use promptward_core::{Message, Purpose};
use promptward_security::SealKey;
use serde::{Deserialize, Serialize};

/// An assembled, sealed, ready-to-send message sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArtifact {
    prompt_id: String,
    purpose: Purpose,
    messages: Vec<Message>,
    stable_hash: String,
    volatile_hash: String,
    total_tokens: usize,
    seal: String,
}

/// The fields the seal covers, in a fixed order.
#[derive(Serialize)]
struct Canonical<'a> {
    prompt_id: &'a str,
    purpose: Purpose,
    messages: &'a [Message],
    stable_hash: &'a str,
    volatile_hash: &'a str,
    total_tokens: usize,
}

impl PromptArtifact {
    pub(crate) fn sealed(
        prompt_id: String,
        purpose: Purpose,
        messages: Vec<Message>,
        stable_hash: String,
        volatile_hash: String,
        total_tokens: usize,
        key: &SealKey,
    ) -> Self {
        let mut artifact = Self {
            prompt_id,
            purpose,
            messages,
            stable_hash,
            volatile_hash,
            total_tokens,
            seal: String::new(),
        };
        artifact.seal = key.sign(&artifact.canonical_bytes());
        artifact
    }

    fn canonical_bytes(&self) -> Vec<u8> {
        let canonical = Canonical {
            prompt_id: &self.prompt_id,
            purpose: self.purpose,
            messages: &self.messages,
            stable_hash: &self.stable_hash,
            volatile_hash: &self.volatile_hash,
            total_tokens: self.total_tokens,
        };
        // Serializing plain strings, enums and integers cannot fail.
        serde_json::to_vec(&canonical).unwrap_or_default()
    }

    /// Whether this artifact was built by an orchestrator holding `key` and
    /// has not been altered since.
    pub fn verify_seal(&self, key: &SealKey) -> bool {
        !self.seal.is_empty() && key.verify(&self.canonical_bytes(), &self.seal)
    }

    pub fn prompt_id(&self) -> &str {
        &self.prompt_id
    }

    pub fn purpose(&self) -> Purpose {
        self.purpose
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn stable_hash(&self) -> &str {
        &self.stable_hash
    }

    pub fn volatile_hash(&self) -> &str {
        &self.volatile_hash
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(key: &SealKey) -> PromptArtifact {
        PromptArtifact::sealed(
            "p-1".into(),
            Purpose::IntentExtraction,
            vec![Message::system("rules"), Message::user("book a table")],
            "s".into(),
            "v".into(),
            12,
            key,
        )
    }

    #[test]
    fn sealed_artifact_verifies() {
        let key = SealKey::generate().unwrap();
        assert!(artifact(&key).verify_seal(&key));
    }

    #[test]
    fn tampered_purpose_fails_verification() {
        let key = SealKey::generate().unwrap();
        let mut json = serde_json::to_value(artifact(&key)).unwrap();
        json["purpose"] = "execution".into();
        let forged: PromptArtifact = serde_json::from_value(json).unwrap();
        assert_eq!(forged.purpose(), Purpose::Execution);
        assert!(!forged.verify_seal(&key));
    }

    #[test]
    fn hand_built_artifact_fails_verification() {
        let key = SealKey::generate().unwrap();
        let forged: PromptArtifact = serde_json::from_str(
            r#"{"prompt_id":"x","purpose":"planning","messages":[],"stable_hash":"","volatile_hash":"","total_tokens":0,"seal":""}"#,
        )
        .unwrap();
        assert!(!forged.verify_seal(&key));
    }

    #[test]
    fn serialized_artifact_survives_roundtrip_with_same_key() {
        let key = SealKey::generate().unwrap();
        let json = serde_json::to_string(&artifact(&key)).unwrap();
        let back: PromptArtifact = serde_json::from_str(&json).unwrap();
        assert!(back.verify_seal(&key));
        assert!(!back.verify_seal(&SealKey::generate().unwrap()));
    }
}
