// Vault module
// グローバルシークレット管理

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A global credential entry. Not scoped to any project.
///
/// `value` holds whatever the vault's [`SecretBackend`] produced when the
/// secret was added; read it back through [`Vault::reveal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub id: String,
    pub key: String,
    pub value: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
}

impl Secret {
    pub fn new(id: &str, key: &str, value: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            description: description.to_string(),
            last_accessed: None,
        }
    }
}

/// How secret values are held at rest.
pub trait SecretBackend: Send {
    fn name(&self) -> &'static str;
    fn seal(&self, plain: &str) -> String;
    fn open(&self, sealed: &str) -> String;
}

/// Stores values as given. A placeholder until an encrypting backend exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextBackend;

impl SecretBackend for PlaintextBackend {
    fn name(&self) -> &'static str {
        "plaintext"
    }

    fn seal(&self, plain: &str) -> String {
        plain.to_string()
    }

    fn open(&self, sealed: &str) -> String {
        sealed.to_string()
    }
}

pub const MASK: &str = "••••••••••••";

pub struct Vault {
    backend: Box<dyn SecretBackend>,
    secrets: Vec<Secret>,
}

impl Vault {
    pub fn new(backend: Box<dyn SecretBackend>, seed: Vec<Secret>) -> Self {
        let secrets = seed
            .into_iter()
            .map(|mut secret| {
                secret.value = backend.seal(&secret.value);
                secret
            })
            .collect();
        Self { backend, secrets }
    }

    pub fn plaintext(seed: Vec<Secret>) -> Self {
        Self::new(Box::new(PlaintextBackend), seed)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn secrets(&self) -> &[Secret] {
        &self.secrets
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Secret> {
        self.secrets.iter().find(|s| s.id == id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.secrets.iter().any(|s| s.key == key)
    }

    /// Appends a secret. Duplicate keys are allowed; entries stay
    /// distinguishable by id only.
    pub fn add(&mut self, id: String, key: &str, value: &str, description: &str) -> &Secret {
        let sealed = self.backend.seal(value);
        self.secrets.push(Secret {
            id,
            key: key.to_string(),
            value: sealed,
            description: description.to_string(),
            last_accessed: None,
        });
        &self.secrets[self.secrets.len() - 1]
    }

    pub fn delete(&mut self, id: &str) -> Option<Secret> {
        let index = self.secrets.iter().position(|s| s.id == id)?;
        Some(self.secrets.remove(index))
    }

    /// Opens a secret value and stamps `last_accessed`.
    pub fn reveal(&mut self, id: &str) -> Option<String> {
        let secret = self.secrets.iter_mut().find(|s| s.id == id)?;
        secret.last_accessed = Some(Utc::now());
        Some(self.backend.open(&secret.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Reversing;

    impl SecretBackend for Reversing {
        fn name(&self) -> &'static str {
            "reversing"
        }

        fn seal(&self, plain: &str) -> String {
            plain.chars().rev().collect()
        }

        fn open(&self, sealed: &str) -> String {
            sealed.chars().rev().collect()
        }
    }

    #[test]
    fn duplicate_keys_are_kept_apart_by_id() {
        let mut vault = Vault::plaintext(Vec::new());
        vault.add("sec-a".to_string(), "TOKEN", "one", "");
        vault.add("sec-b".to_string(), "TOKEN", "two", "");
        assert_eq!(vault.len(), 2);
        assert_eq!(vault.delete("sec-a").map(|s| s.value), Some("one".to_string()));
        assert_eq!(vault.get("sec-b").map(|s| s.value.as_str()), Some("two"));
    }

    #[test]
    fn delete_missing_is_none() {
        let mut vault = Vault::plaintext(vec![Secret::new("sec-1", "K", "V", "")]);
        assert!(vault.delete("sec-9").is_none());
        assert_eq!(vault.len(), 1);
    }

    #[test]
    fn backend_seals_stored_values() {
        let mut vault = Vault::new(Box::new(Reversing), vec![Secret::new("sec-1", "K", "abc", "")]);
        assert_eq!(vault.get("sec-1").map(|s| s.value.as_str()), Some("cba"));
        assert_eq!(vault.reveal("sec-1").as_deref(), Some("abc"));
        assert!(vault.get("sec-1").and_then(|s| s.last_accessed).is_some());
        assert_eq!(vault.backend_name(), "reversing");
    }
}
