//! Persistent per-player component state
//!
//! Some components carry progress across rounds (collector meters,
//! accumulating counters), keyed by bet method, bet amount and component
//! name. The whole store round-trips through a string-keyed public/private
//! JSON blob so hosts can persist it opaquely.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sg_core::{SgError, SgResult};

/// Key of one persisted entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerKey {
    pub bet_method: u32,
    pub bet_amount: i64,
    pub component: String,
}

impl PlayerKey {
    /// Key for a component under one bet configuration
    pub fn new(bet_method: u32, bet_amount: i64, component: impl Into<String>) -> Self {
        Self {
            bet_method,
            bet_amount,
            component: component.into(),
        }
    }

    fn blob_key(&self) -> String {
        format!("{}:{}:{}", self.bet_method, self.bet_amount, self.component)
    }

    fn from_blob_key(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, ':');
        let bet_method = parts.next()?.parse().ok()?;
        let bet_amount = parts.next()?.parse().ok()?;
        let component = parts.next()?.to_string();
        Some(Self {
            bet_method,
            bet_amount,
            component,
        })
    }
}

/// One persisted value with its visibility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub value: serde_json::Value,
    /// Private entries are withheld from the public half of the blob
    #[serde(default)]
    pub private: bool,
}

/// String-keyed wire form of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerBlob {
    #[serde(default)]
    pub public: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub private: BTreeMap<String, serde_json::Value>,
}

/// Per-player persistent state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerState {
    entries: BTreeMap<PlayerKey, PlayerEntry>,
}

impl PlayerState {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a public value
    pub fn set(&mut self, key: PlayerKey, value: serde_json::Value) {
        self.entries.insert(
            key,
            PlayerEntry {
                value,
                private: false,
            },
        );
    }

    /// Store a private value
    pub fn set_private(&mut self, key: PlayerKey, value: serde_json::Value) {
        self.entries.insert(
            key,
            PlayerEntry {
                value,
                private: true,
            },
        );
    }

    /// Read a value
    pub fn get(&self, key: &PlayerKey) -> Option<&serde_json::Value> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Remove an entry
    pub fn remove(&mut self, key: &PlayerKey) -> Option<serde_json::Value> {
        self.entries.remove(key).map(|e| e.value)
    }

    /// Entry count
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries are stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Partition into the public/private wire form
    pub fn to_blob(&self) -> PlayerBlob {
        let mut blob = PlayerBlob::default();
        for (key, entry) in &self.entries {
            let bucket = if entry.private {
                &mut blob.private
            } else {
                &mut blob.public
            };
            bucket.insert(key.blob_key(), entry.value.clone());
        }
        blob
    }

    /// Rebuild from the wire form; malformed keys are a hard error
    pub fn from_blob(blob: &PlayerBlob) -> SgResult<Self> {
        let mut state = Self::new();
        for (private, bucket) in [(false, &blob.public), (true, &blob.private)] {
            for (raw, value) in bucket {
                let key = PlayerKey::from_blob_key(raw).ok_or_else(|| {
                    SgError::Serialization(format!("malformed player state key {raw}"))
                })?;
                state.entries.insert(
                    key,
                    PlayerEntry {
                        value: value.clone(),
                        private,
                    },
                );
            }
        }
        Ok(state)
    }

    /// Serialize the blob to JSON
    pub fn to_json(&self) -> SgResult<String> {
        serde_json::to_string(&self.to_blob()).map_err(|e| SgError::Serialization(e.to_string()))
    }

    /// Deserialize from blob JSON
    pub fn from_json(json: &str) -> SgResult<Self> {
        let blob: PlayerBlob =
            serde_json::from_str(json).map_err(|e| SgError::Serialization(e.to_string()))?;
        Self::from_blob(&blob)
    }
}
