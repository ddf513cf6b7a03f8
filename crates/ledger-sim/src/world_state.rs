//! # World State
//!
//! Key/value store per contract, with just enough contract behavior for the
//! stock asset contracts:
//!
//! | function prefix | effect on submit                        |
//! |-----------------|-----------------------------------------|
//! | `Burn`          | delete `args[0]`                        |
//! | `Transfer`      | `args = (id, from, to)`, rewrite owner  |
//! | anything else   | create `args[0]`, fails if it exists    |
//!
//! Reads: `GetAll*` returns every value as a JSON array, anything else
//! returns the value stored under `args[0]`.

use serde_json::{json, Value};
use shared_types::LedgerError;
use std::collections::{BTreeMap, HashMap};

/// Effect of one mutating call, computed at endorsement and applied at commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Put { key: String, value: Value },
    Delete { key: String },
}

impl Write {
    pub fn key(&self) -> &str {
        match self {
            Write::Put { key, .. } | Write::Delete { key } => key,
        }
    }

    /// Event payload for this write.
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Write::Put { value, .. } => value.to_string().into_bytes(),
            Write::Delete { key } => json!({ "id": key }).to_string().into_bytes(),
        }
    }
}

#[derive(Debug, Default)]
pub struct WorldState {
    contracts: HashMap<String, BTreeMap<String, Value>>,
}

impl WorldState {
    /// Endorse a mutating call against current state.
    pub fn simulate(&self, contract: &str, function: &str, args: &[String]) -> Result<Write, LedgerError> {
        let Some(key) = args.first() else {
            return Err(LedgerError::Contract(format!("{function}: missing asset id")));
        };
        let current = self.contracts.get(contract).and_then(|kv| kv.get(key));

        if function.starts_with("Burn") {
            return match current {
                Some(_) => Ok(Write::Delete { key: key.clone() }),
                None => Err(not_found(key)),
            };
        }

        if function.starts_with("Transfer") {
            let (Some(from), Some(to)) = (args.get(1), args.get(2)) else {
                return Err(LedgerError::Contract(format!("{function}: expected id, from, to")));
            };
            let Some(existing) = current else {
                return Err(not_found(key));
            };
            if existing.get("owner").and_then(Value::as_str) != Some(from.as_str()) {
                return Err(LedgerError::Contract(format!("asset {key} is not owned by {from}")));
            }
            let mut value = existing.clone();
            value["owner"] = Value::String(to.clone());
            return Ok(Write::Put {
                key: key.clone(),
                value,
            });
        }

        if current.is_some() {
            return Err(LedgerError::Contract(format!("asset {key} already exists")));
        }
        Ok(Write::Put {
            key: key.clone(),
            value: json!({
                "id": key,
                "owner": args.get(1),
                "fields": args,
            }),
        })
    }

    pub fn apply(&mut self, contract: &str, write: Write) {
        let kv = self.contracts.entry(contract.to_string()).or_default();
        match write {
            Write::Put { key, value } => {
                kv.insert(key, value);
            }
            Write::Delete { key } => {
                kv.remove(&key);
            }
        }
    }

    pub fn read(&self, contract: &str, function: &str, args: &[String]) -> Result<Vec<u8>, LedgerError> {
        let empty = BTreeMap::new();
        let kv = self.contracts.get(contract).unwrap_or(&empty);

        if function.starts_with("GetAll") {
            return Ok(Value::Array(kv.values().cloned().collect())
                .to_string()
                .into_bytes());
        }

        let Some(key) = args.first() else {
            return Err(LedgerError::Contract(format!("{function}: missing asset id")));
        };
        kv.get(key)
            .map(|v| v.to_string().into_bytes())
            .ok_or_else(|| not_found(key))
    }
}

fn not_found(key: &str) -> LedgerError {
    LedgerError::Contract(format!("asset {key} does not exist"))
}
