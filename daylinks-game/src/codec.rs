//! Versioned persistence of [`PersistedState`].
//!
//! Loading is fail-closed: anything unparsable, from another format version,
//! or missing the `history`/`stats` sections decodes to the default state.
//! So does a history entry whose key differs from its record's `dateKey`.
//! Saving reports failure to the caller but never panics.
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

use crate::clock::DateKey;
use crate::state::PersistedState;

/// Format version written to and expected from storage.
pub const STATE_VERSION: u32 = 1;

/// Name of the single storage entry that holds the state.
pub const STORAGE_KEY: &str = "daylinks_v1";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("state payload is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("state payload is not a JSON object")]
    NotAnObject,
    #[error("unsupported state version {found}, expected {}", STATE_VERSION)]
    Version { found: Value },
    #[error("state payload is missing the `{0}` section")]
    MissingSection(&'static str),
    #[error("state payload has an invalid shape: {0}")]
    Shape(#[source] serde_json::Error),
    #[error("history entry {key} holds the record for {record}")]
    MisfiledDay { key: DateKey, record: DateKey },
    #[error("could not serialize state: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("storage rejected the write: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Durable key/value storage for the serialized state.
/// Platform-specific front-ends provide the implementation.
pub trait StateStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the raw payload stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replace the payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage rejects the write.
    fn write(&self, key: &str, payload: &str) -> Result<(), Self::Error>;
}

/// Fresh state: current version, no history, zeroed stats.
#[must_use]
pub fn default_state() -> PersistedState {
    PersistedState::default()
}

/// Strictly decode a payload.
///
/// # Errors
///
/// Returns an error describing why the payload is not a usable state.
pub fn decode(raw: &str) -> Result<PersistedState, CodecError> {
    let mut value: Value = serde_json::from_str(raw).map_err(CodecError::Parse)?;
    let object = value.as_object_mut().ok_or(CodecError::NotAnObject)?;

    let version = object.get("version").cloned().unwrap_or(Value::Null);
    if !is_current_version(&version) {
        return Err(CodecError::Version { found: version });
    }
    for section in ["history", "stats"] {
        if !object.get(section).is_some_and(Value::is_object) {
            return Err(CodecError::MissingSection(section));
        }
    }
    // `1.0` is the same version as `1`
    object.insert("version".into(), Value::from(STATE_VERSION));

    let state: PersistedState = serde_json::from_value(value).map_err(CodecError::Shape)?;
    if let Some((key, day)) = state.history.iter().find(|(key, day)| **key != day.date_key) {
        return Err(CodecError::MisfiledDay {
            key: *key,
            record: day.date_key,
        });
    }
    Ok(state)
}

fn is_current_version(version: &Value) -> bool {
    version.as_f64().is_some_and(|v| v == f64::from(STATE_VERSION))
}

/// Decode a payload, substituting the default state for anything unusable.
#[must_use]
pub fn load(raw: &str) -> PersistedState {
    decode(raw).unwrap_or_else(|err| {
        log::warn!("Discarding stored state: {err}");
        default_state()
    })
}

/// Serialize a state to its storage payload.
///
/// # Errors
///
/// Returns an error if the state cannot be serialized.
pub fn encode(state: &PersistedState) -> Result<String, CodecError> {
    serde_json::to_string(state).map_err(CodecError::Serialize)
}

/// Load the state held by `storage`, falling back to the default on any failure.
pub fn load_from<S: StateStorage>(storage: &S) -> PersistedState {
    match storage.read(STORAGE_KEY) {
        Ok(Some(raw)) => load(&raw),
        Ok(None) => {
            log::debug!("No stored state under {STORAGE_KEY}; starting fresh");
            default_state()
        }
        Err(err) => {
            log::warn!("Failed to read stored state: {err}");
            default_state()
        }
    }
}

/// Persist `state` into `storage`.
///
/// # Errors
///
/// Returns an error if serialization fails or the storage rejects the write.
/// The in-memory state is unaffected either way.
pub fn save<S: StateStorage>(storage: &S, state: &PersistedState) -> Result<(), CodecError> {
    let payload = encode(state)?;
    storage
        .write(STORAGE_KEY, &payload)
        .map_err(|err| CodecError::Storage(Box::new(err)))
        .inspect_err(|err| log::warn!("Failed to save state: {err}"))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryStorageError {
    #[error("payload of {needed} bytes exceeds quota of {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },
}

/// In-process storage with an optional byte quota, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects any payload larger than `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Rc::default(),
            quota: Some(quota),
        }
    }

    /// Seed an entry directly, bypassing the quota.
    pub fn insert_raw(&self, key: &str, payload: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), payload.to_string());
    }
}

impl StateStorage for MemoryStorage {
    type Error = MemoryStorageError;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), Self::Error> {
        if let Some(quota) = self.quota
            && payload.len() > quota
        {
            return Err(MemoryStorageError::QuotaExceeded {
                needed: payload.len(),
                quota,
            });
        }
        self.insert_raw(key, payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{DayRecord, Stats};
    use serde_json::json;

    #[test]
    fn default_round_trips() {
        let raw = encode(&default_state()).unwrap();
        assert_eq!(load(&raw), default_state());
        assert_eq!(
            serde_json::from_str::<Value>(&raw).unwrap(),
            json!({
                "version": 1,
                "history": {},
                "stats": {
                    "played": 0,
                    "completed": 0,
                    "currentStreak": 0,
                    "longestStreak": 0,
                    "avgCluesUsed": 0.0,
                },
            })
        );
    }

    #[test]
    fn garbage_loads_default() {
        assert_eq!(load("not json"), default_state());
        assert_eq!(load(""), default_state());
        assert_eq!(load("[1,2,3]"), default_state());
        assert!(matches!(decode("[]"), Err(CodecError::NotAnObject)));
    }

    #[test]
    fn wrong_version_loads_default() {
        let mut value = serde_json::to_value(default_state()).unwrap();
        value["version"] = json!(2);
        let raw = value.to_string();
        assert!(matches!(decode(&raw), Err(CodecError::Version { .. })));
        assert_eq!(load(&raw), default_state());
    }

    #[test]
    fn float_version_one_is_current() {
        let mut value = serde_json::to_value(default_state()).unwrap();
        value["version"] = json!(1.0);
        value["stats"]["played"] = json!(5);
        let state = decode(&value.to_string()).unwrap();
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.stats.played, 5);

        value["version"] = json!(1.5);
        assert!(matches!(
            decode(&value.to_string()),
            Err(CodecError::Version { .. })
        ));
    }

    #[test]
    fn misfiled_day_loads_default() {
        let raw = json!({
            "version": 1,
            "history": {
                "2025-12-17": {
                    "dateKey": "2025-12-18",
                    "puzzleId": 2,
                    "status": "in_progress",
                    "clueIndex": 0,
                    "eliminatedOptionIds": [],
                    "guesses": [],
                }
            },
            "stats": {
                "played": 1,
                "completed": 0,
                "currentStreak": 0,
                "longestStreak": 0,
                "avgCluesUsed": 0,
            },
        })
        .to_string();
        assert!(matches!(
            decode(&raw),
            Err(CodecError::MisfiledDay { key, record })
                if key.to_string() == "2025-12-17" && record.to_string() == "2025-12-18"
        ));
        assert_eq!(load(&raw), default_state());
    }

    #[test]
    fn missing_sections_load_default() {
        let raw = json!({"version": 1, "stats": {}}).to_string();
        assert!(matches!(decode(&raw), Err(CodecError::MissingSection("history"))));
        let raw = json!({"version": 1, "history": {}, "stats": null}).to_string();
        assert!(matches!(decode(&raw), Err(CodecError::MissingSection("stats"))));
        assert_eq!(load(&raw), default_state());
    }

    #[test]
    fn malformed_day_loads_default() {
        let raw = json!({
            "version": 1,
            "history": {"2025-12-17": {"dateKey": "2025-12-17", "status": "bogus"}},
            "stats": Stats::default(),
        })
        .to_string();
        assert!(matches!(decode(&raw), Err(CodecError::Shape(_))));
        assert_eq!(load(&raw), default_state());
    }

    #[test]
    fn populated_state_round_trips() {
        let key = "2025-12-17".parse().unwrap();
        let mut state = default_state();
        state.history.insert(key, DayRecord::new(key, 1));
        state.stats.played = 1;
        let raw = encode(&state).unwrap();
        assert_eq!(decode(&raw).unwrap(), state);
    }

    #[test]
    fn storage_round_trip_and_missing_entry() {
        let storage = MemoryStorage::new();
        assert_eq!(load_from(&storage), default_state());

        let mut state = default_state();
        state.stats.played = 4;
        save(&storage, &state).unwrap();
        assert_eq!(load_from(&storage), state);
    }

    #[test]
    fn quota_failure_is_reported_not_raised() {
        let storage = MemoryStorage::with_quota(8);
        let result = save(&storage, &default_state());
        assert!(matches!(result, Err(CodecError::Storage(_))));
        assert_eq!(storage.read(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn corrupted_storage_entry_loads_default() {
        let storage = MemoryStorage::new();
        storage.insert_raw(STORAGE_KEY, "{\"version\":1,");
        assert_eq!(load_from(&storage), default_state());
    }
}
