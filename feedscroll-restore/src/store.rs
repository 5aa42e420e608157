use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};
use crate::key::ScrollKey;
use crate::storage::DurableStorage;

/// Schema version written by this build.
pub const CURRENT_VERSION: u64 = 1;

pub const DEFAULT_NAMESPACE: &str = "feedscroll.scroll-positions";

/// Seven days.
pub const DEFAULT_RETENTION_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// A saved scroll position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollRecord {
    pub x: f64,
    pub y: f64,
    /// When the position was captured (ms).
    pub timestamp: u64,
    /// When the key was last active (ms). Drives expiry.
    pub last_visited: u64,
}

impl ScrollRecord {
    pub fn is_expired(&self, retention_ms: u64, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_visited) > retention_ms
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Storage key the whole document lives under.
    pub namespace: String,
    /// Records whose `last_visited` is older than this are treated as absent.
    pub retention_ms: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            retention_ms: DEFAULT_RETENTION_MS,
        }
    }
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_retention_ms(mut self, retention_ms: u64) -> Self {
        self.retention_ms = retention_ms;
        self
    }
}

#[derive(Deserialize)]
struct Document {
    entries: BTreeMap<String, ScrollRecord>,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u64,
    entries: &'a BTreeMap<String, ScrollRecord>,
}

/// Version 0 layout: a bare map of these, with no wrapper.
#[derive(Deserialize)]
struct LegacyRecord {
    x: f64,
    y: f64,
    timestamp: u64,
}

fn decode(raw: &str) -> Result<BTreeMap<String, ScrollRecord>> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    match value.get("version") {
        Some(version) => {
            let version: u64 = serde_json::from_value(version.clone())?;
            if version != CURRENT_VERSION {
                return Err(StorageError::UnsupportedVersion(version));
            }
            let doc: Document = serde_json::from_value(value)?;
            Ok(doc.entries)
        }
        None => {
            let legacy: BTreeMap<String, LegacyRecord> = serde_json::from_value(value)?;
            Ok(legacy
                .into_iter()
                .map(|(key, r)| {
                    let record = ScrollRecord {
                        x: r.x,
                        y: r.y,
                        timestamp: r.timestamp,
                        last_visited: r.timestamp,
                    };
                    (key, record)
                })
                .collect())
        }
    }
}

/// Keyed scroll positions, written through to a [`DurableStorage`] backend.
///
/// The store never fails: backend and decoding errors are logged and the store behaves as if
/// nothing had been saved. Records written during a session stay readable in memory even when
/// the backend refuses them.
#[derive(Debug)]
pub struct ScrollPositionStore<S> {
    storage: S,
    options: StoreOptions,
    entries: Option<BTreeMap<String, ScrollRecord>>,
}

impl<S: DurableStorage> ScrollPositionStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_options(storage, StoreOptions::default())
    }

    pub fn with_options(storage: S, options: StoreOptions) -> Self {
        Self {
            storage,
            options,
            entries: None,
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn entries(&mut self) -> &mut BTreeMap<String, ScrollRecord> {
        let Self {
            storage,
            options,
            entries,
        } = self;
        entries.get_or_insert_with(|| load(storage, &options.namespace))
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn persist(&mut self) {
        let Some(entries) = self.entries.as_ref() else {
            return;
        };
        let doc = DocumentRef {
            version: CURRENT_VERSION,
            entries,
        };
        let result = serde_json::to_string(&doc)
            .map_err(StorageError::from)
            .and_then(|raw| self.storage.write(&self.options.namespace, &raw));
        if let Err(err) = result {
            vwarn!(
                namespace = %self.options.namespace,
                error = %err,
                "failed to persist scroll positions"
            );
        }
    }

    /// Upserts the position for `key`. Non-finite coordinates are ignored.
    pub fn save(&mut self, key: &ScrollKey, x: f64, y: f64, now_ms: u64) {
        if !x.is_finite() || !y.is_finite() {
            vtrace!(key = %key, x, y, "ignoring non-finite scroll position");
            return;
        }
        let record = ScrollRecord {
            x,
            y,
            timestamp: now_ms,
            last_visited: now_ms,
        };
        self.entries().insert(key.as_str().to_owned(), record);
        vtrace!(key = %key, x, y, "saved scroll position");
        self.persist();
    }

    /// The saved position for `key`, or `None` if there is none or it has expired.
    pub fn get(&mut self, key: &ScrollKey, now_ms: u64) -> Option<ScrollRecord> {
        let retention_ms = self.options.retention_ms;
        self.entries()
            .get(key.as_str())
            .copied()
            .filter(|r| !r.is_expired(retention_ms, now_ms))
    }

    /// Marks `key` as visited now. No-op if there is no record.
    pub fn touch(&mut self, key: &ScrollKey, now_ms: u64) {
        let Some(record) = self.entries().get_mut(key.as_str()) else {
            return;
        };
        record.last_visited = now_ms;
        self.persist();
    }

    pub fn clear(&mut self, key: &ScrollKey) {
        if self.entries().remove(key.as_str()).is_some() {
            self.persist();
        }
    }

    /// Drops every record and the persisted document.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn clear_all(&mut self) {
        self.entries = Some(BTreeMap::new());
        if let Err(err) = self.storage.remove(&self.options.namespace) {
            vwarn!(
                namespace = %self.options.namespace,
                error = %err,
                "failed to clear scroll positions"
            );
        }
    }

    /// Removes records last visited more than `retention_ms` before `now_ms`. Returns how many
    /// were removed.
    pub fn sweep_expired(&mut self, retention_ms: u64, now_ms: u64) -> usize {
        let entries = self.entries();
        let before = entries.len();
        entries.retain(|_, r| !r.is_expired(retention_ms, now_ms));
        let removed = before - entries.len();
        if removed > 0 {
            vdebug!(removed, "swept expired scroll positions");
            self.persist();
        }
        removed
    }

    /// Number of records held, expired ones included until the next sweep.
    pub fn len(&mut self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn load<S: DurableStorage>(storage: &S, namespace: &str) -> BTreeMap<String, ScrollRecord> {
    let raw = match storage.read(namespace) {
        Ok(Some(raw)) => raw,
        Ok(None) => return BTreeMap::new(),
        Err(err) => {
            vwarn!(namespace, error = %err, "failed to read scroll positions");
            return BTreeMap::new();
        }
    };
    match decode(&raw) {
        Ok(entries) => {
            vdebug!(namespace, count = entries.len(), "loaded scroll positions");
            entries
        }
        Err(err) => {
            vwarn!(namespace, error = %err, "discarding unreadable scroll positions");
            BTreeMap::new()
        }
    }
}
