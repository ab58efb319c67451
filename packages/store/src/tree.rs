//! # Realtime tree store contract
//!
//! Application data lives in a path-addressed JSON tree (`"notes/{id}"`,
//! `"profiles/{uid}"`). The hosted database behind it is an external
//! collaborator, so this module only fixes the contract every backend must
//! honour:
//!
//! | Method | Semantics |
//! |--------|-----------|
//! | [`read`](Store::read) | Point-in-time [`Snapshot`] of a path; absent paths yield an empty snapshot. |
//! | [`write`](Store::write) | Full replace at a path. Writing `null` removes the path. |
//! | [`update`](Store::update) | Merge child fields into a path; a `null` child removes that child. Keys may themselves be `/`-separated sub-paths, applied together. |
//! | [`delete`](Store::delete) | Remove a path and everything beneath it. |
//! | [`append`](Store::append) | Reserve a fresh, never-reused child key under a collection. Nothing is written. |
//! | [`subscribe`](Store::subscribe) | Deliver the current snapshot immediately, then again after every change that touches the path. |
//!
//! Subscriptions live as long as the returned [`Subscription`]; dropping it
//! detaches the callbacks.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::listeners::ListenerHandle;

/// Handle keeping a store subscription alive.
pub type Subscription = ListenerHandle;

/// Async interface to the hosted tree store.
pub trait Store {
    fn read(&self, path: &str) -> impl std::future::Future<Output = Result<Snapshot, StoreError>>;

    fn write(
        &self,
        path: &str,
        value: Value,
    ) -> impl std::future::Future<Output = Result<(), StoreError>>;

    fn update(
        &self,
        path: &str,
        fields: Map<String, Value>,
    ) -> impl std::future::Future<Output = Result<(), StoreError>>;

    fn delete(&self, path: &str) -> impl std::future::Future<Output = Result<(), StoreError>>;

    fn append(&self, path: &str) -> impl std::future::Future<Output = Result<String, StoreError>>;

    fn subscribe(
        &self,
        path: &str,
        on_snapshot: impl Fn(&Snapshot) + Send + Sync + 'static,
        on_error: impl Fn(&StoreError) + Send + Sync + 'static,
    ) -> Subscription;
}

/// Point-in-time payload for one path.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    path: String,
    value: Value,
}

impl Snapshot {
    pub fn new(path: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.unwrap_or(Value::Null),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment, `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.path.rsplit('/').find(|s| !s.is_empty())
    }

    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Decode the payload, `Ok(None)` when the path is absent.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        if !self.exists() {
            return Ok(None);
        }
        serde_json::from_value(self.value.clone())
            .map(Some)
            .map_err(|e| StoreError::Decode {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    /// Keyed child entries, empty unless the payload is an object.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.value
            .as_object()
            .into_iter()
            .flat_map(|map| map.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

/// Split a path into segments. The empty path (or `"/"`) is the root.
pub fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let segs: Vec<&str> = trimmed.split('/').collect();
    let invalid = segs
        .iter()
        .any(|s| s.is_empty() || s.contains(['.', '#', '$', '[', ']']));
    if invalid {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segs)
}

/// Join a collection path and a child key.
pub fn child_path(parent: &str, key: &str) -> String {
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}/{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_segments() {
        assert!(segments("").unwrap().is_empty());
        assert!(segments("/").unwrap().is_empty());
        assert_eq!(segments("notes/abc").unwrap(), vec!["notes", "abc"]);
        assert_eq!(segments("/profiles/u1/").unwrap(), vec!["profiles", "u1"]);
        assert!(segments("notes//abc").is_err());
        assert!(segments("notes/a.b").is_err());
    }

    #[test]
    fn test_snapshot_children_and_key() {
        let snap = Snapshot::new("notes", Some(json!({"a": {"title": "x"}, "b": 1})));
        assert_eq!(snap.key(), Some("notes"));
        let keys: Vec<&str> = snap.children().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);

        let empty = Snapshot::new("notes", None);
        assert!(!empty.exists());
        assert_eq!(empty.children().count(), 0);
        assert_eq!(empty.deserialize::<String>().unwrap(), None);
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("notes", "k1"), "notes/k1");
        assert_eq!(child_path("notes/", "k1"), "notes/k1");
        assert_eq!(child_path("", "k1"), "k1");
    }
}
