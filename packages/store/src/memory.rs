use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::listeners::Listeners;
use crate::tree::{segments, Snapshot, Store, Subscription};

/// In-memory tree store for testing, local development and the demo binary.
///
/// Clones share the same tree. Fault injection (`fail_writes_under`,
/// `fail_reads_under`, `fail_subscribers`) lets tests exercise the error paths
/// of the hosted database.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    root: Arc<Mutex<Value>>,
    events: Listeners<TreeEvent>,
    faults: Arc<Mutex<Faults>>,
}

#[derive(Debug, Default)]
struct Faults {
    writes: Vec<Vec<String>>,
    reads: Vec<Vec<String>>,
}

#[derive(Debug)]
enum TreeEvent {
    Changed { path: Vec<String>, root: Arc<Value> },
    Failed { path: Vec<String>, reason: String },
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write, update or delete at or below `prefix` fail.
    pub fn fail_writes_under(&self, prefix: &str) {
        lock(&self.faults).writes.push(owned_segments(prefix));
    }

    /// Make every read at or below `prefix` fail.
    pub fn fail_reads_under(&self, prefix: &str) {
        lock(&self.faults).reads.push(owned_segments(prefix));
    }

    pub fn clear_faults(&self) {
        let mut faults = lock(&self.faults);
        faults.writes.clear();
        faults.reads.clear();
    }

    /// Report a subscription failure to every subscriber of `path`.
    pub fn fail_subscribers(&self, path: &str, reason: &str) {
        self.events.emit(&TreeEvent::Failed {
            path: owned_segments(path),
            reason: reason.to_string(),
        });
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.events.len()
    }

    /// Synchronous read used by tests and diagnostics.
    pub fn get(&self, path: &str) -> Option<Value> {
        let segs = owned_segments(path);
        get_at(&lock(&self.root), &segs).cloned()
    }

    fn check_write(&self, path: &str, segs: &[String]) -> Result<(), StoreError> {
        if lock(&self.faults).writes.iter().any(|p| is_prefix(p, segs)) {
            tracing::debug!(path, "injected write failure");
            return Err(StoreError::WriteFailure {
                path: path.to_string(),
                reason: "permission denied".to_string(),
            });
        }
        Ok(())
    }

    fn mutate(&self, segs: Vec<String>, apply: impl FnOnce(&mut Value)) {
        let root = {
            let mut root = lock(&self.root);
            apply(&mut root);
            Arc::new(root.clone())
        };
        self.events.emit(&TreeEvent::Changed { path: segs, root });
    }
}

impl Store for MemoryStore {
    async fn read(&self, path: &str) -> Result<Snapshot, StoreError> {
        let segs = parse(path)?;
        if lock(&self.faults).reads.iter().any(|p| is_prefix(p, &segs)) {
            return Err(StoreError::ReadFailure {
                path: path.to_string(),
                reason: "permission denied".to_string(),
            });
        }
        let value = get_at(&lock(&self.root), &segs).cloned();
        Ok(Snapshot::new(path, value))
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segs = parse(path)?;
        self.check_write(path, &segs)?;
        let value = normalize(value);
        self.mutate(segs.clone(), |root| set_at(root, &segs, value));
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let segs = parse(path)?;
        let mut targets = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            let mut full = segs.clone();
            full.extend(parse(&key)?);
            self.check_write(path, &full)?;
            targets.push((full, normalize(value)));
        }
        self.mutate(segs, |root| {
            for (full, value) in targets {
                set_at(root, &full, value);
            }
        });
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let segs = parse(path)?;
        self.check_write(path, &segs)?;
        self.mutate(segs.clone(), |root| remove_at(root, &segs));
        Ok(())
    }

    async fn append(&self, path: &str) -> Result<String, StoreError> {
        parse(path)?;
        Ok(uuid::Uuid::new_v4().simple().to_string())
    }

    fn subscribe(
        &self,
        path: &str,
        on_snapshot: impl Fn(&Snapshot) + Send + Sync + 'static,
        on_error: impl Fn(&StoreError) + Send + Sync + 'static,
    ) -> Subscription {
        let watched = owned_segments(path);
        let display = path.to_string();
        let on_snapshot = Arc::new(on_snapshot);

        let deliver = Arc::clone(&on_snapshot);
        let watched_in_cb = watched.clone();
        let display_in_cb = display.clone();
        let handle = self.events.add(move |event| match event {
            TreeEvent::Changed { path, root } => {
                if is_prefix(path, &watched_in_cb) || is_prefix(&watched_in_cb, path) {
                    let value = get_at(root, &watched_in_cb).cloned();
                    deliver(&Snapshot::new(display_in_cb.clone(), value));
                }
            }
            TreeEvent::Failed { path, reason } => {
                if is_prefix(path, &watched_in_cb) {
                    on_error(&StoreError::SubscriptionFailure {
                        path: display_in_cb.clone(),
                        reason: reason.clone(),
                    });
                }
            }
        });

        let current = get_at(&lock(&self.root), &watched).cloned();
        on_snapshot(&Snapshot::new(display, current));
        handle
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn parse(path: &str) -> Result<Vec<String>, StoreError> {
    Ok(segments(path)?.into_iter().map(str::to_string).collect())
}

fn owned_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_prefix(prefix: &[String], path: &[String]) -> bool {
    prefix.len() <= path.len() && prefix.iter().zip(path).all(|(a, b)| a == b)
}

fn get_at<'a>(node: &'a Value, segs: &[String]) -> Option<&'a Value> {
    let value = segs.iter().try_fold(node, |node, seg| node.as_object()?.get(seg))?;
    (!value.is_null()).then_some(value)
}

fn set_at(node: &mut Value, segs: &[String], value: Value) {
    if value.is_null() {
        remove_at(node, segs);
        return;
    }
    let Some((first, rest)) = segs.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(first.clone()).or_insert(Value::Null);
        set_at(child, rest, value);
        if child.is_null() {
            map.remove(first);
        }
    }
}

fn remove_at(node: &mut Value, segs: &[String]) {
    let Some((first, rest)) = segs.split_first() else {
        *node = Value::Null;
        return;
    };
    if let Value::Object(map) = node {
        if rest.is_empty() {
            map.remove(first);
        } else if let Some(child) = map.get_mut(first) {
            remove_at(child, rest);
            if child.is_null() {
                map.remove(first);
            }
        }
        if map.is_empty() {
            *node = Value::Null;
        }
    }
}

/// Drop `null` children and empty objects, as the hosted store does.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map)
            }
        }
        other => other,
    }
}
