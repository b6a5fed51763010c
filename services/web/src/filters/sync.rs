//! Debounced synchronization of filter updates into a canonical query string.
//!
//! Each marketplace visitor owns one `FilterSync`. Updates merge a partial
//! filter patch into the last committed query, preserving keys the codec does
//! not recognize, and commit through a [`UrlSink`] after a debounce delay.
//! Rapid updates coalesce to the last requested state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;
use url::form_urlencoded;
use uuid::Uuid;

use crate::filters::{self, FilterPatch, SortBy};

/// Default debounce for filter mutations. Tab switches bypass it.
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;

/// Receives committed query strings. Production wires a logging sink; tests
/// substitute a recording one.
pub trait UrlSink: Send + Sync + 'static {
    fn commit(&self, query: &str);
}

/// Sink used by the service: the committed query is observable in the
/// request log and through the read endpoint.
pub struct TraceSink;

impl UrlSink for TraceSink {
    fn commit(&self, query: &str) {
        info!("Marketplace filters committed: {:?}", query);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncSnapshot {
    pub committed: String,
    /// Target of an armed debounce timer, if any.
    pub pending: Option<String>,
}

struct PendingCommit {
    target: String,
    seq: u64,
    handle: JoinHandle<()>,
}

struct SyncInner {
    committed: String,
    pending: Option<PendingCommit>,
    seq: u64,
}

/// Per-visitor filter synchronizer. `update` is cheap and non-blocking; the
/// lock is never held across an await point.
pub struct FilterSync {
    inner: Arc<Mutex<SyncInner>>,
    sink: Arc<dyn UrlSink>,
}

impl FilterSync {
    pub fn new(initial_query: &str, sink: Arc<dyn UrlSink>) -> Self {
        let committed = canonical_encoding(initial_query);
        Self {
            inner: Arc::new(Mutex::new(SyncInner {
                committed,
                pending: None,
                seq: 0,
            })),
            sink,
        }
    }

    /// Merges `patch` into the committed query and schedules a commit after
    /// `debounce`. A zero debounce commits before returning. A patch that
    /// leaves the query unchanged is a no-op and does not disturb an armed
    /// timer. Consecutive effective updates within the window coalesce: only
    /// the last requested state commits.
    pub fn update(&self, patch: &FilterPatch, debounce: Duration) {
        let (target, seq) = {
            let mut inner = lock(&self.inner);
            let target = merge_into_query(&inner.committed, patch);
            if target == inner.committed {
                return;
            }
            if let Some(pending) = inner.pending.take() {
                pending.handle.abort();
            }
            inner.seq += 1;
            if debounce.is_zero() {
                inner.committed = target.clone();
                drop(inner);
                self.sink.commit(&target);
                return;
            }
            (target, inner.seq)
        };

        let inner_arc = Arc::clone(&self.inner);
        let sink = Arc::clone(&self.sink);
        let task_target = target.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            {
                let mut inner = lock(&inner_arc);
                // A later update superseded this timer.
                if inner.seq != seq {
                    return;
                }
                inner.pending = None;
                inner.committed = task_target.clone();
            }
            sink.commit(&task_target);
        });

        let mut inner = lock(&self.inner);
        // The timer task only proceeds under a matching seq, so a commit that
        // raced ahead of this bookkeeping has already cleared itself.
        if inner.seq == seq && inner.committed != target {
            inner.pending = Some(PendingCommit {
                target,
                seq,
                handle,
            });
        }
    }

    pub fn committed(&self) -> String {
        lock(&self.inner).committed.clone()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        let inner = lock(&self.inner);
        SyncSnapshot {
            committed: inner.committed.clone(),
            pending: inner.pending.as_ref().map(|p| p.target.clone()),
        }
    }
}

impl Drop for FilterSync {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.inner).pending.take() {
            pending.handle.abort();
        }
    }
}

fn lock(inner: &Arc<Mutex<SyncInner>>) -> std::sync::MutexGuard<'_, SyncInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of per-user synchronizers, keyed by user id.
#[derive(Clone)]
pub struct FilterSessions {
    sessions: Arc<Mutex<HashMap<Uuid, Arc<FilterSync>>>>,
    sink: Arc<dyn UrlSink>,
}

impl FilterSessions {
    pub fn new(sink: Arc<dyn UrlSink>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            sink,
        }
    }

    pub fn get_or_create(&self, user_id: Uuid) -> Arc<FilterSync> {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            sessions
                .entry(user_id)
                .or_insert_with(|| Arc::new(FilterSync::new("", Arc::clone(&self.sink)))),
        )
    }

    pub fn get(&self, user_id: Uuid) -> Option<Arc<FilterSync>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user_id)
            .cloned()
    }

    /// Tears down a visitor's synchronizer; any armed timer is cancelled when
    /// the last reference drops.
    pub fn remove(&self, user_id: Uuid) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user_id)
            .is_some()
    }
}

/// Merges a patch into an existing query string. Recognized keys are upserted
/// or removed per the patch; unrecognized keys pass through untouched. The
/// derived sort rule is projected back into the result as a plain `sort_by`
/// mutation so the committed URL always reflects it.
fn merge_into_query(current: &str, patch: &FilterPatch) -> String {
    let mut params = decode(current);
    for (key, value) in patch.to_pairs() {
        match value {
            Some(value) => set_param(&mut params, key, value),
            None => remove_param(&mut params, key),
        }
    }

    let merged = encode(&params);
    let state = filters::parse(&merged);
    let ruled = filters::apply_derived_rules(state.clone());
    if ruled.sort_by == state.sort_by {
        return merged;
    }
    if ruled.sort_by == SortBy::default() {
        remove_param(&mut params, "sort_by");
    } else {
        set_param(&mut params, "sort_by", ruled.sort_by.as_str().to_string());
    }
    encode(&params)
}

fn decode(query: &str) -> Vec<(String, String)> {
    let trimmed = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(trimmed.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn encode(params: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

fn canonical_encoding(query: &str) -> String {
    encode(&decode(query))
}

/// Replaces the first occurrence in place and drops duplicates, appending
/// when the key is new.
fn set_param(params: &mut Vec<(String, String)>, key: &str, value: String) {
    let mut replaced = false;
    params.retain_mut(|(k, v)| {
        if k == key {
            if replaced {
                return false;
            }
            *v = value.clone();
            replaced = true;
        }
        true
    });
    if !replaced {
        params.push((key.to_string(), value));
    }
}

fn remove_param(params: &mut Vec<(String, String)>, key: &str) {
    params.retain(|(k, _)| k != key);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingSink {
        commits: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                commits: Mutex::new(Vec::new()),
            })
        }

        fn commits(&self) -> Vec<String> {
            self.commits.lock().unwrap().clone()
        }
    }

    impl UrlSink for RecordingSink {
        fn commit(&self, query: &str) {
            self.commits.lock().unwrap().push(query.to_string());
        }
    }

    fn patch_json(json: &str) -> FilterPatch {
        serde_json::from_str(json).unwrap()
    }

    /// Lets spawned timer tasks run to completion under a paused clock.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_updates_coalesce_to_last_writer() {
        let sink = RecordingSink::new();
        let sync = FilterSync::new("", sink.clone());

        sync.update(&patch_json(r#"{"q": "a"}"#), Duration::from_millis(400));
        sync.update(&patch_json(r#"{"q": "ab"}"#), Duration::from_millis(400));

        tokio::time::sleep(Duration::from_millis(500)).await;
        settle().await;

        assert_eq!(sink.commits(), vec!["q=ab".to_string()]);
        assert_eq!(sync.committed(), "q=ab");
        assert!(sync.snapshot().pending.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_timer_never_fires() {
        let sink = RecordingSink::new();
        let sync = FilterSync::new("", sink.clone());

        sync.update(&patch_json(r#"{"q": "a"}"#), Duration::from_millis(400));
        tokio::time::sleep(Duration::from_millis(200)).await;
        sync.update(&patch_json(r#"{"q": "b"}"#), Duration::from_millis(400));

        // Past the first timer's original deadline, before the second's.
        tokio::time::sleep(Duration::from_millis(250)).await;
        settle().await;
        assert!(sink.commits().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(sink.commits(), vec!["q=b".to_string()]);
    }

    #[tokio::test]
    async fn test_zero_debounce_commits_synchronously() {
        let sink = RecordingSink::new();
        let sync = FilterSync::new("", sink.clone());

        sync.update(&patch_json(r#"{"tab": "my-cargo"}"#), Duration::ZERO);

        assert_eq!(sink.commits(), vec!["tab=my-cargo".to_string()]);
        assert_eq!(sync.committed(), "tab=my-cargo");
    }

    #[tokio::test(start_paused = true)]
    async fn test_noop_update_leaves_armed_timer_alone() {
        let sink = RecordingSink::new();
        let sync = FilterSync::new("q=steel", sink.clone());

        sync.update(&patch_json(r#"{"page": 2}"#), Duration::from_millis(400));
        // Same value as already committed: no effective change.
        sync.update(&patch_json(r#"{"q": "steel"}"#), Duration::from_millis(400));
        assert!(sync.snapshot().pending.is_some());

        tokio::time::sleep(Duration::from_millis(500)).await;
        settle().await;

        assert_eq!(sink.commits(), vec!["q=steel&page=2".to_string()]);
    }

    #[tokio::test]
    async fn test_noop_update_commits_nothing() {
        let sink = RecordingSink::new();
        let sync = FilterSync::new("q=steel", sink.clone());

        sync.update(&patch_json(r#"{"q": "steel"}"#), Duration::ZERO);
        sync.update(&FilterPatch::default(), Duration::ZERO);

        assert!(sink.commits().is_empty());
        assert_eq!(sync.committed(), "q=steel");
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_pending_commit() {
        let sink = RecordingSink::new();
        let sync = FilterSync::new("", sink.clone());

        sync.update(&patch_json(r#"{"q": "late"}"#), Duration::from_millis(400));
        drop(sync);

        tokio::time::sleep(Duration::from_millis(500)).await;
        settle().await;

        assert!(sink.commits().is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_keys_survive_merges() {
        let sink = RecordingSink::new();
        let sync = FilterSync::new("utm_source=mail&q=old", sink.clone());

        sync.update(&patch_json(r#"{"q": "new"}"#), Duration::ZERO);

        assert_eq!(sync.committed(), "utm_source=mail&q=new");
    }

    #[tokio::test]
    async fn test_derived_sort_projected_into_committed_query() {
        let sink = RecordingSink::new();
        let sync = FilterSync::new("", sink.clone());

        sync.update(
            &patch_json(r#"{"location": "Cluj", "radius": 50}"#),
            Duration::ZERO,
        );
        assert_eq!(sync.committed(), "location=Cluj&radius=50&sort_by=distance");

        sync.update(&patch_json(r#"{"location": null}"#), Duration::ZERO);
        assert_eq!(sync.committed(), "radius=50");
    }

    #[tokio::test]
    async fn test_patch_null_removes_and_value_upserts() {
        let sink = RecordingSink::new();
        let sync = FilterSync::new("q=steel&page=3", sink.clone());

        sync.update(
            &patch_json(r#"{"q": null, "price_min": 100}"#),
            Duration::ZERO,
        );

        assert_eq!(sync.committed(), "page=3&price_min=100");
    }

    #[tokio::test]
    async fn test_registry_is_per_user() {
        let sink = RecordingSink::new();
        let sessions = FilterSessions::new(sink.clone());
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let sync = sessions.get_or_create(alice);
        sync.update(&patch_json(r#"{"q": "steel"}"#), Duration::ZERO);

        assert_eq!(sessions.get_or_create(alice).committed(), "q=steel");
        assert_eq!(sessions.get_or_create(bob).committed(), "");
        assert!(sessions.get(bob).is_some());

        assert!(sessions.remove(alice));
        assert!(!sessions.remove(alice));
        assert!(sessions.get(alice).is_none());
    }
}
