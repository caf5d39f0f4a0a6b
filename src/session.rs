//! Session-scoped conversion storage.
//!
//! [`SessionStore`] is the per-session map from original filename to
//! converted Markdown. [`SessionRegistry`] owns one store per browser
//! session and defines the session lifecycle: created on first contact,
//! discarded on explicit end or after sitting idle too long.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// Original filename to Markdown text, kept in first-insertion order.
///
/// Keys are always the uploaded filenames, never the derived `.md` names.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. An overwritten key keeps its original position.
    pub fn put(&mut self, filename: impl Into<String>, markdown: impl Into<String>) {
        let filename = filename.into();
        let markdown = markdown.into();
        match self.index.get(&filename) {
            Some(&position) => self.entries[position].1 = markdown,
            None => {
                self.index.insert(filename.clone(), self.entries.len());
                self.entries.push((filename, markdown));
            }
        }
    }

    pub fn get_all(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|(filename, markdown)| (filename.as_str(), markdown.as_str()))
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.index
            .get(filename)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One browser session and its conversions.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub last_activity: DateTime<Utc>,
    pub store: SessionStore,
}

impl Session {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            last_activity: Utc::now(),
            store: SessionStore::new(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn is_idle(&self, max_idle_seconds: i64) -> bool {
        (Utc::now() - self.last_activity).num_seconds() > max_idle_seconds
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// All live sessions, keyed by the id carried in the session cookie.
///
/// Each session sits behind its own mutex so a conversion batch holds it
/// for the whole batch; two batches of one session never interleave.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a session, starting a fresh one when the id is absent or unknown.
    /// The returned flag is true when a session was created.
    ///
    /// A resumed session is marked active while the registry read lock is
    /// held, so a concurrent reap cannot drop it between lookup and use.
    /// A session locked by a running batch is skipped by the reaper anyway.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, SessionHandle, bool) {
        if let Some(id) = id {
            let sessions = self.inner.read().await;
            if let Some(handle) = sessions.get(&id).cloned() {
                if let Ok(mut session) = handle.try_lock() {
                    session.touch();
                }
                return (id, handle, false);
            }
        }

        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(Session::new(id)));
        self.inner.write().await.insert(id, handle.clone());
        info!(session_id = %id, "Session started");
        (id, handle, true)
    }

    pub async fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.inner.read().await.get(id).cloned()
    }

    /// End a session, dropping its conversions.
    pub async fn end(&self, id: &Uuid) -> bool {
        let removed = self.inner.write().await.remove(id).is_some();
        if removed {
            info!(session_id = %id, "Session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Drop sessions idle for longer than `max_idle_seconds`. Sessions busy
    /// with a batch are skipped. Returns how many were removed.
    pub async fn reap_idle(&self, max_idle_seconds: i64) -> usize {
        let mut guard = self.inner.write().await;
        let before = guard.len();
        guard.retain(|id, handle| match handle.try_lock() {
            Ok(session) => {
                let keep = !session.is_idle(max_idle_seconds);
                if !keep {
                    debug!(session_id = %id, "Reaping idle session");
                }
                keep
            }
            Err(_) => true,
        });
        before - guard.len()
    }

    /// Periodically end sessions idle for longer than `idle_timeout_secs`.
    pub fn spawn_idle_sweeper(&self, idle_timeout_secs: u64, interval_secs: u64) -> JoinHandle<()> {
        let registry = self.clone();
        let max_idle = i64::try_from(idle_timeout_secs).unwrap_or(i64::MAX);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let reaped = registry.reap_idle(max_idle).await;
                if reaped > 0 {
                    let remaining = registry.len().await;
                    info!(reaped, remaining, "Reaped idle sessions");
                }
            }
        })
    }
}
