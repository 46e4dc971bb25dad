use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use super::session::ChatSession;

pub type SessionHandle = Arc<Mutex<ChatSession>>;

struct Entry {
    handle: SessionHandle,
    last_active: Instant,
}

/// In-memory sessions keyed by id.
///
/// Each session sits behind its own mutex and a turn holds it until it
/// completes, so messages for one session are handled one at a time
/// while different sessions never wait on each other.
///
/// Sessions are only dropped explicitly or by `remove_idle`. A client
/// that never ends its session leaves it here until the next sweep.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: ChatSession) -> SessionHandle {
        let id = session.id.clone();
        let handle = Arc::new(Mutex::new(session));
        let entry = Entry {
            handle: Arc::clone(&handle),
            last_active: Instant::now(),
        };
        self.sessions.write().await.insert(id, entry);
        handle
    }

    /// Looks up a session and marks it as active.
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_active = Instant::now();
        Some(Arc::clone(&entry.handle))
    }

    /// Marks a session as active. Returns false if it's gone.
    pub async fn touch(&self, id: &str) -> bool {
        match self.sessions.write().await.get_mut(id) {
            Some(entry) => {
                entry.last_active = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Drops the session. A turn already running keeps its handle and
    /// finishes, but its transcript goes away with it.
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drops sessions not used for at least `max_idle`. Sessions with a
    /// turn in progress are kept. Returns how many were dropped.
    pub async fn remove_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.last_active.elapsed() < max_idle || entry.handle.try_lock().is_err()
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
