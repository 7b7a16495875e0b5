// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use diagnostics::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use volupload::UploadSession;

/// Cookie carrying the browser session id
pub const SESSION_COOKIE: &str = "volupload_session";

pub type SharedSession = Arc<tokio::sync::Mutex<UploadSession>>;

struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

/// Upload sessions keyed by cookie value.
///
/// Each session sits behind its own async mutex so one browser's actions
/// run one at a time. Sessions idle for longer than the TTL are dropped
/// the next time the store is touched.
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Entry>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Live session for `id`, refreshing its idle timer
    pub fn get(&self, id: Option<&str>) -> Option<(String, SharedSession)> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut sessions, now);
        Self::touch(&mut sessions, id?, now)
    }

    /// Session for `id`, or a fresh one under a new id when `id` is unknown
    pub fn get_or_create(&self, id: Option<&str>) -> (String, SharedSession) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut sessions, now);

        if let Some(found) = id.and_then(|id| Self::touch(&mut sessions, id, now)) {
            return found;
        }

        let id = uuid7::uuid7().to_string();
        let session = SharedSession::default();
        debug!("New upload session {id}", id: id.as_str());
        _ = sessions.insert(
            id.clone(),
            Entry {
                session: session.clone(),
                last_seen: now,
            },
        );
        (id, session)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn touch(
        sessions: &mut HashMap<String, Entry>,
        id: &str,
        now: Instant,
    ) -> Option<(String, SharedSession)> {
        let entry = sessions.get_mut(id)?;
        entry.last_seen = now;
        Some((id.to_string(), entry.session.clone()))
    }

    fn prune(&self, sessions: &mut HashMap<String, Entry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {evicted} idle sessions", evicted: evicted);
        }
    }
}
