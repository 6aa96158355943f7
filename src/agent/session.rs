//! Per-session conversation memory with idle eviction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::types::{ModelMessage, Role};

/// Turns kept per session unless configured otherwise.
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Messages remembered for one session.
///
/// Only the newest `max_turns` turns are kept. A turn starts at a user
/// message and runs up to the next one, so tool calls stay with their
/// results.
#[derive(Debug, Clone)]
pub struct SessionMemory {
    messages: Vec<ModelMessage>,
    max_turns: usize,
}

impl Default for SessionMemory {
    fn default() -> Self {
        Self::with_max_turns(DEFAULT_MAX_TURNS)
    }
}

impl SessionMemory {
    pub fn with_max_turns(max_turns: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_turns: max_turns.max(1),
        }
    }

    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Stored history followed by `incoming`. A system message already in
    /// memory is not repeated.
    pub fn context_for(&self, incoming: &[ModelMessage]) -> Vec<ModelMessage> {
        let has_system = self.messages.iter().any(|m| m.role == Role::System);
        let mut context = self.messages.clone();
        context.extend(
            incoming
                .iter()
                .filter(|m| !(has_system && m.role == Role::System))
                .cloned(),
        );
        context
    }

    /// Record a completed turn. `transcript` must start with this memory's
    /// messages, as produced from [`SessionMemory::context_for`].
    pub fn commit(&mut self, transcript: Vec<ModelMessage>) {
        debug_assert!(transcript.len() >= self.messages.len());
        self.messages = transcript;
        self.trim();
    }

    fn trim(&mut self) {
        let turn_starts: Vec<usize> = self
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.role == Role::User)
            .map(|(i, _)| i)
            .collect();
        if turn_starts.len() <= self.max_turns {
            return;
        }
        let keep_from = turn_starts[turn_starts.len() - self.max_turns];
        let before = self.messages.len();
        let mut index = 0;
        self.messages.retain(|m| {
            let keep = index >= keep_from || m.role == Role::System;
            index += 1;
            keep
        });
        debug!(dropped = before - self.messages.len(), "trimmed session history");
    }
}

/// One session: its memory behind an async lock, so turns in the same
/// session run one at a time.
#[derive(Debug)]
pub struct SessionHandle {
    memory: tokio::sync::Mutex<SessionMemory>,
    last_used: Mutex<Instant>,
}

impl SessionHandle {
    fn new(max_turns: usize) -> Self {
        Self {
            memory: tokio::sync::Mutex::new(SessionMemory::with_max_turns(max_turns)),
            last_used: Mutex::new(Instant::now()),
        }
    }

    /// Lock the session for one turn.
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, SessionMemory> {
        let guard = self.memory.lock().await;
        self.touch();
        guard
    }

    fn touch(&self) {
        *lock(&self.last_used) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*lock(&self.last_used))
    }
}

/// Session memories keyed by caller-supplied id.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<SessionHandle>>>,
    idle_timeout: Duration,
    max_turns: usize,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Turns each new session remembers.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Get or create a session by key. Idle sessions are evicted first.
    pub fn get_or_create(&self, key: &str) -> Arc<SessionHandle> {
        self.evict_idle();
        let mut sessions = lock(&self.sessions);
        let handle = sessions
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(SessionHandle::new(self.max_turns)))
            .clone();
        handle.touch();
        handle
    }

    /// Drop sessions idle longer than the timeout. Sessions currently held
    /// by a caller are kept.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = lock(&self.sessions);
        let before = sessions.len();
        sessions.retain(|_, handle| {
            Arc::strong_count(handle) > 1 || handle.idle_for(now) < self.idle_timeout
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "evicted idle sessions");
        }
        evicted
    }

    pub fn remove(&self, key: &str) -> bool {
        lock(&self.sessions).remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn session_ids(&self) -> Vec<String> {
        lock(&self.sessions).keys().cloned().collect()
    }

    /// Snapshot of a session's stored messages.
    pub async fn history(&self, key: &str) -> Vec<ModelMessage> {
        let handle = lock(&self.sessions).get(key).cloned();
        match handle {
            Some(handle) => handle.memory.lock().await.messages().to_vec(),
            None => Vec::new(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
