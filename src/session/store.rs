//! Session storage and management.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::SessionId;
use crate::error::DispatchError;
use crate::Result;

/// Idle time after which a session is swept.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// A single key/value entry of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionValue {
    pub key: String,
    pub value: Value,
}

/// A value edit made through a [`Session`], replayable on another copy.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    Set(String, Value),
    Append(String, Value),
    Remove(String),
    Clear,
}

/// Server-side state of one browser session.
///
/// Copies handed to request handlers record their edits, so only those
/// edits are merged back into the stored record.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique identifier, also the cookie value.
    pub id: SessionId,
    /// Values in insertion order. Keys are not required to be unique.
    pub values: Vec<SessionValue>,
    /// Time of last activity.
    pub last_activity: Instant,
    changes: Vec<SessionChange>,
}

impl Session {
    /// Create an empty session stamped with the current time.
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            values: Vec::new(),
            last_activity: Instant::now(),
            changes: Vec::new(),
        }
    }

    /// Update the last activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Get the idle duration since last activity.
    pub fn idle_duration(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Whether the session has been idle longer than `timeout` at `now`.
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) > timeout
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.iter().find(|v| v.key == key).map(|v| &v.value)
    }

    /// First value stored under `key`, deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(DispatchError::from)
    }

    /// Overwrite the first value under `key`, or append if absent.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.record(SessionChange::Set(key.into(), value.into()));
    }

    /// Serialize `value` and [`set`](Session::set) it under `key`.
    pub fn set_as<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value);
        Ok(())
    }

    /// Append a value even if `key` is already present.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.record(SessionChange::Append(key.into(), value.into()));
    }

    /// Remove and return the first value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.apply(SessionChange::Remove(key.to_string()));
        if removed.is_some() {
            self.changes.push(SessionChange::Remove(key.to_string()));
        }
        removed
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.iter().any(|v| v.key == key)
    }

    pub fn clear(&mut self) {
        self.record(SessionChange::Clear);
    }

    /// Edits made on this copy since it was taken from the store.
    pub fn changes(&self) -> &[SessionChange] {
        &self.changes
    }

    /// Drain the recorded edits.
    pub fn take_changes(&mut self) -> Vec<SessionChange> {
        std::mem::take(&mut self.changes)
    }

    /// Apply edits recorded on another copy of this session.
    pub fn replay(&mut self, changes: impl IntoIterator<Item = SessionChange>) {
        for change in changes {
            self.apply(change);
        }
    }

    fn record(&mut self, change: SessionChange) {
        self.apply(change.clone());
        self.changes.push(change);
    }

    fn apply(&mut self, change: SessionChange) -> Option<Value> {
        match change {
            SessionChange::Set(key, value) => {
                match self.values.iter_mut().find(|v| v.key == key) {
                    Some(existing) => existing.value = value,
                    None => self.values.push(SessionValue { key, value }),
                }
                None
            }
            SessionChange::Append(key, value) => {
                self.values.push(SessionValue { key, value });
                None
            }
            SessionChange::Remove(key) => {
                let index = self.values.iter().position(|v| v.key == key)?;
                Some(self.values.remove(index).value)
            }
            SessionChange::Clear => {
                self.values.clear();
                None
            }
        }
    }
}

/// Thread-safe storage for sessions.
///
/// Reads share the lock; every mutation takes it exclusively, so a sweep
/// never interleaves with a create, set or remove.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<Vec<Session>>,
    timeout: Duration,
}

impl SessionStore {
    /// Create a new empty session store with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_SESSION_TIMEOUT)
    }

    /// Create a new empty session store with a custom idle timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(Vec::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Session>>> {
        self.sessions.read().map_err(|_| DispatchError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Session>>> {
        self.sessions.write().map_err(|_| DispatchError::LockPoisoned)
    }

    /// Get a clone of the session with the given ID.
    ///
    /// Lookup alone does not refresh activity; see [`touch`](Self::touch).
    pub fn get(&self, id: &SessionId) -> Result<Option<Session>> {
        Ok(self.read()?.iter().find(|s| s.id == *id).cloned())
    }

    /// Check if a session exists.
    pub fn contains(&self, id: &SessionId) -> Result<bool> {
        Ok(self.read()?.iter().any(|s| s.id == *id))
    }

    /// Create a new empty session under `id`.
    ///
    /// Fails with [`DispatchError::SessionExists`] if the ID is taken.
    pub fn create(&self, id: SessionId) -> Result<Session> {
        let mut sessions = self.write()?;
        if sessions.iter().any(|s| s.id == id) {
            return Err(DispatchError::SessionExists(id.to_string()));
        }

        let session = Session::new(id);
        sessions.push(session.clone());
        Ok(session)
    }

    /// Upsert a session.
    ///
    /// An existing record has its values replaced wholesale and its activity
    /// refreshed. An unknown ID is appended as given.
    pub fn set(&self, mut session: Session) -> Result<()> {
        session.changes.clear();
        let mut sessions = self.write()?;
        match sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => {
                existing.values = session.values;
                existing.touch();
            }
            None => sessions.push(session),
        }
        Ok(())
    }

    /// Modify an existing session in place under the write lock.
    ///
    /// Returns `false` without calling `f` when the session is gone, so a
    /// record removed by a logout or a sweep is never brought back.
    pub fn update<F>(&self, id: &SessionId, f: F) -> Result<bool>
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.write()?;
        match sessions.iter_mut().find(|s| s.id == *id) {
            Some(session) => {
                f(session);
                session.changes.clear();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Refresh the activity timestamp of a session.
    ///
    /// Returns `false` if no session has the ID.
    pub fn touch(&self, id: &SessionId) -> Result<bool> {
        let mut sessions = self.write()?;
        match sessions.iter_mut().find(|s| s.id == *id) {
            Some(session) => {
                session.touch();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop the session with the given ID, keeping the order of the rest.
    ///
    /// Returns `true` if a session was removed.
    pub fn remove(&self, id: &SessionId) -> Result<bool> {
        let mut sessions = self.write()?;
        let before = sessions.len();
        sessions.retain(|s| s.id != *id);
        Ok(sessions.len() != before)
    }

    /// Drop every session idle longer than the timeout at `now`.
    ///
    /// Survivors keep their order. Returns the number of sessions removed.
    pub fn sweep_expired(&self, now: Instant) -> Result<usize> {
        let timeout = self.timeout;
        let mut sessions = self.write()?;
        let before = sessions.len();
        sessions.retain(|s| !s.is_expired(now, timeout));
        Ok(before - sessions.len())
    }

    /// Get the number of sessions in the store.
    pub fn count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// List all session IDs in store order.
    pub fn ids(&self) -> Result<Vec<SessionId>> {
        Ok(self.read()?.iter().map(|s| s.id.clone()).collect())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
