//! Session registry - per-vehicle state isolation
//!
//! Each diagnostic session (one vehicle connection) owns its own sample
//! store and evaluation state behind its own mutex. Ingest and cycle
//! execution serialize per session; distinct sessions run fully in
//! parallel with no shared mutable state. Teardown is explicit: the
//! connection manager ends sessions, nothing evicts on a timer.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use vdi_core::{EngineError, EngineResult};

use crate::state::EvaluationState;
use crate::store::SampleStore;

/// Everything one session owns
#[derive(Debug)]
pub struct SessionState {
    pub store: SampleStore,
    pub eval: EvaluationState,
}

impl SessionState {
    fn new(history_capacity: usize) -> Self {
        Self {
            store: SampleStore::new(history_capacity),
            eval: EvaluationState::new(),
        }
    }
}

/// Registry of active sessions
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session, resetting any existing state under the same id
    pub fn start(&self, session_id: &str, history_capacity: usize) {
        let mut sessions = self.sessions.write();
        let replaced = sessions
            .insert(
                session_id.to_string(),
                Arc::new(Mutex::new(SessionState::new(history_capacity))),
            )
            .is_some();
        if replaced {
            info!(session_id, "Session restarted, previous state discarded");
        } else {
            debug!(session_id, "Session started");
        }
    }

    /// End a session, discarding its state entirely
    pub fn end(&self, session_id: &str) -> EngineResult<()> {
        let removed = self.sessions.write().remove(session_id);
        match removed {
            Some(_) => {
                debug!(session_id, "Session ended, state discarded");
                Ok(())
            }
            None => Err(EngineError::SessionNotFound(session_id.to_string())),
        }
    }

    /// Handle to a session's state
    ///
    /// Returns the `Arc` so callers lock outside the registry lock; the
    /// registry read lock is held only for the lookup.
    pub fn get(&self, session_id: &str) -> EngineResult<Arc<Mutex<SessionState>>> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))
    }

    /// Ids of all active sessions
    pub fn active(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let registry = SessionRegistry::new();
        assert!(registry.get("veh-1").is_err());

        registry.start("veh-1", 16);
        assert!(registry.get("veh-1").is_ok());
        assert_eq!(registry.len(), 1);

        registry.end("veh-1").unwrap();
        assert!(registry.get("veh-1").is_err());
        assert!(matches!(
            registry.end("veh-1"),
            Err(EngineError::SessionNotFound(_))
        ));
    }

    #[test]
    fn restart_discards_previous_state() {
        let registry = SessionRegistry::new();
        registry.start("veh-1", 16);
        {
            let session = registry.get("veh-1").unwrap();
            session.lock().store.ingest("engine_rpm", 800.0, 1_000);
        }
        registry.start("veh-1", 16);
        let session = registry.get("veh-1").unwrap();
        assert!(session.lock().store.snapshot().is_empty());
    }

    #[test]
    fn sessions_are_distinct_objects() {
        let registry = SessionRegistry::new();
        registry.start("veh-1", 16);
        registry.start("veh-2", 16);
        registry.get("veh-1").unwrap().lock().store.ingest("x", 1.0, 1);
        assert!(registry.get("veh-2").unwrap().lock().store.snapshot().is_empty());
    }
}
