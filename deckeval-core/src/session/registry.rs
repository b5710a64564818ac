//! SessionRegistry for managing concurrent interaction sessions
//!
//! The registry is an explicit object owned by the orchestrating harness
//! (dependency injection, no ambient state). Sessions are stored behind a
//! per-key lock: operations on different instance ids never contend beyond
//! a brief map access, while operations racing on one id serialize.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::error::SessionError;
use crate::score::ScoreConfig;
use crate::types::{GroundTruth, Message};

use super::state::{Session, SessionStatus, TurnOutcome};

/// Concurrent-safe store of active grading sessions keyed by instance id.
pub struct SessionRegistry {
    /// Active sessions indexed by instance id, each behind its own lock.
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    /// Scoring knobs shared by every session in this registry.
    config: ScoreConfig,
}

impl SessionRegistry {
    /// Create a registry with the given scoring configuration.
    pub fn new(config: ScoreConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Start a session for one task instance.
    ///
    /// Allocates a fresh unique id when none is supplied. Always succeeds;
    /// supplying an id that is already registered replaces that session.
    pub async fn start(&self, instance_id: Option<String>, ground_truth: GroundTruth) -> String {
        let id = instance_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let session = Session::new(id.clone(), ground_truth);

        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        debug!(instance_id = %id, "interaction started");
        id
    }

    /// Grade the model's turn for one session.
    ///
    /// Fails with [`SessionError::UnknownInstance`] when the id was never
    /// started or has already been finalized.
    pub async fn respond(
        &self,
        instance_id: &str,
        messages: &[Message],
    ) -> Result<TurnOutcome, SessionError> {
        let session = self.get(instance_id).await?;

        // Hold only the per-session lock while grading; same-id calls
        // serialize here, other sessions proceed untouched.
        let mut session = session.lock().await;
        let outcome = session.record_turn(messages, &self.config);
        debug!(
            instance_id,
            reward = outcome.reward,
            terminate = outcome.terminate,
            "turn graded"
        );
        Ok(outcome)
    }

    /// Remove a session from the registry.
    ///
    /// Idempotent: finalizing an unknown or already-finalized id is a
    /// no-op, not an error.
    pub async fn finalize(&self, instance_id: &str) {
        if self.sessions.write().await.remove(instance_id).is_some() {
            debug!(instance_id, "interaction finalized");
        }
    }

    /// Status of a session, for harness inspection.
    pub async fn status(&self, instance_id: &str) -> Result<SessionStatus, SessionError> {
        let session = self.get(instance_id).await?;
        let status = session.lock().await.status();
        Ok(status)
    }

    /// Number of active sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn get(&self, instance_id: &str) -> Result<Arc<Mutex<Session>>, SessionError> {
        self.sessions
            .read()
            .await
            .get(instance_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownInstance(instance_id.to_string()))
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(ScoreConfig::default())
    }
}
