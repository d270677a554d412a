//! Session-store collaborator boundary
//!
//! The runner touches the store twice per run: once to mark the session
//! researching when the pipeline starts, once to persist the completed
//! run. Implementations are expected to be idempotent under retry.

use async_trait::async_trait;
use common::PipelineRun;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Trait for run persistence
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Mark the session as researching at run start
    async fn mark_researching(&self, session_id: Uuid) -> anyhow::Result<()>;

    /// Persist the finalized run
    async fn save_completed(&self, session_id: Uuid, run: &PipelineRun) -> anyhow::Result<()>;
}

/// In-memory store for tests and demos
#[derive(Default)]
pub struct InMemorySessionStore {
    statuses: Mutex<HashMap<Uuid, String>>,
    completed: Mutex<HashMap<Uuid, PipelineRun>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn status(&self, session_id: Uuid) -> Option<String> {
        self.statuses.lock().await.get(&session_id).cloned()
    }

    pub async fn completed_run(&self, session_id: Uuid) -> Option<PipelineRun> {
        self.completed.lock().await.get(&session_id).cloned()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn mark_researching(&self, session_id: Uuid) -> anyhow::Result<()> {
        self.statuses
            .lock()
            .await
            .insert(session_id, "researching".to_string());
        Ok(())
    }

    async fn save_completed(&self, session_id: Uuid, run: &PipelineRun) -> anyhow::Result<()> {
        self.statuses
            .lock()
            .await
            .insert(session_id, "completed".to_string());
        self.completed.lock().await.insert(session_id, run.clone());
        Ok(())
    }
}
