use thiserror::Error;
use tracing::debug;

use super::{Task, TaskDraft, TaskFilter};
use crate::api::{ApiError, TaskApi};

/// Where the collection stands relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Client-side precondition: a draft with an empty title never reaches
    /// the network layer.
    #[error("title must not be empty")]
    EmptyTitle,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The in-memory task collection for the current session.
///
/// Owned exclusively by whichever view is rendering it; all mutation requires
/// `&mut self`, so two flows cannot race on the same collection. The state
/// transitions (`begin_load` / `finish_load` / `remove`) are synchronous so
/// the TUI can drive them from its response channel; the async methods
/// combine them with the gateway calls for straight-line callers.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    state: LoadState,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The filtered view of the collection, order preserved. Pure: the stored
    /// collection is not touched.
    pub fn filter<'a>(&'a self, filter: &TaskFilter) -> Vec<&'a Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    pub fn begin_load(&mut self) {
        self.state = LoadState::Loading;
    }

    /// Absorb the outcome of a list call: on success the whole collection is
    /// replaced, on failure the old collection is kept and the state flips to
    /// errored.
    pub fn finish_load(&mut self, result: Result<Vec<Task>, ApiError>) -> Result<(), ApiError> {
        match result {
            Ok(tasks) => {
                debug!(count = tasks.len(), "task collection replaced");
                self.tasks = tasks;
                self.state = LoadState::Loaded;
                Ok(())
            }
            Err(err) => {
                self.state = LoadState::Errored;
                Err(err)
            }
        }
    }

    /// Splice one entry out of the local collection by id. Returns whether
    /// anything was removed. No reload; the server already forgot the task.
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Fetch the full task set and replace the local collection.
    pub async fn load(&mut self, api: &dyn TaskApi) -> Result<(), StoreError> {
        self.begin_load();
        let result = api.list_tasks().await;
        Ok(self.finish_load(result)?)
    }

    /// Create a task from a draft, then reload to absorb the server-assigned
    /// fields.
    pub async fn create(&mut self, api: &dyn TaskApi, draft: &TaskDraft) -> Result<(), StoreError> {
        validate(draft)?;
        api.create_task(draft).await?;
        self.load(api).await
    }

    /// Replace an existing task's mutable fields, then reload.
    pub async fn update(
        &mut self,
        api: &dyn TaskApi,
        id: i64,
        draft: &TaskDraft,
    ) -> Result<(), StoreError> {
        validate(draft)?;
        api.update_task(id, draft).await?;
        self.load(api).await
    }

    /// Delete on the server, then splice locally. Confirmation is the
    /// caller's job; by the time this runs the user has already said yes.
    pub async fn delete(&mut self, api: &dyn TaskApi, id: i64) -> Result<(), StoreError> {
        api.delete_task(id).await?;
        self.remove(id);
        Ok(())
    }
}

fn validate(draft: &TaskDraft) -> Result<(), StoreError> {
    if draft.title.trim().is_empty() {
        return Err(StoreError::EmptyTitle);
    }
    Ok(())
}
