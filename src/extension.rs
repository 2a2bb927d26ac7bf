//! Host-facing issue tracker contract.
//!
//! A version control host drives an extension through this trait: it asks
//! for tasks linked to branches, lists pending work and reports checkins.
//! Implementations must never fail these calls. Tracker errors are logged
//! and surface as `None` or an empty collection so a batch keeps going.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ConfigStore;

/// A task normalized from the tracker's representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub owner: String,
    pub status: String,
    pub title: String,
    pub description: String,
}

/// Checkin details the host reports after a changeset is created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Changeset {
    pub id: i64,
    pub branch: String,
    pub owner: String,
    pub comment: String,
}

#[async_trait]
pub trait IssueTrackerExtension: Send + Sync {
    fn name(&self) -> &'static str;

    async fn connect(&self);

    async fn disconnect(&self);

    /// Unresolved tasks. `Some(assignee)` narrows the list to that user.
    async fn get_pending_tasks(&self, assignee: Option<&str>) -> Vec<TaskRecord>;

    async fn get_task_for_branch(&self, full_branch_name: &str) -> Option<TaskRecord>;

    async fn get_tasks_for_branches(
        &self,
        full_branch_names: &[String],
    ) -> HashMap<String, Option<TaskRecord>>;

    /// Tasks that could not be resolved are left out.
    async fn load_tasks(&self, task_ids: &[String]) -> Vec<TaskRecord>;

    async fn log_checkin_result(&self, changeset: &Changeset, tasks: &[TaskRecord]);

    async fn update_linked_tasks_to_changeset(&self, changeset: &Changeset, task_ids: &[String]);

    async fn mark_task_as_open(&self, task_id: &str, assignee: &str);

    /// Open the task in the user's browser.
    fn open_task_externally(&self, task_id: &str) -> Result<()>;

    /// Probe a candidate configuration without switching to it.
    async fn test_connection(&self, candidate: &ConfigStore) -> bool;
}
