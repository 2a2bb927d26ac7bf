//! YouTrack issue tracker extension.
//!
//! Branches named `{prefix}{number}` (for example `yt-42`) are linked to the
//! YouTrack issue with that readable id. Checkin messages can carry a
//! YouTrack command and are mirrored as issue comments.

mod checkin;
mod client;
mod http;
mod mapper;
mod query;
mod session;
#[cfg(test)]
mod tests;

use checkin::CheckinDirective;
use client::{LoginTarget, YouTrackClient};

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::{ConfigStore, TrackerConfig};
use crate::extension::{Changeset, IssueTrackerExtension, TaskRecord};

const EXTENSION_NAME: &str = "YouTrack Extension";

/// State set by `mark_task_as_open`.
const IN_PROGRESS_STATE: &str = "in progress";

pub struct YouTrackExtension {
    config: TrackerConfig,
    client: YouTrackClient,
}

impl YouTrackExtension {
    pub fn new(store: &ConfigStore) -> Self {
        let config = TrackerConfig::resolve(store);
        let client = YouTrackClient::new(LoginTarget::from(&config));
        info!("YouTrack issue tracker is initialized for {}", config.base_url);
        Self { config, client }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn task_id_for_branch(&self, full_branch_name: &str) -> Option<String> {
        query::branch_name(full_branch_name)
            .and_then(|name| query::extract_task_id(name, &self.config.branch_prefix))
    }

    async fn load_single_task(&self, task_id: &str) -> Option<TaskRecord> {
        if task_id.is_empty() {
            return None;
        }
        debug!(
            "Loading task {} (issue number {})",
            task_id,
            query::issue_number(task_id, &self.config.branch_prefix).unwrap_or("?")
        );

        let url = match query::fetch_url(&self.config, task_id) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot build URL for task '{}': {}", task_id, e);
                return None;
            }
        };

        let xml = self.client.get(&url).await;
        if xml.is_empty() {
            return None;
        }

        match mapper::parse_task(&xml, &self.config) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!("Failed to parse task '{}': {}", task_id, e);
                None
            }
        }
    }

    async fn unresolved_issues(&self, assignee_only: bool) -> Vec<TaskRecord> {
        let url = match query::search_url(&self.config, assignee_only) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot build search URL: {}", e);
                return Vec::new();
            }
        };

        let xml = self.client.get(&url).await;
        if xml.is_empty() {
            return Vec::new();
        }

        mapper::parse_task_list(&xml, &self.config).unwrap_or_else(|e| {
            warn!("Failed to parse unresolved issues: {}", e);
            Vec::new()
        })
    }

    async fn execute(&self, task_id: &str, directive: &CheckinDirective) {
        if task_id.is_empty() || directive.is_empty() {
            return;
        }

        match query::execute_url(&self.config, task_id, directive) {
            Ok(url) => {
                self.client.post(&url).await;
            }
            Err(e) => warn!("Cannot build execute URL for task '{}': {}", task_id, e),
        }
    }
}

#[async_trait]
impl IssueTrackerExtension for YouTrackExtension {
    fn name(&self) -> &'static str {
        EXTENSION_NAME
    }

    async fn connect(&self) {
        debug!("Connecting to {}", self.client.target().base_url);
        self.client.connect().await;
    }

    async fn disconnect(&self) {}

    async fn get_pending_tasks(&self, assignee: Option<&str>) -> Vec<TaskRecord> {
        // YouTrack resolves "me" from the session, so any assignee scopes to the login user.
        self.unresolved_issues(assignee.is_some()).await
    }

    async fn get_task_for_branch(&self, full_branch_name: &str) -> Option<TaskRecord> {
        let task_id = self.task_id_for_branch(full_branch_name)?;
        self.load_single_task(&task_id).await
    }

    async fn get_tasks_for_branches(
        &self,
        full_branch_names: &[String],
    ) -> HashMap<String, Option<TaskRecord>> {
        let mut result = HashMap::with_capacity(full_branch_names.len());
        for full_branch_name in full_branch_names {
            let task = self.get_task_for_branch(full_branch_name).await;
            result.insert(full_branch_name.clone(), task);
        }
        result
    }

    async fn load_tasks(&self, task_ids: &[String]) -> Vec<TaskRecord> {
        let mut result = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            if let Some(task) = self.load_single_task(task_id).await {
                result.push(task);
            }
        }
        result
    }

    async fn log_checkin_result(&self, changeset: &Changeset, tasks: &[TaskRecord]) {
        let directive = CheckinDirective::from_message(&changeset.comment, &self.config);
        if directive.is_empty() {
            debug!("Changeset {} carries nothing to send", changeset.id);
            return;
        }

        debug!(
            "Sending changeset {} on {} to {} task(s)",
            changeset.id,
            changeset.branch,
            tasks.len()
        );
        for task in tasks {
            self.execute(&task.id, &directive).await;
        }
    }

    async fn update_linked_tasks_to_changeset(&self, changeset: &Changeset, task_ids: &[String]) {
        debug!(
            "Linking changeset {} to {} task(s) is not supported",
            changeset.id,
            task_ids.len()
        );
    }

    async fn mark_task_as_open(&self, task_id: &str, assignee: &str) {
        let command = format!("assignee {} state {}", assignee, IN_PROGRESS_STATE);
        self.execute(task_id, &CheckinDirective::command(command)).await;
    }

    fn open_task_externally(&self, task_id: &str) -> Result<()> {
        let url = query::browse_url(&self.config, task_id)
            .with_context(|| format!("Invalid task id: {}", task_id))?;
        open::that(url.as_str()).with_context(|| format!("Failed to open {}", url))
    }

    async fn test_connection(&self, candidate: &ConfigStore) -> bool {
        let candidate = TrackerConfig::resolve(candidate);
        let ok = self.client.probe(&LoginTarget::from(&candidate)).await;

        // Refresh the live session so later calls keep using the configured server.
        self.client.connect().await;
        ok
    }
}
