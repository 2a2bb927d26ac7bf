use anyhow::{Context, Result};
use serde::Serialize;

use crate::extension::IssueTrackerExtension;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize tasks")?;
    println!("{}", out);
    Ok(())
}

pub async fn run_pending(
    extension: &dyn IssueTrackerExtension,
    assignee: Option<&str>,
) -> Result<()> {
    extension.connect().await;
    let tasks = extension.get_pending_tasks(assignee).await;
    print_json(&tasks)
}

pub async fn run_branch(extension: &dyn IssueTrackerExtension, branches: &[String]) -> Result<()> {
    let tasks = extension.get_tasks_for_branches(branches).await;

    // Keep the order the branches were given in.
    let ordered: Vec<_> = branches
        .iter()
        .map(|branch| {
            let task = tasks.get(branch).and_then(Option::as_ref);
            serde_json::json!({ "branch": branch, "task": task })
        })
        .collect();
    print_json(&ordered)
}

pub async fn run_load(extension: &dyn IssueTrackerExtension, task_ids: &[String]) -> Result<()> {
    let tasks = extension.load_tasks(task_ids).await;
    if tasks.len() < task_ids.len() {
        eprintln!(
            "⚠️  {} of {} task(s) could not be loaded",
            task_ids.len() - tasks.len(),
            task_ids.len()
        );
    }
    print_json(&tasks)
}
