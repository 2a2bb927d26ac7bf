use anyhow::Result;

use crate::extension::{Changeset, IssueTrackerExtension, TaskRecord};

pub async fn run_checkin(
    extension: &dyn IssueTrackerExtension,
    changeset: Changeset,
    task_ids: &[String],
) -> Result<()> {
    let tasks: Vec<TaskRecord> = task_ids
        .iter()
        .map(|id| TaskRecord {
            id: id.clone(),
            ..Default::default()
        })
        .collect();

    extension.log_checkin_result(&changeset, &tasks).await;
    extension
        .update_linked_tasks_to_changeset(&changeset, task_ids)
        .await;

    println!("✅ Sent changeset {} to {} task(s)", changeset.id, tasks.len());
    Ok(())
}

pub async fn run_start(
    extension: &dyn IssueTrackerExtension,
    task_id: &str,
    assignee: &str,
) -> Result<()> {
    extension.mark_task_as_open(task_id, assignee).await;
    println!("✅ {} assigned to {} and in progress", task_id, assignee);
    Ok(())
}
