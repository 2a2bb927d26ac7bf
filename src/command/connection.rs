use anyhow::{bail, Result};

use crate::config::ConfigStore;
use crate::extension::IssueTrackerExtension;

pub async fn run_test_connection(
    extension: &dyn IssueTrackerExtension,
    store: &ConfigStore,
) -> Result<()> {
    if !extension.test_connection(store).await {
        bail!("❌ Could not log in to {}", extension.name());
    }

    println!("✅ Connected to {}", extension.name());
    Ok(())
}

pub fn run_browse(extension: &dyn IssueTrackerExtension, task_id: &str) -> Result<()> {
    extension.open_task_externally(task_id)?;
    println!("🌐 Opened {} in your browser", task_id);
    Ok(())
}
