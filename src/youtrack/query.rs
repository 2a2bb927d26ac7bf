//! URL construction and branch name parsing.
//!
//! URLs are built as text so the subfolder of the configured base URL is
//! kept intact, then validated with [`Url::parse`].

use url::Url;

use super::checkin::CheckinDirective;
use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};

/// Upper bound on search results, large enough to mean "all".
pub const MAX_SEARCH_RESULTS: u32 = 10_000;

const UNRESOLVED_STATE: &str = "Unresolved";
const ASSIGNEE_FILTER: &str = "for:me+";

fn parse(raw: String) -> TrackerResult<Url> {
    Url::parse(&raw).map_err(|source| TrackerError::InvalidUrl { url: raw, source })
}

/// Project short name: the branch prefix minus its trailing separator.
pub fn project_filter(branch_prefix: &str) -> &str {
    branch_prefix
        .strip_suffix(|c: char| !c.is_alphanumeric())
        .unwrap_or(branch_prefix)
}

/// Unresolved-issue search, one `filter` term per configured issue type.
pub fn search_url(config: &TrackerConfig, assignee_only: bool) -> TrackerResult<Url> {
    let user_filter = if assignee_only { ASSIGNEE_FILTER } else { "" };
    let project = urlencoding::encode(project_filter(&config.branch_prefix));

    let filters: Vec<String> = config
        .issue_types
        .iter()
        .map(|issue_type| {
            format!(
                "filter={}%23{}+%23{}+%23{}",
                user_filter,
                urlencoding::encode(issue_type),
                UNRESOLVED_STATE,
                project
            )
        })
        .collect();

    parse(format!(
        "{}/rest/issue?{}&max={}",
        config.base_url,
        filters.join("&"),
        MAX_SEARCH_RESULTS
    ))
}

pub fn fetch_url(config: &TrackerConfig, task_id: &str) -> TrackerResult<Url> {
    parse(format!(
        "{}/rest/issue/{}",
        config.base_url,
        urlencoding::encode(task_id)
    ))
}

/// Execute endpoint carrying the command and comment of a directive.
pub fn execute_url(
    config: &TrackerConfig,
    task_id: &str,
    directive: &CheckinDirective,
) -> TrackerResult<Url> {
    let mut params = Vec::new();
    if let Some(command) = &directive.command {
        params.push(format!("command={}", urlencoding::encode(command)));
    }
    if let Some(comment) = &directive.comment {
        params.push(format!("comment={}", urlencoding::encode(comment)));
    }

    parse(format!(
        "{}/rest/issue/{}/execute?{}",
        config.base_url,
        urlencoding::encode(task_id),
        params.join("&")
    ))
}

pub fn login_url(base_url: &str, user: &str, password: &str) -> TrackerResult<Url> {
    parse(format!(
        "{}/rest/user/login?login={}&password={}",
        base_url,
        urlencoding::encode(user),
        urlencoding::encode(password)
    ))
}

/// Web UI page for a task.
pub fn browse_url(config: &TrackerConfig, task_id: &str) -> TrackerResult<Url> {
    parse(format!(
        "{}/issue/{}",
        config.base_url,
        urlencoding::encode(task_id)
    ))
}

/// Last path segment of a full branch name (`/main/yt-42` -> `yt-42`).
///
/// Returns `None` for names ending in a separator.
pub fn branch_name(full_branch_name: &str) -> Option<&str> {
    match full_branch_name.rsplit_once('/') {
        None => Some(full_branch_name),
        Some((_, "")) => None,
        Some((_, name)) => Some(name),
    }
}

/// Task id implied by a branch name.
///
/// The id keeps the prefix (`yt-42`), which is the tracker's readable
/// issue id. Branches outside the prefix, or equal to it, imply no task.
pub fn extract_task_id(branch_name: &str, prefix: &str) -> Option<String> {
    if prefix.is_empty() {
        return Some(branch_name.to_string()).filter(|b| !b.is_empty());
    }

    if !branch_name.starts_with(prefix) || branch_name == prefix {
        return None;
    }

    branch_name
        .split(char::is_whitespace)
        .next()
        .filter(|id| *id != prefix)
        .map(ToOwned::to_owned)
}

/// Tracker-native issue number inside a task id (`yt-42` -> `42`).
pub fn issue_number<'a>(task_id: &'a str, prefix: &str) -> Option<&'a str> {
    task_id.strip_prefix(prefix).filter(|n| !n.is_empty())
}
