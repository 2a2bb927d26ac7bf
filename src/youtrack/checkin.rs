//! Commands and comments extracted from checkin messages.
//!
//! A message may embed a YouTrack command using the configured selector
//! (by default `{{...}}`). Capture group 1 is the command. The rest of the
//! message becomes a comment when comment propagation is enabled.

use crate::config::TrackerConfig;

/// Marker prepended to every propagated comment.
pub const COMMENT_PREFIX: &str = "Via PlasticSCM: ";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckinDirective {
    pub command: Option<String>,
    pub comment: Option<String>,
}

impl CheckinDirective {
    pub fn from_message(message: &str, config: &TrackerConfig) -> Self {
        let mut remaining = message.to_string();
        let mut command = None;

        if let Some(captures) = config.command_pattern.captures(message) {
            if let Some(whole) = captures.get(0) {
                remaining = remaining.replace(whole.as_str(), "");
            }
            command = captures
                .get(1)
                .map(|m| m.as_str().to_string())
                .filter(|c| !c.is_empty());
        }

        let comment = (!remaining.is_empty() && config.propagate_comments)
            .then(|| format!("{}{}", COMMENT_PREFIX, remaining));

        Self { command, comment }
    }

    /// A bare command with no comment.
    pub fn command(command: String) -> Self {
        Self {
            command: Some(command),
            comment: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.command.is_none() && self.comment.is_none()
    }
}
