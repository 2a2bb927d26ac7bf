//! Maps YouTrack issue XML onto [`TaskRecord`]s.
//!
//! Issues arrive as
//!
//! ```xml
//! <issue id="YT-42">
//!   <field name="summary"><value>Crash on save</value></field>
//!   <field name="State"><value>Open</value></field>
//! </issue>
//! ```
//!
//! either as the document root or repeated under a search result root.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::extension::TaskRecord;

const ISSUE_TAG: &[u8] = b"issue";
const FIELD_TAG: &[u8] = b"field";
const VALUE_TAG: &[u8] = b"value";

/// Field values of one issue, keyed by field name. First value wins.
#[derive(Debug, Default)]
struct IssueFields(HashMap<String, String>);

impl IssueFields {
    fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or_default()
    }

    fn insert(&mut self, name: &str, value: String) {
        self.0.entry(name.to_string()).or_insert(value);
    }
}

fn field_name(start: &BytesStart<'_>) -> TrackerResult<Option<String>> {
    match start.try_get_attribute("name")? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn read_issues(xml: &str) -> TrackerResult<Vec<IssueFields>> {
    let mut reader = Reader::from_str(xml);
    let mut issues = Vec::new();
    let mut current: Option<IssueFields> = None;
    // <issue> elements nested inside an issue (links, subtasks) are skipped
    let mut nested_issues = 0usize;
    let mut field: Option<String> = None;
    let mut value: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                ISSUE_TAG if current.is_none() => current = Some(IssueFields::default()),
                ISSUE_TAG => nested_issues += 1,
                FIELD_TAG if current.is_some() && nested_issues == 0 => field = field_name(&e)?,
                VALUE_TAG if field.is_some() => value = Some(String::new()),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                ISSUE_TAG if current.is_none() => issues.push(IssueFields::default()),
                VALUE_TAG => {
                    if let (Some(fields), Some(name)) = (current.as_mut(), field.as_deref()) {
                        fields.insert(name, String::new());
                    }
                }
                _ => {}
            },
            Event::Text(e) => {
                if let Some(text) = value.as_mut() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(text) = value.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => match e.name().as_ref() {
                VALUE_TAG => {
                    if let (Some(fields), Some(name), Some(text)) =
                        (current.as_mut(), field.as_deref(), value.take())
                    {
                        fields.insert(name, text);
                    }
                }
                FIELD_TAG => field = None,
                ISSUE_TAG if nested_issues > 0 => nested_issues -= 1,
                ISSUE_TAG => {
                    if let Some(fields) = current.take() {
                        issues.push(fields);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(issues)
}

/// Branch title for an issue, optionally decorated with type and state.
pub fn task_title(config: &TrackerConfig, issue_type: &str, state: &str, summary: &str) -> String {
    if !config.show_state_in_title {
        return summary.to_string();
    }

    if config.ignore_states_for_title.is_empty() {
        return format!("[{}] {} [{}]", issue_type, summary, state);
    }

    if config.ignore_states_for_title.contains(state) {
        summary.to_string()
    } else {
        format!("{} [{}]", summary, state)
    }
}

fn to_task(fields: &IssueFields, config: &TrackerConfig) -> TaskRecord {
    let state = fields.get("State");
    TaskRecord {
        id: format!(
            "{}{}",
            config.branch_prefix,
            fields.get("numberInProject").trim()
        ),
        owner: fields.get("Assignee").to_string(),
        status: state.to_string(),
        title: task_title(config, fields.get("Type"), state, fields.get("summary")),
        description: fields.get("description").to_string(),
    }
}

/// Single issue document.
pub fn parse_task(xml: &str, config: &TrackerConfig) -> TrackerResult<TaskRecord> {
    read_issues(xml)?
        .first()
        .map(|fields| to_task(fields, config))
        .ok_or(TrackerError::MissingIssue)
}

/// Search result document; no issues yields an empty list.
pub fn parse_task_list(xml: &str, config: &TrackerConfig) -> TrackerResult<Vec<TaskRecord>> {
    Ok(read_issues(xml)?
        .iter()
        .map(|fields| to_task(fields, config))
        .collect())
}
