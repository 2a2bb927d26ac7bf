//! Tracker configuration.
//!
//! The host hands the extension an opaque key/value store ([`ConfigStore`]).
//! [`TrackerConfig::resolve`] turns it into typed settings once, substituting
//! defaults for every absent or empty value. Resolution never fails: a bad
//! value must not keep the extension from starting.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const HOST_KEY: &str = "Host";
const HOST_DEFAULT: &str = "myYoutrackHost/youtrack";
pub const USE_SSL_KEY: &str = "Use SSL";
const USE_SSL_DEFAULT: &str = "False";
pub const PORT_KEY: &str = "Port";
const PORT_DEFAULT: &str = "";
pub const USER_KEY: &str = "User ID";
const USER_DEFAULT: &str = "username";
pub const PASSWORD_KEY: &str = "Password";
const PASSWORD_DEFAULT: &str = "password";
pub const BRANCH_PREFIX_KEY: &str = "Branch prefix";
const BRANCH_PREFIX_DEFAULT: &str = "yt-";
pub const ISSUE_TYPES_KEY: &str = "Branch issue type filter";
const ISSUE_TYPES_DEFAULT: &str =
    "Feature Bug Task Cosmetics {Meta Issue} {Performance Problem} {Usability Problem}";
pub const PROPAGATE_COMMENTS_KEY: &str = "Add checkin comments to youtrack task";
const PROPAGATE_COMMENTS_DEFAULT: &str = "True";
pub const COMMAND_PATTERN_KEY: &str =
    "Regex selector for youtrack (match 1 will be used for selection)";
const COMMAND_PATTERN_DEFAULT: &str = r"\{\{(.*)\}\}";
pub const SHOW_STATE_KEY: &str = "Show issue state in branch title";
const SHOW_STATE_DEFAULT: &str = "True";
pub const IGNORE_STATES_KEY: &str = "Ignore issue states for branch title";
const IGNORE_STATES_DEFAULT: &str = "";

/// Issue types are either a brace-enclosed phrase or a single bare token.
const ISSUE_TYPE_TOKEN: &str = r"\{.*?\}|\S+";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "TRACKLINK_CONFIG";

/// How the host links tasks to version control objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkingMode {
    None,
    #[default]
    TaskOnBranch,
    TaskOnChangeset,
}

/// Kind of value a parameter holds, used by hosts to render an editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParameterType {
    Host,
    Boolean,
    Text,
    User,
    Password,
}

/// One entry of the effective configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigParameter {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub is_global: bool,
}

/// Raw key/value configuration as provided by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigStore {
    #[serde(default)]
    pub working_mode: WorkingMode,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl ConfigStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[cfg(test)]
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.parameters.insert(key.to_string(), value.to_string());
    }

    /// Raw value, treating empty strings as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn value_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Default location: `~/.tracklink/config.json`.
    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .context("Could not determine home directory")?
            .join(".tracklink")
            .join("config.json"))
    }

    /// Load a store from a JSON file. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Apply `KEY=VALUE` overrides, splitting on the first `=`.
    pub fn apply_overrides(&mut self, overrides: &[String]) -> Result<()> {
        for raw in overrides {
            let Some((key, value)) = raw.split_once('=') else {
                bail!("Invalid override '{}', expected KEY=VALUE", raw);
            };
            self.set(key.trim(), value.trim());
        }
        Ok(())
    }

    /// Working mode with `None` mapped to the branch-per-task default.
    pub fn effective_working_mode(&self) -> WorkingMode {
        match self.working_mode {
            WorkingMode::None => WorkingMode::TaskOnBranch,
            mode => mode,
        }
    }

    /// Effective parameter list, defaults filled in.
    pub fn parameters(&self) -> Vec<ConfigParameter> {
        [
            (HOST_KEY, HOST_DEFAULT, ParameterType::Host),
            (PORT_KEY, PORT_DEFAULT, ParameterType::Text),
            (USER_KEY, USER_DEFAULT, ParameterType::User),
            (PASSWORD_KEY, PASSWORD_DEFAULT, ParameterType::Password),
            (BRANCH_PREFIX_KEY, BRANCH_PREFIX_DEFAULT, ParameterType::Text),
            (
                PROPAGATE_COMMENTS_KEY,
                PROPAGATE_COMMENTS_DEFAULT,
                ParameterType::Boolean,
            ),
            (USE_SSL_KEY, USE_SSL_DEFAULT, ParameterType::Boolean),
            (ISSUE_TYPES_KEY, ISSUE_TYPES_DEFAULT, ParameterType::Text),
            (COMMAND_PATTERN_KEY, COMMAND_PATTERN_DEFAULT, ParameterType::Text),
            (SHOW_STATE_KEY, SHOW_STATE_DEFAULT, ParameterType::Boolean),
            (IGNORE_STATES_KEY, IGNORE_STATES_DEFAULT, ParameterType::Text),
        ]
        .into_iter()
        .map(|(name, default, kind)| ConfigParameter {
            name: name.to_string(),
            value: self.value_or(name, default).to_string(),
            kind,
            is_global: false,
        })
        .collect()
    }
}

/// Resolved, immutable tracker settings.
#[derive(Clone)]
pub struct TrackerConfig {
    pub base_url: String,
    pub user: String,
    pub password: String,
    pub branch_prefix: String,
    pub issue_types: Vec<String>,
    pub propagate_comments: bool,
    pub command_pattern: Regex,
    pub show_state_in_title: bool,
    pub ignore_states_for_title: HashSet<String>,
    pub working_mode: WorkingMode,
}

impl TrackerConfig {
    pub fn resolve(store: &ConfigStore) -> Self {
        let use_ssl = parse_flag(store.value_or(USE_SSL_KEY, USE_SSL_DEFAULT));
        let raw_host = store.value_or(HOST_KEY, HOST_DEFAULT);

        Self {
            base_url: base_url(raw_host, store.get(PORT_KEY), use_ssl),
            user: store.value_or(USER_KEY, USER_DEFAULT).to_string(),
            password: store.value_or(PASSWORD_KEY, PASSWORD_DEFAULT).to_string(),
            branch_prefix: store
                .get(BRANCH_PREFIX_KEY)
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(BRANCH_PREFIX_DEFAULT)
                .to_string(),
            issue_types: resolve_issue_types(store.get(ISSUE_TYPES_KEY)),
            propagate_comments: parse_flag(
                store.value_or(PROPAGATE_COMMENTS_KEY, PROPAGATE_COMMENTS_DEFAULT),
            ),
            command_pattern: compile_command_pattern(store.get(COMMAND_PATTERN_KEY)),
            show_state_in_title: parse_flag(store.value_or(SHOW_STATE_KEY, SHOW_STATE_DEFAULT)),
            ignore_states_for_title: store
                .value_or(IGNORE_STATES_KEY, IGNORE_STATES_DEFAULT)
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
            working_mode: store.effective_working_mode(),
        }
    }
}

#[cfg(test)]
impl Default for TrackerConfig {
    fn default() -> Self {
        Self::resolve(&ConfigStore::default())
    }
}

impl std::fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("branch_prefix", &self.branch_prefix)
            .field("issue_types", &self.issue_types)
            .field("propagate_comments", &self.propagate_comments)
            .field("command_pattern", &self.command_pattern.as_str())
            .field("show_state_in_title", &self.show_state_in_title)
            .field("ignore_states_for_title", &self.ignore_states_for_title)
            .field("working_mode", &self.working_mode)
            .finish()
    }
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// `host[:port][/sub/folder]` plus the port setting into
/// `{protocol}://{host}:{port}{subfolder}`.
fn base_url(raw_host: &str, port: Option<&str>, use_ssl: bool) -> String {
    let mut parts = raw_host.split('/');
    let host = parts
        .next()
        .unwrap_or_default()
        .split(':')
        .next()
        .unwrap_or_default();
    let subfolder: String = parts.map(|p| format!("/{}", p)).collect();

    let port = port
        .and_then(|p| p.trim().parse::<u16>().ok())
        .unwrap_or(if use_ssl { 443 } else { 80 });
    let protocol = if use_ssl { "https" } else { "http" };

    format!("{}://{}:{}{}", protocol, host, port, subfolder)
}

fn parse_issue_types(raw: &str) -> Vec<String> {
    // Constant pattern; failure would be a programming error.
    let token = Regex::new(ISSUE_TYPE_TOKEN).expect("issue type pattern is valid");
    token
        .find_iter(raw)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Configured issue types, or the defaults when the value has no tokens.
fn resolve_issue_types(raw: Option<&str>) -> Vec<String> {
    let types = raw.map(parse_issue_types).unwrap_or_default();
    if types.is_empty() {
        parse_issue_types(ISSUE_TYPES_DEFAULT)
    } else {
        types
    }
}

fn compile_command_pattern(raw: Option<&str>) -> Regex {
    if let Some(pattern) = raw {
        match Regex::new(pattern) {
            Ok(regex) => return regex,
            Err(e) => warn!(
                "Invalid command selector '{}', falling back to default: {}",
                pattern, e
            ),
        }
    }
    Regex::new(COMMAND_PATTERN_DEFAULT).expect("default command pattern is valid")
}
