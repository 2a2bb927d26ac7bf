//! Session-authenticated YouTrack client.
//!
//! Logs in lazily on the first request and holds the session cookie for
//! the lifetime of the extension. A 401 triggers a new login, bounded by
//! [`MAX_AUTH_ATTEMPTS`] consecutive attempts. Failures never propagate:
//! they are logged and the caller receives an empty body.

use reqwest::{Client, Method};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};
use url::Url;

use super::http;
use super::query;
use super::session::{Session, MAX_AUTH_ATTEMPTS};
use crate::config::TrackerConfig;

/// Server and credentials to log in with.
#[derive(Clone)]
pub struct LoginTarget {
    pub base_url: String,
    pub user: String,
    pub password: String,
}

impl From<&TrackerConfig> for LoginTarget {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
        }
    }
}

impl std::fmt::Debug for LoginTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginTarget")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

pub struct YouTrackClient {
    http: Client,
    target: LoginTarget,
    // Held across read-token / re-login / write-token.
    session: Mutex<Session>,
}

impl YouTrackClient {
    pub fn new(target: LoginTarget) -> Self {
        Self {
            http: http::build_client(),
            target,
            session: Mutex::new(Session::new()),
        }
    }

    pub fn target(&self) -> &LoginTarget {
        &self.target
    }

    /// Log in to the configured server, replacing any existing session.
    pub async fn connect(&self) {
        let mut session = self.session.lock().await;
        self.authenticate(&mut session, &self.target).await;
    }

    /// Log in to `target` with a scratch session; the live session is untouched.
    pub async fn probe(&self, target: &LoginTarget) -> bool {
        let mut scratch = Session::new();
        self.authenticate(&mut scratch, target).await;
        scratch.attempts() == 0
    }

    async fn authenticate(&self, session: &mut Session, target: &LoginTarget) {
        let attempt = session.begin_attempt();
        let display_url = format!(
            "{}/rest/user/login?login={}&password=[REDACTED]",
            target.base_url, target.user
        );

        let url = match query::login_url(&target.base_url, &target.user, &target.password) {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to authenticate using request '{}': {}", display_url, e);
                session.invalidate();
                return;
            }
        };

        match http::login(&self.http, &url, &display_url).await {
            Ok(Some(token)) => {
                debug!(
                    "Successfully authenticated against {} in {} attempt(s)",
                    target.base_url, attempt
                );
                session.succeed(token);
            }
            Ok(None) => {
                warn!(
                    "Login to {} as '{}' was refused (attempt {}/{})",
                    target.base_url, target.user, attempt, MAX_AUTH_ATTEMPTS
                );
                session.invalidate();
            }
            Err(e) => {
                error!("Failed to authenticate using request '{}': {}", display_url, e);
                session.invalidate();
            }
        }
    }

    pub async fn get(&self, url: &Url) -> String {
        self.request(Method::GET, url).await
    }

    pub async fn post(&self, url: &Url) -> String {
        self.request(Method::POST, url).await
    }

    /// Send a request, logging in again on 401 while attempts remain.
    ///
    /// At most one initial send plus one per allowed login. A 401 always
    /// drops the cookie, so once the attempts are spent the next request
    /// starts with a fresh login. An empty string means "no data".
    async fn request(&self, method: Method, url: &Url) -> String {
        let mut session = self.session.lock().await;
        if !session.is_authenticated() {
            self.authenticate(&mut session, &self.target).await;
        }

        for _ in 0..=MAX_AUTH_ATTEMPTS {
            let result = http::send(&self.http, method.clone(), url, session.token()).await;
            match result {
                Ok(body) => return body,
                Err(e) if e.is_unauthorized() => {
                    session.invalidate();
                    if !session.can_retry() {
                        warn!(
                            "Giving up on '{}' after {} authentication attempts",
                            url, MAX_AUTH_ATTEMPTS
                        );
                        return String::new();
                    }
                    warn!(
                        "Failed to fetch '{}' due to authentication error. Will retry after authentication again.",
                        url
                    );
                    self.authenticate(&mut session, &self.target).await;
                }
                Err(e) => {
                    warn!("Failed to fetch '{}': {}", url, e);
                    return String::new();
                }
            }
        }

        warn!(
            "Giving up on '{}' after {} authentication attempts",
            url, MAX_AUTH_ATTEMPTS
        );
        String::new()
    }

    #[cfg(test)]
    pub(super) async fn session_state(&self) -> (bool, u32) {
        let session = self.session.lock().await;
        (session.is_authenticated(), session.attempts())
    }
}

impl std::fmt::Debug for YouTrackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTrackClient")
            .field("target", &self.target)
            .finish()
    }
}
