//! Login session state.

/// Consecutive login attempts allowed before a request gives up.
pub const MAX_AUTH_ATTEMPTS: u32 = 3;

/// Session cookie plus the count of login attempts since the last success.
#[derive(Default)]
pub struct Session {
    token: Option<String>,
    attempts: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether another login may be tried before giving up.
    pub fn can_retry(&self) -> bool {
        self.attempts < MAX_AUTH_ATTEMPTS
    }

    pub(super) fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    pub(super) fn succeed(&mut self, token: String) {
        self.token = Some(token);
        self.attempts = 0;
    }

    /// Drop the cookie so the next request logs in again.
    pub(super) fn invalidate(&mut self) {
        self.token = None;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("attempts", &self.attempts)
            .finish()
    }
}
