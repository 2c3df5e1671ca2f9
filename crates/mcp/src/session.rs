//! Session addressing state shared by the transport and the correlator.

use parking_lot::RwLock;
use std::sync::Arc;
use url::Url;

/// How request submissions are addressed for the current connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// The grace window is still running.
    Undetermined,
    /// The server never announced a session; submissions carry no id.
    Legacy,
    /// Every submission must carry the announced session id.
    SessionAddressed,
}

#[derive(Debug)]
struct SessionState {
    mode: AddressingMode,
    session_id: Option<String>,
}

/// Cloneable handle onto the connection's addressing state.
///
/// The mode is decided once per connection; `establish` and
/// `settle_legacy` are no-ops after that.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionState {
                mode: AddressingMode::Undetermined,
                session_id: None,
            })),
        }
    }

    pub fn mode(&self) -> AddressingMode {
        self.inner.read().mode
    }

    pub fn session_id(&self) -> Option<String> {
        self.inner.read().session_id.clone()
    }

    /// Enter session-addressed mode. Returns false if the mode was
    /// already decided.
    pub fn establish(&self, session_id: String) -> bool {
        let mut state = self.inner.write();
        if state.mode != AddressingMode::Undetermined {
            return false;
        }
        state.mode = AddressingMode::SessionAddressed;
        state.session_id = Some(session_id);
        true
    }

    /// Enter legacy mode. Returns false if the mode was already decided.
    pub fn settle_legacy(&self) -> bool {
        let mut state = self.inner.write();
        if state.mode != AddressingMode::Undetermined {
            return false;
        }
        state.mode = AddressingMode::Legacy;
        true
    }

    /// Drop the session id. The mode is kept, so a session-addressed
    /// connection refuses further submissions.
    pub fn clear(&self) {
        self.inner.write().session_id = None;
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the session id from an announcement payload.
///
/// The payload is either the bare id or an endpoint URI such as
/// `/messages?sessionId=abc`.
pub fn parse_session_announcement(payload: &str) -> Option<String> {
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }

    if payload.contains('?') || payload.starts_with('/') || payload.contains("://") {
        let base = Url::parse("http://localhost/").ok()?;
        let endpoint = base.join(payload).ok()?;
        return endpoint
            .query_pairs()
            .find(|(key, _)| matches!(key.as_ref(), "sessionId" | "session_id"))
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty());
    }

    Some(payload.trim_matches('"').to_string())
}
