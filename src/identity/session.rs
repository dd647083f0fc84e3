use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tungstenite::handshake::server::Request;
use tungstenite::http::header::COOKIE;
use uuid::Uuid;

use super::store::Identity;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Session tokens issued by whatever performed the login, mapped to the
/// identity they authenticated.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Identity>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session for `identity` and returns its token.
    pub fn create(&self, identity: Arc<Identity>) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(token.clone(), identity);
        token
    }

    pub fn resolve(&self, token: &str) -> Option<Arc<Identity>> {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(token)
            .cloned()
    }

    pub fn remove(&self, token: &str) -> Option<Arc<Identity>> {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(token)
    }

    /// Resolves the identity behind the `session` cookie of an upgrade request.
    pub fn resolve_request(&self, request: &Request) -> Option<Arc<Identity>> {
        request
            .headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(session_token)
            .and_then(|token| self.resolve(token))
    }
}

/// Extracts the session token from one `Cookie` header value.
pub fn session_token(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}
