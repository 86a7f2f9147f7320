//! # Authentication Module
//!
//! Session-token authentication for the desk HTTP API.
//!
//! Users come from the config's credential table. A successful `POST /login`
//! issues an opaque UUID bearer token mapped to the user's context; the
//! token has no expiry and lives until logout or process restart.
//!
//! ## Usage
//!
//! Send the token in the Authorization header:
//! ```text
//! Authorization: Bearer <token>
//! ```

use crate::config::{Credential, UserRole};
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::RwLock;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// The authenticated caller, attached to each request by the middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub username: String,
    pub role: UserRole,
    /// Sales-agent scope for comercial users.
    pub agente: Option<String>,
}

impl UserContext {
    /// The agent filter this caller is restricted to: comercial users see
    /// only their own portfolio, analysts see everything.
    #[must_use]
    pub fn agent_scope(&self) -> Option<&str> {
        match self.role {
            UserRole::Comercial => self.agente.as_deref(),
            UserRole::Analista => None,
        }
    }
}

/// Credential table plus the live session-token map.
#[derive(Debug)]
pub struct AuthRegistry {
    users: Vec<Credential>,
    sessions: RwLock<HashMap<String, UserContext>>,
}

impl AuthRegistry {
    /// Build a registry from the config's credential table.
    #[must_use]
    pub fn new(users: Vec<Credential>) -> Self {
        Self {
            users,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Attempt a login. On success returns the new bearer token and the
    /// caller's context.
    ///
    /// Password comparison is constant-time over padded buffers so neither
    /// content nor length differences leak through timing.
    pub fn login(&self, username: &str, password: &str) -> Option<(String, UserContext)> {
        let user = self.users.iter().find(|u| u.username == username)?;
        if !constant_time_eq(password.as_bytes(), user.password.as_bytes()) {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_password",
                username,
                "Login failed"
            );
            return None;
        }

        let context = UserContext {
            username: user.username.clone(),
            role: user.role,
            agente: user.agente.clone(),
        };
        let token = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token.clone(), context.clone());
        Some((token, context))
    }

    /// Drop a session token. Returns whether it existed.
    pub fn logout(&self, token: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(token)
            .is_some()
    }

    /// Resolve a bearer token to its user context.
    pub fn resolve(&self, token: &str) -> Option<UserContext> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(token)
            .cloned()
    }
}

/// Constant-time equality over byte strings of possibly different lengths.
///
/// Pads both inputs to the same length so `ct_eq` always runs over the same
/// number of bytes, then confirms the lengths separately.
fn constant_time_eq(provided: &[u8], expected: &[u8]) -> bool {
    let max_len = provided.len().max(expected.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided.len()].copy_from_slice(provided);
    padded_expected[..expected.len()].copy_from_slice(expected);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided.len() == expected.len()
}

/// Session authentication middleware.
///
/// `/health` and `/login` pass through; every other endpoint requires a
/// resolvable `Authorization: Bearer <token>` header. The resolved
/// `UserContext` is attached to the request extensions for handlers.
pub async fn session_auth_middleware(
    State(state): State<super::AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let path = request.uri().path();
    if path == "/health" || path == "/login" {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));

    let Some(token) = token else {
        tracing::warn!(
            event = "auth_failure",
            reason = "missing_authorization_header",
            "Missing Authorization header"
        );
        return Err((StatusCode::UNAUTHORIZED, "Unauthorized"));
    };

    match state.auth.resolve(token) {
        Some(context) => {
            request.extensions_mut().insert(context);
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "unknown_token",
                "Authentication failed: unknown session token"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn registry() -> AuthRegistry {
        AuthRegistry::new(vec![
            Credential {
                username: "gabriel".to_string(),
                password: "segredo".to_string(),
                role: UserRole::Comercial,
                agente: Some("Gabriel".to_string()),
            },
            Credential {
                username: "leonardo".to_string(),
                password: "outro".to_string(),
                role: UserRole::Analista,
                agente: None,
            },
        ])
    }

    #[test]
    fn login_issues_resolvable_token() {
        let registry = registry();
        let (token, context) = registry.login("gabriel", "segredo").unwrap();
        assert_eq!(context.role, UserRole::Comercial);
        assert_eq!(context.agent_scope(), Some("Gabriel"));
        assert_eq!(registry.resolve(&token), Some(context));
    }

    #[test]
    fn wrong_password_and_unknown_user_fail() {
        let registry = registry();
        assert!(registry.login("gabriel", "errado").is_none());
        assert!(registry.login("fantasma", "segredo").is_none());
    }

    #[test]
    fn analyst_scope_is_unrestricted() {
        let registry = registry();
        let (_, context) = registry.login("leonardo", "outro").unwrap();
        assert!(context.role.is_analista());
        assert_eq!(context.agent_scope(), None);
    }

    #[test]
    fn logout_invalidates_token() {
        let registry = registry();
        let (token, _) = registry.login("gabriel", "segredo").unwrap();
        assert!(registry.logout(&token));
        assert!(registry.resolve(&token).is_none());
        assert!(!registry.logout(&token));
    }

    #[test]
    fn constant_time_eq_handles_lengths() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"", b"abc"));
        assert!(constant_time_eq(b"", b""));
    }
}
