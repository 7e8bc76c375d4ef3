//! Admin and registrar sessions.
//!
//! A session is an explicit value with a role, a bearer token, the profile
//! data returned at login and an expiry. Sessions for both roles live side by
//! side in one JSON file:
//!
//! ```json
//! {
//!   "admin":     { "token": "...", "data": {...}, "issued_at": "...", "expires_at": "..." },
//!   "registrar": { ... }
//! }
//! ```
//!
//! Gated views call [`SessionStore::require`] and, on failure, send the user
//! to the login route carried by the error.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Routes
// =============================================================================

/// Pages of the registration site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    AdminLogin,
    RegistrarLogin,
    EastRegistration,
    WestRegistration,
    AdminDashboard,
    Registrations,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::AdminLogin => "/admin-login",
            Route::RegistrarLogin => "/registrar-login",
            Route::EastRegistration => "/east-registration",
            Route::WestRegistration => "/west-registration",
            Route::AdminDashboard => "/admin-dashboard",
            Route::Registrations => "/registrations",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// =============================================================================
// Roles and sessions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Registrar,
}

impl Role {
    /// Page this role lands on after logging in.
    pub fn home(self) -> Route {
        match self {
            Role::Admin => Route::AdminDashboard,
            Role::Registrar => Route::Registrations,
        }
    }

    /// Where an unauthenticated visitor is sent.
    pub fn login_redirect(self) -> Route {
        match self {
            Role::Admin => Route::Home,
            Role::Registrar => Route::RegistrarLogin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Registrar => f.write_str("registrar"),
        }
    }
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "registrar" => Ok(Role::Registrar),
            other => Err(SessionError::UnknownRole(other.to_string())),
        }
    }
}

/// A logged-in admin or registrar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub role: Role,
    pub token: String,
    /// Profile returned by the login endpoint, kept as-is.
    #[serde(default)]
    pub data: serde_json::Value,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        role: Role,
        token: impl Into<String>,
        data: serde_json::Value,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self {
            role,
            token: token.into(),
            data,
            issued_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check the session is usable at `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.token.trim().is_empty() {
            return Err(SessionError::Invalid {
                role: self.role,
                redirect: self.role.login_redirect(),
            });
        }
        if self.is_expired(now) {
            return Err(SessionError::Expired {
                role: self.role,
                expired_at: self.expires_at,
                redirect: self.role.login_redirect(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("not logged in as {role}; go to {redirect}")]
    Missing { role: Role, redirect: Route },
    #[error("stored {role} session has no usable token; go to {redirect}")]
    Invalid { role: Role, redirect: Route },
    #[error("{role} session expired at {expired_at}; go to {redirect}")]
    Expired {
        role: Role,
        expired_at: DateTime<Utc>,
        redirect: Route,
    },
    #[error("unknown role {0:?}, expected admin or registrar")]
    UnknownRole(String),
    #[error("session file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("corrupt session file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl SessionError {
    /// Login route to send the user to, for gating failures.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            SessionError::Missing { redirect, .. }
            | SessionError::Invalid { redirect, .. }
            | SessionError::Expired { redirect, .. } => Some(*redirect),
            SessionError::UnknownRole(_) | SessionError::Io { .. } | SessionError::Corrupt { .. } => {
                None
            }
        }
    }
}

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    admin: Option<Session>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    registrar: Option<Session>,
}

impl SessionFile {
    fn slot(&mut self, role: Role) -> &mut Option<Session> {
        match role {
            Role::Admin => &mut self.admin,
            Role::Registrar => &mut self.registrar,
        }
    }
}

/// File-backed session storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a new session for `role`, replacing any previous one.
    pub fn login(
        &self,
        role: Role,
        token: &str,
        data: serde_json::Value,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Session, SessionError> {
        let session = Session::new(role, token.trim(), data, now, ttl);
        session.validate(now)?;

        let mut file = self.read()?;
        *file.slot(role) = Some(session.clone());
        self.write(&file)?;

        tracing::info!(%role, expires_at = %session.expires_at, "Session stored");
        Ok(session)
    }

    /// Remove the session for `role`. The other role's session is kept.
    pub fn logout(&self, role: Role) -> Result<bool, SessionError> {
        let mut file = self.read()?;
        let removed = file.slot(role).take().is_some();
        if removed {
            self.write(&file)?;
            tracing::info!(%role, "Session removed");
        }
        Ok(removed)
    }

    /// Current session for `role`, if any, without validation.
    pub fn get(&self, role: Role) -> Result<Option<Session>, SessionError> {
        let mut file = self.read()?;
        Ok(file.slot(role).take())
    }

    /// Return a valid session for `role` or the reason there is none.
    pub fn require(&self, role: Role, now: DateTime<Utc>) -> Result<Session, SessionError> {
        let session = self.get(role)?.ok_or(SessionError::Missing {
            role,
            redirect: role.login_redirect(),
        })?;
        if session.role != role {
            return Err(SessionError::Invalid {
                role,
                redirect: role.login_redirect(),
            });
        }
        session.validate(now)?;
        Ok(session)
    }

    fn read(&self) -> Result<SessionFile, SessionError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SessionFile::default()),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&raw).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, file: &SessionFile) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_vec_pretty(file).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(io_err)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const HOUR: Duration = Duration::from_secs(3600);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 20, 9, 0, 0).unwrap()
    }

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_session_redirects_by_role() {
        let (_dir, store) = store();

        let admin = store.require(Role::Admin, now()).unwrap_err();
        assert_eq!(admin.redirect(), Some(Route::Home));

        let registrar = store.require(Role::Registrar, now()).unwrap_err();
        assert!(matches!(registrar, SessionError::Missing { .. }));
        assert_eq!(registrar.redirect(), Some(Route::RegistrarLogin));
    }

    #[test]
    fn test_login_then_require() {
        let (_dir, store) = store();
        store
            .login(Role::Registrar, " tok-1 ", json!({ "name": "Ravi" }), now(), HOUR)
            .unwrap();

        let session = store.require(Role::Registrar, now()).unwrap();
        assert_eq!(session.token, "tok-1");
        assert_eq!(session.data["name"], json!("Ravi"));
        assert!(store.require(Role::Admin, now()).is_err());
    }

    #[test]
    fn test_expired_session_rejected() {
        let (_dir, store) = store();
        store
            .login(Role::Admin, "tok", json!(null), now(), HOUR)
            .unwrap();

        let later = now() + chrono::Duration::hours(2);
        let err = store.require(Role::Admin, later).unwrap_err();
        assert!(matches!(err, SessionError::Expired { .. }));
        assert_eq!(err.redirect(), Some(Route::Home));
    }

    #[test]
    fn test_blank_token_cannot_log_in() {
        let (_dir, store) = store();
        let err = store
            .login(Role::Admin, "   ", json!(null), now(), HOUR)
            .unwrap_err();
        assert!(matches!(err, SessionError::Invalid { .. }));
        assert!(store.get(Role::Admin).unwrap().is_none());
    }

    #[test]
    fn test_logout_keeps_other_role() {
        let (_dir, store) = store();
        store
            .login(Role::Admin, "a", json!(null), now(), HOUR)
            .unwrap();
        store
            .login(Role::Registrar, "r", json!(null), now(), HOUR)
            .unwrap();

        assert!(store.logout(Role::Admin).unwrap());
        assert!(!store.logout(Role::Admin).unwrap());
        assert!(store.require(Role::Admin, now()).is_err());
        assert!(store.require(Role::Registrar, now()).is_ok());
    }

    #[test]
    fn test_corrupt_file_reported() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), b"not json").unwrap();
        assert!(matches!(
            store.require(Role::Admin, now()),
            Err(SessionError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_role_parse_and_routes() {
        assert_eq!("Registrar".parse::<Role>().unwrap(), Role::Registrar);
        assert!("cashier".parse::<Role>().is_err());
        assert_eq!(Role::Admin.home().path(), "/admin-dashboard");
        assert_eq!(Route::WestRegistration.to_string(), "/west-registration");
    }
}
