//! Session lifecycle: sign-in, sign-out, restore, expiry.
//!
//! A session is the persisted proof of a successful sign-in, bounded
//! by an absolute expiry 30 minutes out. The only transitions are
//! Anonymous -> Authenticated (sign-in), Authenticated -> Anonymous
//! (sign-out, sweep eviction, expired restore) and re-sign-in, which
//! replaces the session in place.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::account::{CredentialStore, Role};
use crate::clock::Clock;
use crate::error::AuthError;
use crate::store::{StateStore, KEY_SESSION};

/// Sessions lapse 30 minutes after sign-in.
pub const SESSION_TIMEOUT_MINUTES: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub name: String,
    pub email: String,
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
    pub role: Role,
    /// Absolute expiry, stored as epoch milliseconds so records
    /// written by the browser client parse unchanged.
    #[serde(rename = "sessionExpiry", with = "chrono::serde::ts_milliseconds")]
    pub session_expiry: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.session_expiry
    }

    /// Minutes remaining until expiry (for display).
    pub fn minutes_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.session_expiry - now).num_minutes().max(0)
    }
}

/// Outcome of adopting persisted session state at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    /// A live persisted session was adopted.
    Restored(Session),
    /// The persisted session had lapsed and was discarded; the front
    /// end should tell the user to sign in again.
    Expired,
    /// No usable persisted session.
    Anonymous,
}

pub struct SessionManager {
    store: StateStore,
    credentials: CredentialStore,
    clock: Arc<dyn Clock>,
    current: Option<Session>,
}

impl SessionManager {
    pub fn new(store: StateStore, clock: Arc<dyn Clock>) -> Self {
        let credentials = CredentialStore::new(store.clone());
        Self {
            store,
            credentials,
            clock,
            current: None,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Validate credentials and open a session, replacing any previous
    /// one. The expiry lands exactly 30 minutes past the clock's now.
    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, AuthError> {
        let account = self.credentials.find(email)?.ok_or(AuthError::NotFound)?;

        if account.password != password {
            debug!(email, "Password mismatch");
            return Err(AuthError::InvalidCredential);
        }

        let session = Session {
            name: account.name,
            email: account.email,
            is_authenticated: true,
            role: account.role,
            session_expiry: self.clock.now() + Duration::minutes(SESSION_TIMEOUT_MINUTES),
        };

        self.store.write(KEY_SESSION, &session)?;
        info!(email = %session.email, role = %session.role, "Signed in");
        self.current = Some(session.clone());
        Ok(session)
    }

    /// Clear the session. Safe to call with none active.
    pub fn sign_out(&mut self) -> Result<(), AuthError> {
        self.current = None;
        self.store.remove(KEY_SESSION)?;
        Ok(())
    }

    /// Reset the password for `email` to the fixed recovery value.
    pub fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        self.credentials.reset_password(email)
    }

    /// Adopt persisted session state at startup. A malformed record
    /// has already been discarded by the store and reads as absent.
    pub fn restore_session(&mut self) -> Result<RestoreOutcome, AuthError> {
        let stored: Option<Session> = match self.store.read(KEY_SESSION) {
            Ok(stored) => stored,
            Err(AuthError::MalformedState { .. }) => None,
            Err(e) => return Err(e),
        };

        let Some(session) = stored else {
            return Ok(RestoreOutcome::Anonymous);
        };

        if session.is_expired(self.clock.now()) {
            self.store.remove(KEY_SESSION)?;
            info!(email = %session.email, "Discarded expired session at startup");
            return Ok(RestoreOutcome::Expired);
        }

        self.current = Some(session.clone());
        Ok(RestoreOutcome::Restored(session))
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// True iff a live, non-expired session is present.
    pub fn is_authenticated(&self) -> bool {
        self.current
            .as_ref()
            .map(|s| !s.is_expired(self.clock.now()))
            .unwrap_or(false)
    }

    pub fn is_publisher(&self) -> bool {
        self.current
            .as_ref()
            .map(|s| s.role.is_publisher())
            .unwrap_or(false)
    }

    /// One sweep tick: re-check the persisted session and force a
    /// sign-out if it has lapsed. Returns true when an eviction fired.
    pub fn check_expiry(&mut self) -> Result<bool, AuthError> {
        let evicted = crate::sweep::sweep_once(&self.store, self.clock.as_ref())?;
        if evicted {
            self.current = None;
        }
        Ok(evicted)
    }
}
