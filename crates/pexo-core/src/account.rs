//! Registered accounts — the `userDatabase` record.
//!
//! Accounts are created by the seed step or by registration, updated
//! only by a password reset, and never deleted. Lookup is always
//! case-insensitive on email.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AuthError;
use crate::store::{StateStore, KEY_USER_DATABASE};

/// Fixed value every password reset writes. The reset flow sends no
/// email; the account simply authenticates with this value afterwards.
pub const RESET_PASSWORD: &str = "resetpass123";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Publisher,
    Respondent,
}

impl Role {
    pub fn is_publisher(&self) -> bool {
        matches!(self, Role::Publisher)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Publisher => write!(f, "publisher"),
            Role::Respondent => write!(f, "respondent"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "publisher" => Ok(Role::Publisher),
            "respondent" => Ok(Role::Respondent),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub struct CredentialStore {
    store: StateStore,
}

impl CredentialStore {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Write the demo accounts. Explicit one-time initialization: an
    /// existing database, even an empty list, is left untouched.
    pub fn seed(&self) -> Result<(), AuthError> {
        if self.store.contains(KEY_USER_DATABASE) {
            return Ok(());
        }

        let demo = vec![
            Account {
                name: "John Doe".to_string(),
                email: "john@example.com".to_string(),
                password: "password123".to_string(),
                role: Role::Publisher,
            },
            Account {
                name: "Jane Smith".to_string(),
                email: "jane@example.com".to_string(),
                password: "password123".to_string(),
                role: Role::Respondent,
            },
        ];

        self.store.write(KEY_USER_DATABASE, &demo)?;
        info!(count = demo.len(), "Seeded demo accounts");
        Ok(())
    }

    /// All registered accounts. A database that fails to parse has
    /// already been discarded by the store and reads as empty.
    pub fn accounts(&self) -> Result<Vec<Account>, AuthError> {
        match self.store.read(KEY_USER_DATABASE) {
            Ok(Some(accounts)) => Ok(accounts),
            Ok(None) => Ok(Vec::new()),
            Err(AuthError::MalformedState { .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Case-insensitive lookup by email.
    pub fn find(&self, email: &str) -> Result<Option<Account>, AuthError> {
        Ok(self
            .accounts()?
            .into_iter()
            .find(|a| a.email.eq_ignore_ascii_case(email)))
    }

    /// Add a new account, rejecting a duplicate email.
    pub fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<(), AuthError> {
        let mut accounts = self.accounts()?;
        if accounts.iter().any(|a| a.email.eq_ignore_ascii_case(email)) {
            return Err(AuthError::EmailTaken);
        }

        accounts.push(Account {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        });
        self.store.write(KEY_USER_DATABASE, &accounts)?;
        info!(email, role = %role, "Registered account");
        Ok(())
    }

    /// Overwrite the password for `email` with [`RESET_PASSWORD`].
    pub fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let mut accounts = self.accounts()?;
        let account = accounts
            .iter_mut()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .ok_or(AuthError::NotFound)?;

        account.password = RESET_PASSWORD.to_string();
        self.store.write(KEY_USER_DATABASE, &accounts)?;
        info!(email, "Password reset to the fixed recovery value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_credentials() -> (tempfile::TempDir, CredentialStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path()).unwrap();
        (dir, CredentialStore::new(store))
    }

    #[test]
    fn test_seed_writes_demo_accounts_once() {
        let (_dir, credentials) = temp_credentials();
        credentials.seed().unwrap();

        let accounts = credentials.accounts().unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].email, "john@example.com");
        assert_eq!(accounts[0].role, Role::Publisher);
        assert_eq!(accounts[1].email, "jane@example.com");
        assert_eq!(accounts[1].role, Role::Respondent);

        // A second seed must not duplicate or overwrite
        credentials.reset_password("john@example.com").unwrap();
        credentials.seed().unwrap();
        let accounts = credentials.accounts().unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].password, RESET_PASSWORD);
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let (_dir, credentials) = temp_credentials();
        credentials.seed().unwrap();

        let account = credentials.find("John@Example.Com").unwrap().unwrap();
        assert_eq!(account.email, "john@example.com");
        assert!(credentials.find("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_register_rejects_duplicate_email() {
        let (_dir, credentials) = temp_credentials();
        credentials.seed().unwrap();

        let result =
            credentials.register("Johnny", "JOHN@example.com", "hunter2", Role::Respondent);
        assert!(matches!(result, Err(AuthError::EmailTaken)));

        credentials
            .register("Ada Lovelace", "ada@example.com", "hunter2", Role::Publisher)
            .unwrap();
        let account = credentials.find("ada@example.com").unwrap().unwrap();
        assert_eq!(account.role, Role::Publisher);
    }

    #[test]
    fn test_reset_password_requires_registered_email() {
        let (_dir, credentials) = temp_credentials();
        credentials.seed().unwrap();

        let result = credentials.reset_password("nobody@example.com");
        assert!(matches!(result, Err(AuthError::NotFound)));

        credentials.reset_password("jane@example.com").unwrap();
        let account = credentials.find("jane@example.com").unwrap().unwrap();
        assert_eq!(account.password, RESET_PASSWORD);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Publisher).unwrap(), "\"publisher\"");
        let role: Role = serde_json::from_str("\"respondent\"").unwrap();
        assert_eq!(role, Role::Respondent);
    }
}
