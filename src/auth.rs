//! Auth
//!
//! The signed-in user, as handed over by the hosted auth backend, kept in the
//! durable medium between runs.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::persistence::{KeyValueStore, PersistenceError, load_record, save_record};

/// Key under which the session is stored.
pub const SESSION_STORAGE_KEY: &str = "auth-storage";

/// User role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular shopper.
    #[default]
    Customer,

    /// Back-office user.
    Admin,
}

/// Identified user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend user id.
    pub id: String,

    /// Email address.
    pub email: String,

    /// Display name.
    pub name: String,

    /// Role, `customer` when absent.
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Whether the user may use the back-office.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionRecord {
    user: Option<User>,
}

/// Current session, persisted after each change.
#[derive(Debug)]
pub struct Session<S> {
    store: S,
    user: Option<User>,
}

impl<S: KeyValueStore> Session<S> {
    /// Restore the session from `store`. A missing or corrupt record means
    /// nobody is signed in.
    pub fn restore(store: S) -> Self {
        let record: SessionRecord = load_record(&store, SESSION_STORAGE_KEY).unwrap_or_default();

        Self {
            store,
            user: record.user,
        }
    }

    /// Sign `user` in, replacing any current user.
    ///
    /// # Errors
    ///
    /// Returns a `PersistenceError` if the session cannot be written.
    pub fn login(&mut self, user: User) -> Result<(), PersistenceError> {
        info!(user = %user.id, role = ?user.role, "signed in");

        self.user = Some(user);
        self.save()
    }

    /// Sign the current user out.
    ///
    /// # Errors
    ///
    /// Returns a `PersistenceError` if the session cannot be written.
    pub fn logout(&mut self) -> Result<(), PersistenceError> {
        if let Some(user) = self.user.take() {
            info!(user = %user.id, "signed out");
        }

        self.save()
    }

    /// Currently signed-in user.
    pub fn current(&self) -> Option<&User> {
        self.user.as_ref()
    }

    fn save(&mut self) -> Result<(), PersistenceError> {
        let record = SessionRecord {
            user: self.user.clone(),
        };

        save_record(&mut self.store, SESSION_STORAGE_KEY, &record)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::persistence::memory::MemoryStore;

    use super::*;

    fn ana() -> User {
        User {
            id: "u-1".to_string(),
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            role: Role::Customer,
        }
    }

    #[test]
    fn restore_without_record_is_signed_out() {
        let session = Session::restore(MemoryStore::new());

        assert!(session.current().is_none());
    }

    #[test]
    fn login_survives_restore() -> TestResult {
        let store = MemoryStore::new();
        let mut session = Session::restore(store.clone());

        session.login(ana())?;

        let restored = Session::restore(store);

        assert_eq!(restored.current(), Some(&ana()));

        Ok(())
    }

    #[test]
    fn logout_clears_stored_user() -> TestResult {
        let store = MemoryStore::new();
        let mut session = Session::restore(store.clone());

        session.login(ana())?;
        session.logout()?;

        assert!(Session::restore(store).current().is_none());

        Ok(())
    }

    #[test]
    fn missing_role_defaults_to_customer() {
        let store = MemoryStore::with_entry(
            SESSION_STORAGE_KEY,
            r#"{"user":{"id":"u-2","email":"bia@example.com","name":"Bia"}}"#,
        );

        let session = Session::restore(store);

        assert_eq!(session.current().map(|user| user.role), Some(Role::Customer));
    }

    #[test]
    fn admin_role() -> TestResult {
        let user: User = serde_json::from_str(
            r#"{"id":"u-3","email":"admin@example.com","name":"Admin","role":"admin"}"#,
        )?;

        assert!(user.is_admin());
        assert!(!ana().is_admin());

        Ok(())
    }

    #[test]
    fn corrupt_record_is_signed_out() {
        let session = Session::restore(MemoryStore::with_entry(SESSION_STORAGE_KEY, "nope"));

        assert!(session.current().is_none());
    }
}
