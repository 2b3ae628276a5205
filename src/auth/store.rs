//! The mock authentication store.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::storage::{SESSION_KEY, StorageBackend, USERS_KEY};

use super::session::{Session, SessionRecord};
use super::user::{UserProfile, UserRecord};

/// Failure surfaced by a store operation.
///
/// Every variant is recoverable and carries a user-displayable message;
/// nothing here is allowed to propagate as a panic. Unexpected storage
/// failures are logged and collapsed into [`AuthError::OperationFailed`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Sign-up with an email that is already registered.
    #[error("User already exists")]
    DuplicateUser,
    /// Sign-in with an unknown email or a mismatched password.
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// The store was constructed without a durable storage facility.
    #[error("Durable storage is unavailable")]
    StorageUnavailable,
    /// Generic internal failure; details are in the log, not here.
    #[error("Operation failed")]
    OperationFailed,
}

/// Successful sign-up or sign-in: the user plus a fresh session.
#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    /// The registered or matched user record.
    pub user: UserRecord,
    /// The newly created session.
    pub session: Session,
}

/// Client-side emulation of an authentication backend.
///
/// Registered users are held in memory and mirrored to durable storage
/// under a fixed key; the single "current session" lives only in
/// durable storage and is overwritten by every sign-in. The store is an
/// explicit instance: construct one per application (or per test) and
/// pass it by reference.
///
/// Concurrent stores sharing a storage root each load their own
/// snapshot and write back whole documents, so the last writer wins.
#[derive(Debug, Clone)]
pub struct AuthStore {
    inner: Arc<AuthStoreInner>,
}

#[derive(Debug)]
struct AuthStoreInner {
    storage: Arc<dyn StorageBackend>,
    /// Registered users, re-hydrated from storage at construction.
    users: RwLock<Vec<UserRecord>>,
    /// Every session created by this instance. Only the most recently
    /// created one is retrievable as current.
    sessions: RwLock<Vec<Session>>,
}

impl AuthStore {
    /// Construct a store over `storage`, re-hydrating the user list.
    ///
    /// An absent user list starts the store empty. An unparsable one is
    /// logged and also treated as empty rather than failing
    /// construction.
    pub async fn open(storage: Arc<dyn StorageBackend>) -> Self {
        let users = match storage.read(USERS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<UserRecord>>(&raw) {
                Ok(users) => users,
                Err(e) => {
                    error!(
                        name: "auth.load.parse_failed",
                        error = %e,
                        "stored user list is unparsable, starting empty"
                    );
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                error!(
                    name: "auth.load.read_failed",
                    error = %e,
                    "could not read stored user list, starting empty"
                );
                Vec::new()
            }
        };

        Self {
            inner: Arc::new(AuthStoreInner {
                storage,
                users: RwLock::new(users),
                sessions: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Register a new user and sign them in.
    ///
    /// The email is compared exactly against existing records; no
    /// normalization is applied. Password strength is the caller's
    /// concern, not the store's.
    ///
    /// # Errors
    ///
    /// [`AuthError::DuplicateUser`] when the email is already
    /// registered, [`AuthError::StorageUnavailable`] without durable
    /// storage, [`AuthError::OperationFailed`] on storage failure.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: UserProfile,
    ) -> Result<SignedIn, AuthError> {
        if !self.inner.storage.is_available() {
            return Err(AuthError::StorageUnavailable);
        }

        let user = {
            let mut users = self.inner.users.write().await;

            if users.iter().any(|u| u.email == email) {
                warn!(
                    name: "auth.sign_up.duplicate",
                    email = %email,
                    "sign-up rejected, user already exists"
                );
                return Err(AuthError::DuplicateUser);
            }

            let user = UserRecord::new(email, password, profile);
            users.push(user.clone());

            // Persist the full collection while still holding the lock
            // so writes from this instance stay ordered.
            let serialized = serde_json::to_string(&*users).map_err(|e| {
                error!(name: "auth.sign_up.encode_failed", error = %e, "could not encode user list");
                AuthError::OperationFailed
            })?;
            self.inner
                .storage
                .write(USERS_KEY, &serialized)
                .await
                .map_err(|e| {
                    error!(name: "auth.sign_up.persist_failed", error = %e, "could not persist user list");
                    AuthError::OperationFailed
                })?;

            user
        };

        let session = self.open_session(&user).await?;
        Ok(SignedIn { user, session })
    }

    /// Sign an existing user in with plain-equality credentials.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] for an unknown email or a
    /// password mismatch; both cases answer identically so the response
    /// does not reveal which field was wrong.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        if !self.inner.storage.is_available() {
            return Err(AuthError::StorageUnavailable);
        }

        let user = {
            let users = self.inner.users.read().await;
            users.iter().find(|u| u.email == email).cloned()
        };

        let Some(user) = user else {
            warn!(name: "auth.sign_in.unknown_email", email = %email, "sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        };

        // The mock stores credentials verbatim and compares equality.
        if user.password != password {
            warn!(name: "auth.sign_in.bad_password", email = %email, "sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.open_session(&user).await?;
        Ok(SignedIn { user, session })
    }

    /// The user embedded in the durable current-session record.
    ///
    /// Returns `None` when signed out, when storage is unavailable, or
    /// when the record cannot be read or parsed; never an error. Expiry
    /// is not checked.
    pub async fn current_user(&self) -> Option<UserRecord> {
        let raw = match self.inner.storage.read(SESSION_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!(name: "auth.current_user.read_failed", error = %e, "could not read session record");
                return None;
            }
        };

        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => Some(record.user),
            Err(e) => {
                error!(name: "auth.current_user.parse_failed", error = %e, "session record is unparsable");
                None
            }
        }
    }

    /// Remove the durable current-session record. Always succeeds;
    /// storage failures are logged and swallowed.
    pub async fn sign_out(&self) {
        if let Err(e) = self.inner.storage.remove(SESSION_KEY).await {
            error!(name: "auth.sign_out.failed", error = %e, "could not remove session record");
        }
    }

    /// Number of registered users currently held in memory.
    #[must_use]
    pub async fn user_count(&self) -> usize {
        self.inner.users.read().await.len()
    }

    /// Number of sessions created by this instance so far.
    #[must_use]
    pub async fn session_count(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    /// Create a session for `user` and overwrite the durable
    /// current-session record with it.
    async fn open_session(&self, user: &UserRecord) -> Result<Session, AuthError> {
        let session = Session::open(&user.id);
        self.inner.sessions.write().await.push(session.clone());

        let record = SessionRecord {
            user: user.clone(),
            session_id: session.id.clone(),
        };
        let serialized = serde_json::to_string(&record).map_err(|e| {
            error!(name: "auth.session.encode_failed", error = %e, "could not encode session record");
            AuthError::OperationFailed
        })?;
        self.inner
            .storage
            .write(SESSION_KEY, &serialized)
            .await
            .map_err(|e| {
                error!(name: "auth.session.persist_failed", error = %e, "could not persist session record");
                AuthError::OperationFailed
            })?;

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, NullStorage};

    fn profile() -> UserProfile {
        UserProfile {
            years_of_experience: 5,
            hardware_knowledge: true,
            favorite_language: "Rust".to_string(),
        }
    }

    async fn store_in(dir: &tempfile::TempDir) -> AuthStore {
        AuthStore::open(Arc::new(FileStorage::new(dir.path()))).await
    }

    #[tokio::test]
    async fn test_sign_up_creates_user_and_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let signed = store
            .sign_up("reader@example.com", "hunter2", profile())
            .await
            .unwrap();

        assert_eq!(signed.user.email, "reader@example.com");
        assert_eq!(signed.user.password, "hunter2");
        assert_eq!(signed.session.user_id, signed.user.id);

        let current = store.current_user().await.unwrap();
        assert_eq!(current, signed.user);
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_leaves_first_record_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store
            .sign_up("reader@example.com", "first", profile())
            .await
            .unwrap();

        let err = store
            .sign_up("reader@example.com", "second", profile())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::DuplicateUser);
        assert_eq!(store.user_count().await, 1);

        // The original credential still works.
        store.sign_in("reader@example.com", "first").await.unwrap();
    }

    #[tokio::test]
    async fn test_users_survive_reload() {
        let dir = tempfile::tempdir().unwrap();

        let first_id;
        {
            let store = store_in(&dir).await;
            let a = store.sign_up("a@example.com", "pw-a", profile()).await.unwrap();
            let b = store.sign_up("b@example.com", "pw-b", profile()).await.unwrap();
            assert_ne!(a.user.id, b.user.id);
            first_id = a.user.id;
        }

        // Fresh instance over the same storage root.
        let store = store_in(&dir).await;
        assert_eq!(store.user_count().await, 2);

        let signed = store.sign_in("a@example.com", "pw-a").await.unwrap();
        assert_eq!(signed.user.id, first_id);
    }

    #[tokio::test]
    async fn test_sign_in_returns_profile_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let submitted = UserProfile {
            years_of_experience: 0,
            hardware_knowledge: false,
            favorite_language: "Forth".to_string(),
        };
        store
            .sign_up("reader@example.com", "pw", submitted.clone())
            .await
            .unwrap();

        let signed = store.sign_in("reader@example.com", "pw").await.unwrap();
        assert_eq!(signed.user.profile, submitted);
    }

    #[tokio::test]
    async fn test_failed_sign_in_creates_no_session_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store
            .sign_up("reader@example.com", "right", profile())
            .await
            .unwrap();
        store.sign_out().await;

        let err = store.sign_in("reader@example.com", "wrong").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(
            store.sign_in("nobody@example.com", "right").await.unwrap_err(),
            AuthError::InvalidCredentials
        );

        assert!(store.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_current_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store
            .sign_up("reader@example.com", "pw", profile())
            .await
            .unwrap();
        assert!(store.current_user().await.is_some());

        store.sign_out().await;
        assert!(store.current_user().await.is_none());

        // Signing out while signed out is fine.
        store.sign_out().await;
    }

    #[tokio::test]
    async fn test_only_latest_session_is_current() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn StorageBackend> = Arc::new(FileStorage::new(dir.path()));
        let store = AuthStore::open(Arc::clone(&storage)).await;

        store
            .sign_up("reader@example.com", "pw", profile())
            .await
            .unwrap();
        let second = store.sign_in("reader@example.com", "pw").await.unwrap();

        // The in-memory list accumulates, but only the most recent
        // session is durably recorded.
        assert_eq!(store.session_count().await, 2);

        let raw = storage.read(SESSION_KEY).await.unwrap().unwrap();
        let record: SessionRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(record.session_id, second.session.id);
    }

    #[tokio::test]
    async fn test_unavailable_storage_branch() {
        let store = AuthStore::open(Arc::new(NullStorage)).await;

        assert_eq!(
            store.sign_up("a@example.com", "pw", profile()).await.unwrap_err(),
            AuthError::StorageUnavailable
        );
        assert_eq!(
            store.sign_in("a@example.com", "pw").await.unwrap_err(),
            AuthError::StorageUnavailable
        );
        assert!(store.current_user().await.is_none());
        store.sign_out().await;
    }

    #[tokio::test]
    async fn test_corrupt_user_list_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn StorageBackend> = Arc::new(FileStorage::new(dir.path()));
        storage.write(USERS_KEY, "not json at all").await.unwrap();

        let store = AuthStore::open(storage).await;
        assert_eq!(store.user_count().await, 0);

        // The store is still usable after the degraded load.
        store
            .sign_up("reader@example.com", "pw", profile())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_email_compared_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store
            .sign_up("Reader@Example.com", "pw", profile())
            .await
            .unwrap();

        // Different casing registers a separate account.
        store
            .sign_up("reader@example.com", "pw", profile())
            .await
            .unwrap();
        assert_eq!(store.user_count().await, 2);

        assert_eq!(
            store.sign_in("READER@EXAMPLE.COM", "pw").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }
}
