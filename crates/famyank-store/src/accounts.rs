//! # Staff Accounts
//!
//! Worker account creation and login. Passwords are stored as Argon2id PHC
//! strings; records from before hashing carry a plaintext `password` that is
//! replaced by a hash on the first successful login.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use famyank_core::ids::USER_PREFIX;
use famyank_core::validation::validate_email;
use famyank_core::{CoreError, SessionUser, UserAccount, UserRole, ValidationError};
use tracing::{debug, info};

use crate::bus::{ChangeEvent, ChangeKind};
use crate::error::{StoreError, StoreResult};
use crate::store::PosStore;

pub(crate) fn hash_password(password: &str) -> StoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

/// False for a wrong password and for an unparseable hash.
pub(crate) fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Runs [`hash_password`] on the blocking pool.
async fn hash_password_off_thread(password: &str) -> StoreResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| StoreError::PasswordHash(e.to_string()))?
}

/// Runs [`verify_password`] on the blocking pool.
async fn verify_password_off_thread(password: &str, hash: String) -> StoreResult<bool> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

/// Gives every seeded admin `password`.
pub(crate) fn attach_admin_password(users: &mut [UserAccount], password: &str) -> StoreResult<()> {
    for user in users.iter_mut().filter(|u| u.role == UserRole::Admin) {
        user.password_hash = Some(hash_password(password)?);
        user.legacy_password = None;
    }
    Ok(())
}

impl PosStore {
    /// Staff accounts without credentials.
    pub fn users(&self) -> Vec<SessionUser> {
        self.read().users.iter().map(UserAccount::session).collect()
    }

    fn find_account(&self, email: &str) -> Option<UserAccount> {
        self.read()
            .users
            .iter()
            .find(|u| u.email_matches(email))
            .cloned()
    }

    /// Creates a worker account.
    ///
    /// The password is hashed before the writer gate is taken; the email is
    /// checked again under the gate.
    ///
    /// ## Errors
    /// - `Validation` for a blank name, malformed email or blank password
    /// - `DuplicateAccount` when the email is taken, ignoring case
    pub async fn add_worker_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> StoreResult<SessionUser> {
        let name = name.trim();
        let email = email.trim();

        if name.is_empty() {
            return Err(CoreError::from(ValidationError::required("name")).into());
        }
        validate_email(email).map_err(CoreError::from)?;
        if password.is_empty() {
            return Err(CoreError::from(ValidationError::required("password")).into());
        }
        let duplicate = || -> StoreError {
            CoreError::DuplicateAccount {
                email: email.to_string(),
            }
            .into()
        };
        if self.find_account(email).is_some() {
            return Err(duplicate());
        }

        let password_hash = hash_password_off_thread(password).await?;

        let _gate = self.gate().await;

        let mut users = self.read().users.clone();
        if users.iter().any(|u| u.email_matches(email)) {
            return Err(duplicate());
        }

        let account = UserAccount {
            id: self.next_id(USER_PREFIX),
            name: name.to_string(),
            role: UserRole::Worker,
            email: email.to_string(),
            password_hash: Some(password_hash),
            legacy_password: None,
        };
        let session = account.session();
        users.push(account);

        self.persist(vec![PosStore::encode_users(&users)?]).await?;
        self.commit(
            |state| state.users = users,
            ChangeEvent::local(ChangeKind::AccountsChanged),
        );

        info!(user_id = %session.id, "Worker account created");
        Ok(session)
    }

    /// Checks a login. `Ok(None)` means the email or password is wrong.
    ///
    /// Hashed accounts are verified without the writer gate. Only a legacy
    /// plaintext match takes it, to store the upgraded hash.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<SessionUser>> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Ok(None);
        }

        let Some(account) = self.find_account(&email) else {
            debug!("Login for unknown email");
            return Ok(None);
        };

        if let Some(hash) = account.password_hash.clone() {
            let verified = verify_password_off_thread(password, hash).await?;
            return Ok(verified.then(|| account.session()));
        }

        match &account.legacy_password {
            Some(legacy) if legacy == password => {}
            _ => return Ok(None),
        }

        let upgraded = hash_password_off_thread(password).await?;

        let gate = self.gate().await;

        let mut users = self.read().users.clone();
        let Some(current) = users.iter_mut().find(|u| u.id == account.id) else {
            return Ok(None);
        };
        if current.legacy_password.as_deref() != Some(password) {
            // Upgraded or changed by another call since it was read.
            let hash = current.password_hash.clone();
            let session = current.session();
            drop(gate);
            return match hash {
                Some(hash) => Ok(verify_password_off_thread(password, hash)
                    .await?
                    .then_some(session)),
                None => Ok(None),
            };
        }

        current.password_hash = Some(upgraded);
        current.legacy_password = None;
        let session = current.session();

        self.persist(vec![PosStore::encode_users(&users)?]).await?;
        self.commit(
            |state| state.users = users,
            ChangeEvent::local(ChangeKind::AccountsChanged),
        );

        info!(user_id = %session.id, "Legacy password upgraded to hash");
        Ok(Some(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::ErrorCode;
    use famyank_db::{MemoryBackend, RecordKey};
    use std::sync::Arc;
    use std::time::Duration;

    async fn store(config: StoreConfig) -> (PosStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = PosStore::open(backend.clone(), config).await.unwrap();
        (store, backend)
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_add_worker_and_login() {
        let (store, _) = store(StoreConfig::default()).await;

        let worker = store
            .add_worker_account("  Ama Mensah ", " ama@famyank.com ", "pass123")
            .await
            .unwrap();
        assert_eq!(worker.name, "Ama Mensah");
        assert_eq!(worker.role, UserRole::Worker);
        assert!(worker.id.starts_with("u-"));

        let session = store
            .authenticate("AMA@famyank.com", "pass123")
            .await
            .unwrap();
        assert_eq!(session, Some(worker));
        assert_eq!(store.authenticate("ama@famyank.com", "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_email_ignores_case() {
        let (store, _) = store(StoreConfig::default()).await;

        let err = store
            .add_worker_account("Someone", "FRANCISCA@famyank.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::DuplicateAccount { .. })));
        assert_eq!(err.code(), ErrorCode::Duplicate);
        assert_eq!(store.users().len(), 2);
    }

    #[tokio::test]
    async fn test_required_fields() {
        let (store, _) = store(StoreConfig::default()).await;
        for (name, email, password) in [("", "a@b.c", "pw"), ("A", "", "pw"), ("A", "a@b.c", "")] {
            let err = store
                .add_worker_account(name, email, password)
                .await
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::ValidationError);
        }
    }

    #[tokio::test]
    async fn test_bootstrap_admin_password() {
        let config = StoreConfig {
            bootstrap_admin_password: Some("admin-pass".into()),
            ..StoreConfig::default()
        };
        let (store, _) = store(config).await;

        let admin = store
            .authenticate("admin@famyank.com", "admin-pass")
            .await
            .unwrap()
            .unwrap();
        assert!(admin.is_admin());
        assert_eq!(admin.staff_ref().name, "Admin Francisca");

        // Seeded worker has no credential.
        assert_eq!(
            store.authenticate("francisca@famyank.com", "").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_legacy_password_upgraded_on_login() {
        let legacy = r#"[{"id":"u1","name":"Admin Francisca","role":"ADMIN","email":"admin@famyank.com","password":"admin"}]"#;
        let backend = Arc::new(MemoryBackend::with_records([(
            RecordKey::Users,
            legacy.to_string(),
        )]));
        let store = PosStore::open(backend.clone(), StoreConfig::default())
            .await
            .unwrap();

        assert_eq!(store.authenticate("admin@famyank.com", "wrong").await.unwrap(), None);
        let session = store
            .authenticate("admin@famyank.com", "admin")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.id, "u1");

        let raw = backend.raw(RecordKey::Users).await.unwrap();
        assert!(raw.contains("$argon2id$"));
        assert!(!raw.contains(r#""password":"admin""#));

        // Hash now verifies the same password.
        assert!(store
            .authenticate("admin@famyank.com", "admin")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_hashed_login_does_not_wait_for_writer() {
        let (store, _) = store(StoreConfig::default()).await;
        store
            .add_worker_account("Ama", "ama@famyank.com", "pass123")
            .await
            .unwrap();

        let _gate = store.gate().await;
        let session = tokio::time::timeout(
            Duration::from_secs(10),
            store.authenticate("ama@famyank.com", "pass123"),
        )
        .await
        .expect("login blocked on the writer gate")
        .unwrap();
        assert!(session.is_some());

        let rejected = tokio::time::timeout(
            Duration::from_secs(10),
            store.authenticate("ama@famyank.com", "wrong"),
        )
        .await
        .expect("login blocked on the writer gate")
        .unwrap();
        assert_eq!(rejected, None);
    }

    #[tokio::test]
    async fn test_concurrent_legacy_logins_upgrade_once() {
        let legacy = r#"[{"id":"u1","name":"Admin Francisca","role":"ADMIN","email":"admin@famyank.com","password":"admin"}]"#;
        let backend = Arc::new(MemoryBackend::with_records([(
            RecordKey::Users,
            legacy.to_string(),
        )]));
        let store = Arc::new(
            PosStore::open(backend.clone(), StoreConfig::default())
                .await
                .unwrap(),
        );
        let saves = backend.save_count();

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.authenticate("admin@famyank.com", "admin").await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().unwrap().is_some());
        }

        assert_eq!(backend.save_count(), saves + 1);
        assert!(backend
            .raw(RecordKey::Users)
            .await
            .unwrap()
            .contains("$argon2id$"));
    }

    #[tokio::test]
    async fn test_account_change_notifies() {
        let (store, _) = store(StoreConfig::default()).await;
        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let e = events.clone();
        store
            .subscribe_events(move |event| e.lock().unwrap().push(event.kind.clone()))
            .forget();

        store
            .add_worker_account("Kofi", "kofi@famyank.com", "pw")
            .await
            .unwrap();
        assert_eq!(*events.lock().unwrap(), vec![ChangeKind::AccountsChanged]);
    }
}
