use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;

mod backend;
mod error;
mod models;

pub use backend::{JsonFileBackend, MemoryBackend, StoreBackend};
pub use error::StoreError;
pub use models::{
    now_iso, parse_iso, to_iso, Document, PayrollRecord, PayrollStatus, Role, UserRecord,
};

/// Sole authority over durable state. Every mutation is a full
/// read-modify-write of the backing document under a single-writer lock.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn StoreBackend>,
    write_lock: Arc<Mutex<()>>,
}

/// Fields required to create a user; the rest of the record is defaulted.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    pub department: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

/// Partial update: present fields overwrite, absent fields are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub is_active: Option<bool>,
    pub email_verified: Option<bool>,
    pub profile_picture: Option<String>,
}

impl UserPatch {
    fn apply(self, user: &mut UserRecord) {
        if let Some(v) = self.username {
            user.username = v;
        }
        if let Some(v) = self.email {
            user.email = v;
        }
        if let Some(v) = self.password {
            user.password = v;
        }
        if let Some(v) = self.role {
            user.role = v;
        }
        if let Some(v) = self.full_name {
            user.full_name = v;
        }
        if let Some(v) = self.department {
            user.department = v;
        }
        if let Some(v) = self.position {
            user.position = v;
        }
        if let Some(v) = self.phone {
            user.phone = v;
        }
        if let Some(v) = self.emergency_contact_name {
            user.emergency_contact_name = v;
        }
        if let Some(v) = self.emergency_contact_phone {
            user.emergency_contact_phone = v;
        }
        if let Some(v) = self.is_active {
            user.is_active = v;
        }
        if let Some(v) = self.email_verified {
            user.email_verified = v;
        }
        if let Some(v) = self.profile_picture {
            user.profile_picture = Some(v);
        }
    }
}

impl Store {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            backend,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn all_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.backend.load().await?.users)
    }

    pub async fn user_by_id(&self, id: u32) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.all_users().await?.into_iter().find(|u| u.id == id))
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .all_users()
            .await?
            .into_iter()
            .find(|u| u.username == username))
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.all_users().await?.into_iter().find(|u| u.email == email))
    }

    pub async fn user_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .all_users()
            .await?
            .into_iter()
            .find(|u| u.verification_token.as_deref() == Some(token)))
    }

    /// Ids are `max(existing) + 1` and never reused after deletion.
    pub async fn create_user(&self, new: NewUser) -> Result<UserRecord, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.backend.load().await?;

        if doc.users.iter().any(|u| u.username == new.username) {
            return Err(StoreError::Duplicate("Username"));
        }
        if doc.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Duplicate("Email"));
        }

        let id = doc.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let user = UserRecord {
            id,
            username: new.username,
            email: new.email,
            password: new.password,
            role: new.role,
            full_name: new.full_name,
            created_at: now_iso(),
            is_active: true,
            email_verified: false,
            verification_token: None,
            verification_sent_at: None,
            verification_expires_at: None,
            profile_picture: None,
            department: new.department.unwrap_or_default(),
            position: new.position.unwrap_or_default(),
            phone: new.phone.unwrap_or_default(),
            emergency_contact_name: new.emergency_contact_name.unwrap_or_default(),
            emergency_contact_phone: new.emergency_contact_phone.unwrap_or_default(),
            payroll_history: Vec::new(),
        };

        doc.users.push(user.clone());
        self.backend.save(&doc).await?;
        info!(user_id = user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub async fn update_user(&self, id: u32, patch: UserPatch) -> Result<UserRecord, StoreError> {
        let (user, ()) = self
            .with_user_mut(id, move |user| {
                patch.apply(user);
                Ok(())
            })
            .await?;
        Ok(user)
    }

    pub async fn delete_user(&self, id: u32) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.backend.load().await?;
        let before = doc.users.len();
        doc.users.retain(|u| u.id != id);
        if doc.users.len() == before {
            return Err(StoreError::NotFound);
        }
        self.backend.save(&doc).await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }

    /// Plaintext comparison, kept bit-compatible with the stored documents.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, StoreError> {
        let user = self
            .user_by_username(username)
            .await?
            .ok_or(StoreError::InvalidCredentials)?;
        if user.password != password || !user.is_active {
            return Err(StoreError::InvalidCredentials);
        }
        if !user.email_verified {
            return Err(StoreError::EmailNotVerified);
        }
        Ok(user)
    }

    /// Locked read-modify-write of one user. Returns the persisted snapshot
    /// alongside whatever the mutation produced.
    pub(crate) async fn with_user_mut<T, F>(
        &self,
        id: u32,
        mutate: F,
    ) -> Result<(UserRecord, T), StoreError>
    where
        F: FnOnce(&mut UserRecord) -> Result<T, StoreError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.backend.load().await?;
        let user = doc
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        let out = mutate(user)?;
        let snapshot = user.clone();
        self.backend.save(&doc).await?;
        Ok((snapshot, out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_store() -> Store {
        Store::new(Arc::new(MemoryBackend::default()))
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password: "secret".into(),
            full_name: format!("{username} Example"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn ids_increment_and_are_never_reused() {
        let store = mem_store();
        let alice = store.create_user(new_user("alice", "a@x.com")).await.unwrap();
        let bob = store.create_user(new_user("bob", "b@x.com")).await.unwrap();
        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);

        store.delete_user(alice.id).await.unwrap();
        let carol = store.create_user(new_user("carol", "c@x.com")).await.unwrap();
        assert_eq!(carol.id, 3);

        let users = store.all_users().await.unwrap();
        assert!(users.iter().all(|u| u.id != alice.id));
    }

    #[tokio::test]
    async fn ids_continue_from_max_of_seeded_document() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "users": [
                {"id": 3, "username": "old", "email": "old@x.com", "password": "pw"},
                {"id": 7, "username": "older", "email": "older@x.com", "password": "pw"},
            ]
        }))
        .unwrap();
        let store = Store::new(Arc::new(MemoryBackend::with_document(doc)));

        let user = store.create_user(new_user("new", "new@x.com")).await.unwrap();
        assert_eq!(user.id, 8);
    }

    #[tokio::test]
    async fn duplicate_username_or_email_is_rejected_and_store_unchanged() {
        let store = mem_store();
        store.create_user(new_user("alice", "a@x.com")).await.unwrap();

        let err = store
            .create_user(new_user("alice", "other@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Username already exists");

        let err = store
            .create_user(new_user("other", "a@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email already exists");

        assert_eq!(store.all_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn new_users_start_unverified_with_defaults() {
        let store = mem_store();
        let user = store.create_user(new_user("dana", "d@x.com")).await.unwrap();
        assert!(!user.email_verified);
        assert!(user.is_active);
        assert_eq!(user.role, Role::User);
        assert!(user.payroll_history.is_empty());
        assert!(parse_iso(&user.created_at).is_some());
    }

    #[tokio::test]
    async fn update_overwrites_only_given_fields() {
        let store = mem_store();
        let user = store.create_user(new_user("erin", "e@x.com")).await.unwrap();

        let updated = store
            .update_user(
                user.id,
                UserPatch {
                    department: Some("Engineering".into()),
                    phone: Some("555-0101".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.department, "Engineering");
        assert_eq!(updated.phone, "555-0101");
        assert_eq!(updated.username, "erin");
        assert_eq!(updated.full_name, user.full_name);
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found() {
        let store = mem_store();
        let err = store.update_user(42, UserPatch::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_and_errors_on_missing() {
        let store = mem_store();
        let a = store.create_user(new_user("a", "a@x.com")).await.unwrap();
        store.create_user(new_user("b", "b@x.com")).await.unwrap();

        store.delete_user(a.id).await.unwrap();
        assert_eq!(store.all_users().await.unwrap().len(), 1);

        let err = store.delete_user(a.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn authenticate_paths() {
        let store = mem_store();
        let user = store.create_user(new_user("frank", "f@x.com")).await.unwrap();

        // fresh accounts are unverified
        let err = store.authenticate("frank", "secret").await.unwrap_err();
        assert!(matches!(err, StoreError::EmailNotVerified));

        store
            .update_user(
                user.id,
                UserPatch {
                    email_verified: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let ok = store.authenticate("frank", "secret").await.unwrap();
        assert_eq!(ok.id, user.id);

        let err = store.authenticate("frank", "wrong").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCredentials));

        let err = store.authenticate("nobody", "secret").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCredentials));

        store
            .update_user(
                user.id,
                UserPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let err = store.authenticate("frank", "secret").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCredentials));
    }

    #[tokio::test]
    async fn lookups_by_each_key() {
        let store = mem_store();
        let user = store.create_user(new_user("gail", "g@x.com")).await.unwrap();

        assert!(store.user_by_id(user.id).await.unwrap().is_some());
        assert!(store.user_by_username("gail").await.unwrap().is_some());
        assert!(store.user_by_email("g@x.com").await.unwrap().is_some());
        assert!(store.user_by_id(99).await.unwrap().is_none());
        assert!(store
            .user_by_verification_token("nope")
            .await
            .unwrap()
            .is_none());
    }
}
