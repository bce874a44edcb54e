use crate::{
    errors::StoreError,
    mirror::PersistenceMirror,
    models::{User, UserUpdate},
};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Lifecycle of the single client-side profile.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", content = "user", rename_all = "lowercase")]
pub enum UserPhase {
    Uninitialized,
    Hydrating,
    Ready(User),
}

pub struct UserStore {
    mirror: PersistenceMirror,
    phase: RwLock<UserPhase>,
}

impl UserStore {
    pub fn new(mirror: PersistenceMirror) -> Self {
        Self {
            mirror,
            phase: RwLock::new(UserPhase::Uninitialized),
        }
    }

    /// Loads the stored profile, or installs and persists the default one.
    pub async fn hydrate(&self) -> Result<User, StoreError> {
        let mut phase = self.phase.write().await;
        *phase = UserPhase::Hydrating;

        let user = match self.mirror.load_user() {
            Ok(Some(user)) => {
                tracing::info!(
                    user_id = %user.id,
                    username = %user.username,
                    "User hydrated from local storage"
                );
                user
            }
            Ok(None) => {
                tracing::info!("No stored user, starting with the default profile");
                User::default()
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Stored user unreadable, starting with the default profile"
                );
                User::default()
            }
        };
        self.mirror.save_user(&user)?;
        *phase = UserPhase::Ready(user.clone());
        Ok(user)
    }

    /// Local identity reset; no credentials are checked.
    pub async fn login(&self, username: &str) -> Result<User, StoreError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StoreError::validation("Username cannot be empty"));
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            ..User::default()
        };

        let mut phase = self.phase.write().await;
        self.mirror.save_user(&user)?;
        *phase = UserPhase::Ready(user.clone());
        tracing::info!(user_id = %user.id, %username, "Logged in");
        Ok(user)
    }

    pub async fn update_profile(&self, update: UserUpdate) -> Result<User, StoreError> {
        if let Some(username) = &update.username {
            if username.trim().is_empty() {
                return Err(StoreError::validation("Username cannot be empty"));
            }
        }
        self.modify(|user| {
            if let Some(username) = update.username {
                user.username = username.trim().to_string();
            }
            if let Some(bio) = update.bio {
                user.bio = bio;
            }
            if let Some(avatar) = update.avatar {
                user.avatar = avatar;
            }
        })
        .await
    }

    /// Appends without deduplicating; check `is_meme_liked` first.
    pub async fn like_meme(&self, meme_id: &str) -> Result<Option<User>, StoreError> {
        self.modify_if_ready(|user| user.liked_memes.push(meme_id.to_string()))
            .await
    }

    pub async fn unlike_meme(&self, meme_id: &str) -> Result<Option<User>, StoreError> {
        self.modify_if_ready(|user| user.liked_memes.retain(|id| id != meme_id))
            .await
    }

    pub async fn add_uploaded_meme(&self, meme_id: &str) -> Result<Option<User>, StoreError> {
        self.modify_if_ready(|user| user.uploaded_memes.push(meme_id.to_string()))
            .await
    }

    pub async fn is_meme_liked(&self, meme_id: &str) -> bool {
        match &*self.phase.read().await {
            UserPhase::Ready(user) => user.liked_memes.iter().any(|id| id == meme_id),
            _ => false,
        }
    }

    pub async fn current(&self) -> Option<User> {
        match &*self.phase.read().await {
            UserPhase::Ready(user) => Some(user.clone()),
            _ => None,
        }
    }

    pub async fn phase(&self) -> UserPhase {
        self.phase.read().await.clone()
    }

    async fn modify(&self, edit: impl FnOnce(&mut User)) -> Result<User, StoreError> {
        let mut phase = self.phase.write().await;
        let UserPhase::Ready(user) = &mut *phase else {
            return Err(StoreError::UserNotReady);
        };
        edit(user);
        self.mirror.save_user(user)?;
        Ok(user.clone())
    }

    /// Like `modify`, but silently skips when there is no profile yet.
    async fn modify_if_ready(
        &self,
        edit: impl FnOnce(&mut User),
    ) -> Result<Option<User>, StoreError> {
        match self.modify(edit).await {
            Ok(user) => Ok(Some(user)),
            Err(StoreError::UserNotReady) => {
                tracing::warn!("User update ignored: no profile loaded");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn fresh() -> (UserStore, PersistenceMirror) {
        let mirror = PersistenceMirror::new(Arc::new(MemoryStorage::new()));
        (UserStore::new(mirror.clone()), mirror)
    }

    #[tokio::test]
    async fn hydrate_installs_default_user() {
        let (store, mirror) = fresh();
        assert_eq!(store.phase().await, UserPhase::Uninitialized);

        let user = store.hydrate().await.unwrap();
        assert_eq!(user, User::default());
        assert_eq!(store.phase().await, UserPhase::Ready(User::default()));
        assert_eq!(mirror.load_user().unwrap(), Some(User::default()));
    }

    #[tokio::test]
    async fn hydrate_prefers_stored_user() {
        let (store, mirror) = fresh();
        let stored = User {
            username: "bob".into(),
            liked_memes: vec!["61579".into()],
            ..User::default()
        };
        mirror.save_user(&stored).unwrap();

        assert_eq!(store.hydrate().await.unwrap(), stored);
        assert!(store.is_meme_liked("61579").await);
    }

    #[tokio::test]
    async fn like_then_unlike_toggles_membership() {
        let (store, _) = fresh();
        store.hydrate().await.unwrap();

        store.like_meme("181913649").await.unwrap();
        assert!(store.is_meme_liked("181913649").await);
        store.unlike_meme("181913649").await.unwrap();
        assert!(!store.is_meme_liked("181913649").await);
        // Unliking something never liked changes nothing.
        let user = store.unlike_meme("181913649").await.unwrap().unwrap();
        assert!(user.liked_memes.is_empty());
    }

    #[tokio::test]
    async fn login_resets_identity() {
        let (store, mirror) = fresh();
        store.hydrate().await.unwrap();
        store.like_meme("1").await.unwrap();
        store.add_uploaded_meme("meme-1").await.unwrap();

        let user = store.login("alice").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.id, User::default().id);
        assert!(user.liked_memes.is_empty());
        assert!(user.uploaded_memes.is_empty());
        assert_eq!(user.bio, User::default().bio);
        assert_eq!(mirror.load_user().unwrap(), Some(user));

        assert!(matches!(store.login("   ").await, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn update_profile_merges_fields() {
        let (store, _) = fresh();
        store.hydrate().await.unwrap();

        let update =
            UserUpdate { bio: Some("Professional lurker".into()), ..UserUpdate::default() };
        let user = store.update_profile(update).await.unwrap();
        assert_eq!(user.bio, "Professional lurker");
        assert_eq!(user.username, User::default().username);

        let err = store
            .update_profile(UserUpdate { username: Some(" ".into()), ..UserUpdate::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.current().await.unwrap().bio, "Professional lurker");
    }

    #[tokio::test]
    async fn edits_before_hydration_are_rejected_or_skipped() {
        let (store, mirror) = fresh();
        assert!(matches!(
            store.update_profile(UserUpdate::default()).await,
            Err(StoreError::UserNotReady)
        ));
        assert!(store.like_meme("1").await.unwrap().is_none());
        assert!(!store.is_meme_liked("1").await);
        assert!(mirror.load_user().unwrap().is_none());
    }
}
