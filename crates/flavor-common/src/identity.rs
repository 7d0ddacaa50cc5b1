//! Saved login, kept as a small JSON file between runs.

use std::path::{Path, PathBuf};

use crate::error::AuthStoreError;
use crate::record::User;
use crate::store::IdentityProvider;

/// File name of the saved login inside the flavor config directory.
pub const SESSION_FILE: &str = "session.json";

/// The logged-in user, backed by a JSON file.
#[derive(Debug, Clone)]
pub struct AuthStore {
    path: PathBuf,
    user: Option<User>,
}

impl AuthStore {
    /// Default location: `<config dir>/flavor/session.json`.
    pub fn default_path() -> Result<PathBuf, AuthStoreError> {
        dirs::config_dir()
            .map(|dir| dir.join("flavor").join(SESSION_FILE))
            .ok_or(AuthStoreError::NoConfigDir)
    }

    /// Restore the saved login, if any. A missing file means logged out.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AuthStoreError> {
        let path = path.as_ref().to_path_buf();
        let user = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Some(serde_json::from_str(&contents).map_err(|source| {
                AuthStoreError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => return Err(AuthStoreError::Io { path, source }),
        };

        Ok(Self { path, user })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Remember `user` as logged in.
    pub async fn save(&mut self, user: User) -> Result<(), AuthStoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| AuthStoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let contents = serde_json::to_string_pretty(&user).map_err(|source| {
            AuthStoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|source| AuthStoreError::Io {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(user = %user.id, path = %self.path.display(), "saved login");
        self.user = Some(user);
        Ok(())
    }

    /// Forget the saved login.
    pub async fn clear(&mut self) -> Result<(), AuthStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(AuthStoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        }
        self.user = None;
        Ok(())
    }
}

impl IdentityProvider for AuthStore {
    fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("flavor-auth-{}-{}", name, std::process::id()))
            .join(SESSION_FILE)
    }

    #[tokio::test]
    async fn missing_file_means_logged_out() {
        let store = AuthStore::load(scratch_path("missing")).await.unwrap();
        assert!(store.current_user().is_none());
    }

    #[tokio::test]
    async fn save_load_clear() {
        let path = scratch_path("roundtrip");
        let mut store = AuthStore::load(&path).await.unwrap();
        store
            .save(User {
                id: "u1".into(),
                name: "Mei".into(),
                email: "mei@example.test".into(),
            })
            .await
            .unwrap();

        let restored = AuthStore::load(&path).await.unwrap();
        assert_eq!(restored.current_user().map(|u| u.id.as_str()), Some("u1"));

        store.clear().await.unwrap();
        let cleared = AuthStore::load(&path).await.unwrap();
        assert!(cleared.current_user().is_none());
    }
}
