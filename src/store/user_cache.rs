//! Cached current user — the browser-local-storage analog. Read once at
//! startup as an optimistic hint; the auth provider's state stream is the
//! source of truth.

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::StoreError;

use super::AuthUser;

/// Location of the cached current-user JSON file.
#[derive(Debug, Clone)]
pub struct UserCache {
    path: PathBuf,
}

impl UserCache {
    /// Cache under the platform config directory.
    pub fn default_location() -> Option<Self> {
        let dirs = ProjectDirs::from("", "", "planboard")?;
        Some(Self {
            path: dirs.config_dir().join("current_user.json"),
        })
    }

    /// Cache at an explicit path (tests, embedded hosts).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the cached user. A corrupt file is removed and treated as absent.
    pub fn load(&self) -> Option<AuthUser> {
        let json = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&json) {
            Ok(user) => Some(user),
            Err(_) => {
                let _ = fs::remove_file(&self.path);
                None
            }
        }
    }

    /// Persist the signed-in user.
    pub fn save(&self, user: &AuthUser) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        let json =
            serde_json::to_string_pretty(user).map_err(|e| StoreError::Backend(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| StoreError::Backend(e.to_string()))
    }

    /// Remove the cached user.
    pub fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = UserCache::at(dir.path().join("current_user.json"));
        assert_eq!(cache.load(), None);

        let user = AuthUser {
            uid: "u1".to_string(),
            email: "alice@x.com".to_string(),
        };
        cache.save(&user).unwrap();
        assert_eq!(cache.load(), Some(user));

        cache.clear();
        assert_eq!(cache.load(), None);
    }

    #[test]
    fn corrupt_cache_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("current_user.json");
        fs::write(&path, "{not json").unwrap();
        let cache = UserCache::at(&path);
        assert_eq!(cache.load(), None);
        assert!(!path.exists());
    }
}
