use async_trait::async_trait;
use common::domain::{DomainError, DomainResult, User, UserRole};
use common::supabase::{format_instant, parse_instant};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Persisted form of the last known user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub created_at: String,
}

impl From<&User> for UserSnapshot {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            profile_image: user.profile_image.clone(),
            location: user.location.clone(),
            bio: user.bio.clone(),
            created_at: format_instant(&user.created_at),
        }
    }
}

impl TryFrom<UserSnapshot> for User {
    type Error = DomainError;

    fn try_from(snapshot: UserSnapshot) -> Result<Self, Self::Error> {
        let created_at = parse_instant(&snapshot.created_at).ok_or_else(|| {
            DomainError::SnapshotError(format!(
                "invalid createdAt '{}'",
                snapshot.created_at
            ))
        })?;

        Ok(User {
            id: snapshot.id,
            name: snapshot.name,
            email: snapshot.email,
            role: snapshot.role,
            profile_image: snapshot.profile_image,
            location: snapshot.location,
            bio: snapshot.bio,
            created_at,
        })
    }
}

/// Single named entry holding the user snapshot
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// `None` when nothing (readable) has been stored
    async fn load(&self) -> DomainResult<Option<UserSnapshot>>;

    async fn save(&self, snapshot: &UserSnapshot) -> DomainResult<()>;

    /// Removing a missing entry is not an error
    async fn clear(&self) -> DomainResult<()>;
}

/// Snapshot kept as a JSON file in a local directory
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(directory: impl AsRef<Path>, entry_name: &str) -> Self {
        Self {
            path: directory.as_ref().join(format!("{}.json", entry_name)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> DomainResult<Option<UserSnapshot>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DomainError::SnapshotError(e.to_string())),
        };

        match serde_json::from_str(&contents) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable user snapshot");
                Ok(None)
            }
        }
    }

    async fn save(&self, snapshot: &UserSnapshot) -> DomainResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::SnapshotError(e.to_string()))?;
        }

        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| DomainError::SnapshotError(e.to_string()))?;

        // Entry is replaced atomically
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, json)
            .await
            .map_err(|e| DomainError::SnapshotError(e.to_string()))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| DomainError::SnapshotError(e.to_string()))?;

        debug!(path = %self.path.display(), user_id = %snapshot.id, "user snapshot saved");
        Ok(())
    }

    async fn clear(&self) -> DomainResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "user snapshot removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::SnapshotError(e.to_string())),
        }
    }
}

/// Process-local store, for embedding without a writable directory
#[derive(Default)]
pub struct InMemorySnapshotStore {
    entry: Mutex<Option<UserSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: UserSnapshot) -> Self {
        Self {
            entry: Mutex::new(Some(snapshot)),
        }
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load(&self) -> DomainResult<Option<UserSnapshot>> {
        Ok(self.entry.lock().await.clone())
    }

    async fn save(&self, snapshot: &UserSnapshot) -> DomainResult<()> {
        *self.entry.lock().await = Some(snapshot.clone());
        Ok(())
    }

    async fn clear(&self) -> DomainResult<()> {
        *self.entry.lock().await = None;
        Ok(())
    }
}
