//! Persisted cookie jar.
//!
//! # Design
//! - A missing or unreadable blob restores an empty session; it is never an error.
//! - The blob is JSON so it can be inspected and revoked by hand.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gaffer_core::{Session, StoredCookie};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PortalError, PortalResult};

/// Storage for the session between process runs.
pub trait CredentialStore: Send + Sync {
    /// Load the stored session, or an empty one when nothing usable is stored.
    fn restore(&self) -> Session;

    /// Store the session's cookies.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written.
    fn persist(&self, session: &Session) -> PortalResult<()>;
}

/// On-disk form of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// When the blob was written.
    pub saved_at: DateTime<Utc>,
    /// Captured cookies.
    pub cookies: Vec<StoredCookie>,
}

/// Session blob kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store backed by `path`; parent directories are created on first persist.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    fn restore(&self) -> Session {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored session");
                return Session::new();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "stored session unreadable");
                return Session::new();
            }
        };
        match serde_json::from_str::<PersistedSession>(&text) {
            Ok(stored) => {
                debug!(
                    path = %self.path.display(),
                    cookies = stored.cookies.len(),
                    saved_at = %stored.saved_at,
                    "restored stored session"
                );
                Session::from_cookies(stored.cookies)
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "stored session is corrupt; ignoring");
                Session::new()
            }
        }
    }

    fn persist(&self, session: &Session) -> PortalResult<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PortalError::Io {
                operation: "credentials.create_dir",
                path: Some(parent.to_path_buf()),
                source,
            })?;
        }
        let blob = PersistedSession {
            saved_at: Utc::now(),
            cookies: session.cookies().to_vec(),
        };
        let json = serde_json::to_vec_pretty(&blob).map_err(|source| PortalError::Json {
            operation: "credentials.encode",
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| PortalError::Io {
            operation: "credentials.write",
            path: Some(self.path.clone()),
            source,
        })?;
        restrict_permissions(&self.path)?;
        info!(path = %self.path.display(), cookies = blob.cookies.len(), "session persisted");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> PortalResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|source| {
        PortalError::Io {
            operation: "credentials.chmod",
            path: Some(path.to_path_buf()),
            source,
        }
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> PortalResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaffer_core::{SessionEvent, SessionState};
    use std::error::Error;
    use tempfile::TempDir;

    #[test]
    fn missing_blob_restores_empty_session() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let store = FileCredentialStore::new(dir.path().join("session.json"));
        let session = store.restore();
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(!session.has_cookies());
        Ok(())
    }

    #[test]
    fn corrupt_blob_restores_empty_session() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let path = dir.path().join("session.json");
        fs::write(&path, b"\x80\x04pickle")?;
        assert!(!FileCredentialStore::new(&path).restore().has_cookies());
        fs::write(&path, "{\"cookies\": 3}")?;
        assert!(!FileCredentialStore::new(&path).restore().has_cookies());
        Ok(())
    }

    #[test]
    fn persisted_cookies_come_back_unauthenticated() -> Result<(), Box<dyn Error>> {
        let dir = TempDir::new()?;
        let store = FileCredentialStore::new(dir.path().join("profile").join("session.json"));
        let mut session = Session::from_cookies(vec![
            StoredCookie::new("sid", "abc").with_domain(".portal.example"),
        ]);
        session.apply(SessionEvent::LoginSucceeded);
        store.persist(&session)?;

        let restored = store.restore();
        assert_eq!(restored.cookies(), session.cookies());
        assert_eq!(restored.state(), SessionState::Unauthenticated);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn blob_is_private_to_the_owner() -> Result<(), Box<dyn Error>> {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new()?;
        let path = dir.path().join("session.json");
        let store = FileCredentialStore::new(&path);
        store.persist(&Session::new())?;
        let mode = fs::metadata(&path)?.permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        Ok(())
    }
}
