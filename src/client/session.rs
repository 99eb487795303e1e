use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use super::ClientError;
use crate::models::UserProfile;

/// Logged-in client state: the bearer token and the user it was issued for.
///
/// Persisted as a single JSON file with an explicit lifecycle: `load` at start,
/// `save` after login or registration, `clear` on logout or a rejected token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl Session {
    /// Reads a saved session. A missing file means "not logged in".
    pub fn load(path: &Path) -> Result<Option<Session>, ClientError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ClientError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Removes the saved session; clearing an absent session is not an error.
    pub fn clear(path: &Path) -> Result<(), ClientError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
