/// Session token persistence and routing guard
///
/// The web iteration of the dashboard kept the session token in a
/// cookie named `token`; the desktop client keeps the equivalent in a
/// file under the user's data directory:
/// - Linux: ~/.local/share/content-hub/token
/// - macOS: ~/Library/Application Support/content-hub/token
/// - Windows: %APPDATA%\content-hub\token
///
/// Lifecycle: written at login, removed at logout, read once at
/// startup by the routing guard in main.rs.

use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Session {
    token: Option<String>,
    path: PathBuf,
}

impl Session {
    /// Load the session from the default token file.
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load the session from an explicit path.
    pub fn load_from(path: PathBuf) -> Self {
        let token = match fs::read_to_string(&path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!("failed to read session token: {err}");
                None
            }
        };

        Session { token, path }
    }

    fn default_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("content-hub");
        path.push("token");
        path
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The routing guard: authenticated sessions land on the dashboard,
    /// everything else is sent to the login screen.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Persist a freshly issued token (login / verification success).
    pub fn store(&mut self, token: String) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, &token)?;
        self.token = Some(token);
        Ok(())
    }

    /// Drop the token (logout).
    pub fn clear(&mut self) -> io::Result<()> {
        self.token = None;
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_token_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("content-hub-test-{name}-{}", std::process::id()));
        path.push("token");
        path
    }

    #[test]
    fn test_missing_file_is_unauthenticated() {
        let session = Session::load_from(temp_token_path("missing"));
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_store_then_reload() {
        let path = temp_token_path("roundtrip");
        let mut session = Session::load_from(path.clone());
        session.store("abc123".to_string()).unwrap();
        assert!(session.is_authenticated());

        let reloaded = Session::load_from(path.clone());
        assert_eq!(reloaded.token(), Some("abc123"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_clear_removes_token() {
        let path = temp_token_path("clear");
        let mut session = Session::load_from(path.clone());
        session.store("tok".to_string()).unwrap();
        session.clear().unwrap();
        assert!(!session.is_authenticated());

        let reloaded = Session::load_from(path);
        assert!(!reloaded.is_authenticated());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut session = Session::load_from(temp_token_path("idempotent"));
        assert!(session.clear().is_ok());
        assert!(session.clear().is_ok());
    }
}
