use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::models::AuthLogin;

/// Everything the client remembers between launches: where the backend
/// lives and who is signed in. Components that need credentials take a
/// `&Session` explicitly; there is no ambient global to reach into.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Session {
    pub backend_url: String,
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // TOML is the current on-disk format; a JSON file from older builds is
    // converted on first load.
    fn toml_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("aarchid.toml"))
    }

    fn legacy_json_path() -> Option<PathBuf> {
        let proj = directories::ProjectDirs::from("com", "example", "Aarchid")?;
        Some(proj.config_dir().join("session.json"))
    }

    pub fn load() -> Self {
        Self::load_from(
            Self::toml_path().as_deref(),
            Self::legacy_json_path().as_deref(),
        )
    }

    /// Path-parameterized load so tests can point at a temp dir.
    pub fn load_from(toml_path: Option<&Path>, legacy_json: Option<&Path>) -> Self {
        if let Some(path) = toml_path {
            if let Ok(bytes) = fs::read(path) {
                if let Ok(text) = String::from_utf8(bytes) {
                    if let Ok(session) = toml::from_str::<Session>(&text) {
                        return session;
                    }
                }
            }
        }

        if let Some(legacy) = legacy_json {
            if let Ok(bytes) = fs::read(legacy) {
                if let Ok(session) = serde_json::from_slice::<Session>(&bytes) {
                    if let Some(path) = toml_path {
                        let _ = session.save_to(path);
                    }
                    return session;
                }
            }
        }

        Self::new()
    }

    pub fn save(&self) -> std::io::Result<()> {
        match Self::toml_path() {
            Some(path) => self.save_to(&path),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config dir",
            )),
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let toml = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        fs::write(path, toml)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user_id.is_some()
    }

    /// Adopt the credentials handed back by sign-in or registration. The
    /// caller decides when to persist.
    pub fn apply_login(&mut self, login: &AuthLogin) {
        self.token = Some(login.token.clone());
        self.user_id = Some(login.user.id.clone());
        self.email = Some(login.user.email.clone());
        log::info!("signed in as {}", login.user.email);
    }

    /// Sign out: drop the credentials, keep the backend URL.
    pub fn clear(&mut self) {
        self.token = None;
        self.user_id = None;
        self.email = None;
        log::info!("signed out");
    }
}
