mod session;
mod settings;

pub use session::{Role, Session, SessionUser, Viewer};
pub use settings::{ApiSettings, BillingSettings, Config, VisibilityPolicy};

use crate::error::{BillingError, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (XDG config dir, or ~/.aba-billing/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "aba-billing") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = dirs_home().ok_or_else(|| {
        BillingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".aba-billing"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn read_toml<T: DeserializeOwned>(path: PathBuf) -> Result<T> {
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| BillingError::ConfigParse { path, source: e })
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(BillingError::ConfigFileNotFound(path));
    }
    read_toml(path)
}

/// Load session.toml (empty session if missing)
pub fn load_session(config_dir: &Path) -> Result<Session> {
    let path = config_dir.join("session.toml");
    if !path.exists() {
        return Ok(Session::default());
    }
    read_toml(path)
}

/// Save session.toml
pub fn save_session(config_dir: &Path, session: &Session) -> Result<()> {
    let path = config_dir.join("session.toml");
    let content = toml::to_string_pretty(session).map_err(|e| BillingError::ConfigWrite {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    fs::write(path, content)?;
    Ok(())
}

/// Remove session.toml if present
pub fn clear_session(config_dir: &Path) -> Result<bool> {
    let path = config_dir.join("session.toml");
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path)?;
    Ok(true)
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[api]
base_url = "http://localhost:3000"
timeout_secs = 15

[billing]
currency = "EUR"
currency_symbol = "€"
# What a PAI viewer sees when the backend sends no ownership fields:
#   "fail-open"   -> the whole list (backend is trusted to scope it)
#   "fail-closed" -> nothing
visibility = "fail-open"
consultation_search_limit = 20
"#;
