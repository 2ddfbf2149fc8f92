use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MailError, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    pub db_path: Option<String>,
    pub accounts_path: Option<String>,
    pub page_size: Option<u32>,
}

impl Config {
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| MailError::NotFound("no config dir available".into()))?
        .join("wmail"))
}

fn in_config_dir(file: &str) -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push(file);
    Ok(p)
}

pub fn config_path() -> Result<PathBuf> {
    in_config_dir("config.toml")
}

/// Loads the config from the default location, writing a default file first
/// if none exists.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let cfg = Config::default();
        let tom = toml::to_string_pretty(&cfg).map_err(|e| MailError::Serialization(e.to_string()))?;
        fs::write(path, tom)?;
        log::info!("created default config at {}", path.display());
        return Ok(cfg);
    }
    let s = fs::read_to_string(path)?;
    toml::from_str(&s).map_err(|e| MailError::Serialization(e.to_string()))
}

pub fn resolve_db_path(cfg: &Config) -> Result<PathBuf> {
    match &cfg.db_path {
        Some(p) => Ok(PathBuf::from(p)),
        None => in_config_dir("emails.db"),
    }
}

pub fn resolve_accounts_path(cfg: &Config) -> Result<PathBuf> {
    match &cfg.accounts_path {
        Some(p) => Ok(PathBuf::from(p)),
        None => in_config_dir("accounts.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = load_config_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.page_size(), DEFAULT_PAGE_SIZE);
        assert!(cfg.db_path.is_none());
    }

    #[test]
    fn explicit_paths_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "db_path = \"/tmp/x.db\"\naccounts_path = \"/tmp/a.json\"\npage_size = 50\n",
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.page_size(), 50);
        assert_eq!(resolve_db_path(&cfg).unwrap(), PathBuf::from("/tmp/x.db"));
        assert_eq!(
            resolve_accounts_path(&cfg).unwrap(),
            PathBuf::from("/tmp/a.json")
        );
    }
}
