use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::domain::account::Account;
use crate::domain::email::now_rfc3339;
use crate::error::{MailError, Result};

/// Owns the id -> Account map and the JSON file it is persisted to.
pub struct AccountStore {
    path: PathBuf,
    accounts: RwLock<HashMap<String, Account>>,
}

impl AccountStore {
    /// Loads accounts from `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let accounts = load_accounts(&path)?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();
        Ok(Self {
            path,
            accounts: RwLock::new(accounts),
        })
    }

    pub fn list(&self) -> Vec<Account> {
        let map = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<Account> = map.values().cloned().collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        out
    }

    pub fn get(&self, id: &str) -> Result<Account> {
        let map = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        map.get(id)
            .cloned()
            .ok_or_else(|| MailError::NotFound(format!("account {id}")))
    }

    /// Inserts the account, assigning an id and creation time when empty.
    pub fn add(&self, mut account: Account) -> Result<Account> {
        if account.id.is_empty() {
            account.id = uuid::Uuid::new_v4().to_string();
        }
        if account.created_at.is_empty() {
            account.created_at = now_rfc3339();
        }

        let mut map = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        map.insert(account.id.clone(), account.clone());
        save_accounts(&self.path, &map)?;
        Ok(account)
    }

    pub fn update(&self, account: Account) -> Result<()> {
        let mut map = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        if !map.contains_key(&account.id) {
            return Err(MailError::NotFound(format!("account {}", account.id)));
        }
        map.insert(account.id.clone(), account);
        save_accounts(&self.path, &map)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let mut map = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        if map.remove(id).is_none() {
            return Err(MailError::NotFound(format!("account {id}")));
        }
        save_accounts(&self.path, &map)
    }
}

fn load_accounts(path: &Path) -> Result<Vec<Account>> {
    if !path.exists() {
        return Ok(vec![]);
    }
    let s = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&s)?)
}

// Caller holds the write lock.
fn save_accounts(path: &Path, map: &HashMap<String, Account>) -> Result<()> {
    let mut accounts: Vec<&Account> = map.values().collect();
    accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    let s = serde_json::to_string_pretty(&accounts)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, s)?;
    Ok(())
}
