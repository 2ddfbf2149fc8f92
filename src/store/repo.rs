use crate::domain::email::{Email, Uid};
use crate::error::Result;

/// Per-account, per-folder message cache.
///
/// Rows are unique by (account_id, folder, uid); writing a duplicate triple
/// replaces the existing row.
pub trait MailRepository: Send + Sync {
    /// All rows commit or none do.
    fn upsert(&self, rows: &[Email]) -> Result<()>;

    /// Purge the folder and write `rows` in one transaction.
    fn replace_folder(&self, account_id: &str, folder: &str, rows: &[Email]) -> Result<()>;

    /// Newest first. Page 0 behaves like page 1.
    fn query(&self, account_id: &str, folder: &str, page: u32, page_size: u32)
    -> Result<Vec<Email>>;

    fn get_by_id(&self, id: &str) -> Result<Email>;
    fn find_by_uid(&self, account_id: &str, folder: &str, uid: Uid) -> Result<Option<Email>>;

    fn update_body(&self, id: &str, body: &str) -> Result<()>;
    /// Body write-back: sets the body and marks the row read in one statement.
    fn store_fetched_body(&self, id: &str, body: &str) -> Result<()>;
    fn set_read(&self, id: &str) -> Result<()>;
    fn set_starred(&self, id: &str, starred: bool) -> Result<()>;

    fn purge(&self, account_id: &str, folder: &str) -> Result<()>;
    fn count(&self, account_id: &str, folder: &str) -> Result<u64>;
}
