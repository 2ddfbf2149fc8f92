use std::sync::Arc;

use crate::accounts::AccountStore;
use crate::domain::email::{Email, Folder, SendRequest, Uid};
use crate::error::Result;
use crate::mail::fetch::drain_bounded;
use crate::mail::gateway::{MailGateway, ScopedSession};
use crate::mail::mime::extract_body;
use crate::mail::smtp::MailTransport;
use crate::store::repo::MailRepository;
use crate::sync::pagination::sequence_window;
use crate::sync::state::{FolderState, RefreshTracker};

/// Cache-first access to remote folders.
///
/// Once a folder has any cached rows, the cache is authoritative for list
/// reads until a caller forces a refresh; there is no TTL. A refresh purges
/// the folder and replaces it with the page just fetched.
pub struct SyncEngine {
    accounts: Arc<AccountStore>,
    cache: Arc<dyn MailRepository>,
    gateway: Arc<dyn MailGateway>,
    transport: Arc<dyn MailTransport>,
    refreshing: RefreshTracker,
}

impl SyncEngine {
    pub fn new(
        accounts: Arc<AccountStore>,
        cache: Arc<dyn MailRepository>,
        gateway: Arc<dyn MailGateway>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            accounts,
            cache,
            gateway,
            transport,
            refreshing: RefreshTracker::default(),
        }
    }

    /// One page of a folder, newest first.
    pub fn get_message_list(
        &self,
        account_id: &str,
        folder: &str,
        page: u32,
        page_size: u32,
        force_refresh: bool,
    ) -> Result<Vec<Email>> {
        log::debug!(
            "list {account_id}/{folder} page={page} size={page_size} force={force_refresh}"
        );

        if !force_refresh {
            let cached = self.cache.count(account_id, folder)?;
            if cached > 0 {
                log::debug!("serving {account_id}/{folder} from cache ({cached} rows)");
                return self.cache.query(account_id, folder, page, page_size);
            }
        }

        let account = self.accounts.get(account_id)?;
        let _refresh = self.refreshing.begin(account_id, folder);
        let mut session = ScopedSession::open(self.gateway.as_ref(), &account)?;

        let status = session.select_folder(folder)?;
        if status.exists == 0 {
            log::info!("{account_id}/{folder} is empty on the server");
            return Ok(vec![]);
        }

        let Some(window) = sequence_window(status.exists, page, page_size) else {
            log::debug!(
                "page {page} is past the end of {folder} ({} messages)",
                status.exists
            );
            return Ok(vec![]);
        };
        log::debug!("fetching {folder} sequence {}", window.to_sequence_set());

        let envelopes = drain_bounded(window.size() as usize, |tx| {
            session.fetch_envelopes(window, tx)
        })?;
        drop(session);

        let mut emails: Vec<Email> = envelopes
            .into_iter()
            .map(|env| Email::from_envelope(account_id, folder, env))
            .collect();
        // Server order is not trusted to be date order.
        emails.sort_by(|a, b| b.date.cmp(&a.date));

        if !emails.is_empty() {
            match self.cache.replace_folder(account_id, folder, &emails) {
                Ok(()) => log::info!("cached {} emails for {account_id}/{folder}", emails.len()),
                Err(e) => log::warn!("caching {account_id}/{folder} failed: {e}"),
            }
        }
        Ok(emails)
    }

    /// One message with its body, backfilling the cached row if there is one.
    pub fn get_message(&self, account_id: &str, folder: &str, uid: Uid) -> Result<Email> {
        if let Some(hit) = self.cache.find_by_uid(account_id, folder, uid)?
            && !hit.body.is_empty()
        {
            log::debug!("body for {folder}/{uid} served from cache ({})", hit.id);
            return Ok(hit);
        }

        let account = self.accounts.get(account_id)?;
        let raw = {
            let mut session = ScopedSession::open(self.gateway.as_ref(), &account)?;
            session.select_folder(folder)?;
            session.fetch_full_message(uid)?
        };
        let body = extract_body(&raw.raw)?;

        let mut email = Email::from_envelope(account_id, folder, raw.envelope);
        email.uid = uid;
        email.body = body;
        email.is_read = true;
        log::debug!("fetched {folder}/{uid}, body length {}", email.body.len());

        // A failed write-back still returns the fetched message.
        match self.cache.find_by_uid(account_id, folder, uid) {
            Ok(Some(row)) => {
                email.id = row.id;
                email.is_starred = row.is_starred;
                email.created_at = row.created_at;
                if let Err(e) = self.cache.store_fetched_body(&email.id, &email.body) {
                    log::warn!("backfill of {folder}/{uid} ({}) failed: {e}", email.id);
                }
            }
            Ok(None) => log::debug!("{folder}/{uid} not cached, nothing to backfill"),
            Err(e) => log::warn!("backfill lookup for {folder}/{uid} failed: {e}"),
        }

        Ok(email)
    }

    /// Folder list with counts, straight from the server.
    pub fn list_folders(&self, account_id: &str) -> Result<Vec<Folder>> {
        let account = self.accounts.get(account_id)?;
        let mut session = ScopedSession::open(self.gateway.as_ref(), &account)?;
        session.list_folders()
    }

    pub fn test_connection(&self, account_id: &str) -> Result<()> {
        let account = self.accounts.get(account_id)?;
        let mut session = ScopedSession::open(self.gateway.as_ref(), &account)?;
        session.noop()
    }

    /// Authenticates against the account's SMTP server and reports success.
    /// Message content is not transmitted.
    pub fn send_email(&self, req: &SendRequest) -> Result<()> {
        let account = self.accounts.get(&req.account_id)?;
        log::warn!(
            "send for {}: transmission is not implemented, authenticating only ({} recipients)",
            account.id,
            req.to.len() + req.cc.len() + req.bcc.len()
        );
        self.transport.authenticate(&account)
    }

    pub fn get_cached(&self, id: &str) -> Result<Email> {
        self.cache.get_by_id(id)
    }

    pub fn mark_read(&self, id: &str) -> Result<()> {
        self.cache.set_read(id)
    }

    pub fn set_starred(&self, id: &str, starred: bool) -> Result<()> {
        self.cache.set_starred(id, starred)
    }

    pub fn folder_state(&self, account_id: &str, folder: &str) -> Result<FolderState> {
        if self.refreshing.is_refreshing(account_id, folder) {
            return Ok(FolderState::Refreshing);
        }
        Ok(match self.cache.count(account_id, folder)? {
            0 => FolderState::Empty,
            _ => FolderState::Cached,
        })
    }
}
