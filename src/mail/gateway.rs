use std::ops::{Deref, DerefMut};
use std::sync::mpsc::SyncSender;

use crate::domain::account::Account;
use crate::domain::email::{Envelope, Folder, FolderStatus, RawMessage, Uid};
use crate::error::Result;
use crate::sync::pagination::SeqWindow;

/// One authenticated connection to a mailbox server.
pub trait MailSession: Send {
    /// Every mailbox with unread/total counts. A failed status query for one
    /// mailbox yields zero counts for that mailbox only.
    fn list_folders(&mut self) -> Result<Vec<Folder>>;

    fn select_folder(&mut self, name: &str) -> Result<FolderStatus>;

    /// Pushes envelopes for the inclusive sequence range into `out`, in
    /// whatever order the server returns them.
    fn fetch_envelopes(&mut self, window: SeqWindow, out: &SyncSender<Envelope>) -> Result<()>;

    /// Full message addressed by UID in the selected folder.
    fn fetch_full_message(&mut self, uid: Uid) -> Result<RawMessage>;

    fn noop(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

/// Opens sessions. Stateless between calls; nothing is pooled.
pub trait MailGateway: Send + Sync {
    fn open_session(&self, account: &Account) -> Result<Box<dyn MailSession>>;
}

/// Session that is closed when it goes out of scope, on every exit path.
pub struct ScopedSession {
    inner: Box<dyn MailSession>,
}

impl ScopedSession {
    pub fn open(gateway: &dyn MailGateway, account: &Account) -> Result<Self> {
        log::debug!("opening session for {} ({})", account.id, account.imap_host);
        Ok(Self {
            inner: gateway.open_session(account)?,
        })
    }
}

impl Deref for ScopedSession {
    type Target = dyn MailSession;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for ScopedSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        if let Err(e) = self.inner.close() {
            log::warn!("closing session failed: {e}");
        }
    }
}
