//! In-process stand-ins for the mail server and SMTP endpoint.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::account::Account;
use crate::domain::email::{Email, Envelope, Folder, FolderStatus, RawMessage, Uid};
use crate::error::{MailError, Result};
use crate::mail::fetch::push;
use crate::mail::gateway::{MailGateway, MailSession};
use crate::mail::smtp::MailTransport;
use crate::store::repo::MailRepository;
use crate::store::sqlite::SqliteRepo;
use crate::sync::pagination::SeqWindow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open,
    ListFolders,
    Select(String),
    FetchEnvelopes(u32, u32),
    FetchFull(Uid),
    Noop,
    Close,
}

struct Message {
    envelope: Envelope,
    raw: Vec<u8>,
}

#[derive(Default)]
struct ServerState {
    // folder -> messages in sequence order
    folders: BTreeMap<String, Vec<Message>>,
    status_failures: HashSet<String>,
    calls: Vec<Call>,
}

/// Scripted mailbox server that records every call made against it.
#[derive(Default)]
pub struct FakeServer {
    state: Mutex<ServerState>,
    reject_login: AtomicBool,
    reverse_order: AtomicBool,
}

impl FakeServer {
    pub fn gateway(self: &Arc<Self>) -> Arc<dyn MailGateway> {
        Arc::new(FakeGateway(self.clone()))
    }

    fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }

    pub fn add_folder(&self, name: &str) {
        self.state().folders.entry(name.to_string()).or_default();
    }

    /// Appends `n` messages. The message at sequence number `s` has UID
    /// `1000 + s` and a date that increases with `s`.
    pub fn add_messages(&self, folder: &str, n: u32) {
        let mut st = self.state();
        let msgs = st.folders.entry(folder.to_string()).or_default();
        for _ in 0..n {
            let seq = msgs.len() as u32 + 1;
            let uid = 1000 + seq;
            let envelope = Envelope {
                uid,
                from: format!("sender{uid}@example.com"),
                to: vec!["me@example.com".into()],
                cc: vec![],
                subject: format!("Subject {uid}"),
                date: format!(
                    "2024-{:02}-{:02}T{:02}:00:00Z",
                    1 + seq / 600,
                    1 + (seq / 24) % 25,
                    seq % 24
                ),
            };
            let raw = format!(
                "From: sender{uid}@example.com\r\nSubject: Subject {uid}\r\n\
                 Content-Type: text/plain\r\n\r\nBody of message {uid}\r\nsecond line\r\n"
            )
            .into_bytes();
            msgs.push(Message { envelope, raw });
        }
    }

    pub fn push_message(&self, folder: &str, envelope: Envelope, raw: Vec<u8>) {
        self.state()
            .folders
            .entry(folder.to_string())
            .or_default()
            .push(Message { envelope, raw });
    }

    pub fn fail_status_for(&self, folder: &str) {
        self.state().status_failures.insert(folder.to_string());
    }

    pub fn reject_login(&self, on: bool) {
        self.reject_login.store(on, Ordering::SeqCst);
    }

    pub fn reverse_fetch_order(&self, on: bool) {
        self.reverse_order.store(on, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

struct FakeGateway(Arc<FakeServer>);

impl MailGateway for FakeGateway {
    fn open_session(&self, _account: &Account) -> Result<Box<dyn MailSession>> {
        self.0.record(Call::Open);
        if self.0.reject_login.load(Ordering::SeqCst) {
            return Err(MailError::Authentication("LOGIN rejected".into()));
        }
        Ok(Box::new(FakeSession {
            server: self.0.clone(),
            selected: None,
        }))
    }
}

struct FakeSession {
    server: Arc<FakeServer>,
    selected: Option<String>,
}

impl FakeSession {
    fn selected(&self) -> Result<String> {
        self.selected
            .clone()
            .ok_or_else(|| MailError::Protocol("no folder selected".into()))
    }
}

impl MailSession for FakeSession {
    fn list_folders(&mut self) -> Result<Vec<Folder>> {
        self.server.record(Call::ListFolders);
        let st = self.server.state();
        let folders = st
            .folders
            .iter()
            .map(|(name, msgs)| {
                let n = if st.status_failures.contains(name) {
                    0
                } else {
                    msgs.len() as u32
                };
                Folder {
                    name: name.clone(),
                    unread: n,
                    total: n,
                }
            })
            .collect();
        Ok(folders)
    }

    fn select_folder(&mut self, name: &str) -> Result<FolderStatus> {
        self.server.record(Call::Select(name.to_string()));
        let exists = self
            .server
            .state()
            .folders
            .get(name)
            .map(|m| m.len() as u32)
            .ok_or_else(|| MailError::Protocol(format!("SELECT {name}: no such mailbox")))?;
        self.selected = Some(name.to_string());
        Ok(FolderStatus { exists })
    }

    fn fetch_envelopes(&mut self, window: SeqWindow, out: &SyncSender<Envelope>) -> Result<()> {
        self.server.record(Call::FetchEnvelopes(window.lo, window.hi));
        let folder = self.selected()?;
        let mut envs: Vec<Envelope> = self.server.state().folders[&folder]
            [(window.lo - 1) as usize..window.hi as usize]
            .iter()
            .map(|m| m.envelope.clone())
            .collect();
        if self.server.reverse_order.load(Ordering::SeqCst) {
            envs.reverse();
        }
        for env in envs {
            push(out, env)?;
        }
        Ok(())
    }

    fn fetch_full_message(&mut self, uid: Uid) -> Result<RawMessage> {
        self.server.record(Call::FetchFull(uid));
        let folder = self.selected()?;
        let found = self.server.state().folders[&folder]
            .iter()
            .find(|m| m.envelope.uid == uid)
            .map(|m| RawMessage {
                envelope: m.envelope.clone(),
                raw: m.raw.clone(),
            });
        found.ok_or_else(|| MailError::NotFound(format!("message UID {uid}")))
    }

    fn noop(&mut self) -> Result<()> {
        self.server.record(Call::Noop);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.server.record(Call::Close);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTransport {
    auths: AtomicUsize,
}

impl FakeTransport {
    pub fn auth_count(&self) -> usize {
        self.auths.load(Ordering::SeqCst)
    }
}

impl MailTransport for FakeTransport {
    fn authenticate(&self, _account: &Account) -> Result<()> {
        self.auths.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Cache whose single-row updates can be made to fail on demand.
pub struct FlakyWrites {
    inner: Arc<SqliteRepo>,
    fail: AtomicBool,
}

impl FlakyWrites {
    pub fn new(inner: Arc<SqliteRepo>) -> Self {
        Self {
            inner,
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail_updates(&self, on: bool) {
        self.fail.store(on, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Cache(rusqlite::Error::InvalidQuery));
        }
        Ok(())
    }
}

impl MailRepository for FlakyWrites {
    fn upsert(&self, rows: &[Email]) -> Result<()> {
        self.inner.upsert(rows)
    }

    fn replace_folder(&self, account_id: &str, folder: &str, rows: &[Email]) -> Result<()> {
        self.inner.replace_folder(account_id, folder, rows)
    }

    fn query(
        &self,
        account_id: &str,
        folder: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Email>> {
        self.inner.query(account_id, folder, page, page_size)
    }

    fn get_by_id(&self, id: &str) -> Result<Email> {
        self.inner.get_by_id(id)
    }

    fn find_by_uid(&self, account_id: &str, folder: &str, uid: Uid) -> Result<Option<Email>> {
        self.inner.find_by_uid(account_id, folder, uid)
    }

    fn update_body(&self, id: &str, body: &str) -> Result<()> {
        self.check()?;
        self.inner.update_body(id, body)
    }

    fn store_fetched_body(&self, id: &str, body: &str) -> Result<()> {
        self.check()?;
        self.inner.store_fetched_body(id, body)
    }

    fn set_read(&self, id: &str) -> Result<()> {
        self.check()?;
        self.inner.set_read(id)
    }

    fn set_starred(&self, id: &str, starred: bool) -> Result<()> {
        self.check()?;
        self.inner.set_starred(id, starred)
    }

    fn purge(&self, account_id: &str, folder: &str) -> Result<()> {
        self.inner.purge(account_id, folder)
    }

    fn count(&self, account_id: &str, folder: &str) -> Result<u64> {
        self.inner.count(account_id, folder)
    }
}
