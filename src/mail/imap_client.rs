use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::mpsc::SyncSender;

use native_tls::TlsConnector;

use crate::domain::account::Account;
use crate::domain::email::{Envelope, Folder, FolderStatus, RawMessage, Uid};
use crate::error::{MailError, Result};
use crate::mail::decoders::{decode_subject, format_address, normalize_date};
use crate::mail::fetch::push;
use crate::mail::gateway::{MailGateway, MailSession};
use crate::sync::pagination::SeqWindow;

fn protocol(e: imap::Error) -> MailError {
    MailError::Protocol(e.to_string())
}

/// Dials the account's IMAP server (implicit TLS or plain TCP) and logs in.
pub struct ImapGateway;

impl MailGateway for ImapGateway {
    fn open_session(&self, account: &Account) -> Result<Box<dyn MailSession>> {
        let host = account.imap_host.as_str();
        let addr = (host, account.imap_port);

        if account.imap_use_ssl {
            let tls = TlsConnector::builder()
                .build()
                .map_err(|e| MailError::Connection(e.to_string()))?;
            let client =
                imap::connect(addr, host, &tls).map_err(|e| MailError::Connection(e.to_string()))?;
            login(client, account)
        } else {
            let tcp = TcpStream::connect(addr).map_err(|e| MailError::Connection(e.to_string()))?;
            let mut client = imap::Client::new(tcp);
            client
                .read_greeting()
                .map_err(|e| MailError::Connection(e.to_string()))?;
            login(client, account)
        }
    }
}

fn login<T>(client: imap::Client<T>, account: &Account) -> Result<Box<dyn MailSession>>
where
    T: Read + Write + Send + 'static,
{
    let session = client
        .login(account.login_name(), &account.password)
        .map_err(|(e, _client)| MailError::Authentication(e.to_string()))?;
    log::debug!("logged in to {} as {}", account.imap_host, account.login_name());
    Ok(Box::new(ImapSession { session }))
}

pub struct ImapSession<T: Read + Write> {
    session: imap::Session<T>,
}

impl<T> MailSession for ImapSession<T>
where
    T: Read + Write + Send,
{
    fn list_folders(&mut self) -> Result<Vec<Folder>> {
        let names: Vec<String> = self
            .session
            .list(Some(""), Some("*"))
            .map_err(protocol)?
            .iter()
            .map(|n| n.name().to_string())
            .collect();

        let mut folders = Vec::with_capacity(names.len());
        for name in names {
            let (unread, total) = match self.session.status(&name, "(MESSAGES UNSEEN)") {
                Ok(mb) => (mb.unseen.unwrap_or(0), mb.exists),
                Err(e) => {
                    log::warn!("STATUS {name} failed, reporting zero counts: {e}");
                    (0, 0)
                }
            };
            folders.push(Folder {
                name,
                unread,
                total,
            });
        }
        Ok(folders)
    }

    fn select_folder(&mut self, name: &str) -> Result<FolderStatus> {
        let mb = self.session.select(name).map_err(protocol)?;
        Ok(FolderStatus { exists: mb.exists })
    }

    fn fetch_envelopes(&mut self, window: SeqWindow, out: &SyncSender<Envelope>) -> Result<()> {
        let fetches = self
            .session
            .fetch(window.to_sequence_set(), "(UID ENVELOPE)")
            .map_err(protocol)?;
        for f in fetches.iter() {
            push(out, envelope_of(f))?;
        }
        Ok(())
    }

    fn fetch_full_message(&mut self, uid: Uid) -> Result<RawMessage> {
        let fetches = self
            .session
            .uid_fetch(uid.to_string(), "(UID ENVELOPE BODY.PEEK[])")
            .map_err(protocol)?;
        let f = fetches
            .iter()
            .next()
            .ok_or_else(|| MailError::NotFound(format!("message UID {uid}")))?;
        let raw = f
            .body()
            .ok_or_else(|| MailError::Protocol(format!("UID {uid}: server returned no body")))?
            .to_vec();

        let mut envelope = envelope_of(f);
        envelope.uid = f.uid.unwrap_or(uid);
        Ok(RawMessage { envelope, raw })
    }

    fn noop(&mut self) -> Result<()> {
        self.session.noop().map_err(protocol)
    }

    fn close(&mut self) -> Result<()> {
        self.session.logout().map_err(protocol)
    }
}

fn envelope_of(f: &imap::types::Fetch) -> Envelope {
    let mut out = Envelope {
        uid: f.uid.unwrap_or(0),
        ..Default::default()
    };
    let Some(env) = f.envelope() else {
        return out;
    };

    out.subject = env.subject.map(decode_subject).unwrap_or_default();
    out.date = env.date.map(normalize_date).unwrap_or_default();

    if let Some(froms) = env.from.as_ref() {
        out.from = froms
            .iter()
            .find_map(|a| format_address(a.mailbox, a.host))
            .unwrap_or_default();
    }
    if let Some(to) = env.to.as_ref() {
        out.to = to
            .iter()
            .filter_map(|a| format_address(a.mailbox, a.host))
            .collect();
    }
    if let Some(cc) = env.cc.as_ref() {
        out.cc = cc
            .iter()
            .filter_map(|a| format_address(a.mailbox, a.host))
            .collect();
    }
    out
}
