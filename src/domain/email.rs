use serde::{Deserialize, Serialize};

/// Cache-local identity. Regenerated on every live fetch, so only `uid` is a
/// durable join key for a remote message.
pub type EmailId = String;

/// Server-assigned identifier, stable within a folder across sessions.
pub type Uid = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: EmailId,
    pub account_id: String,
    pub folder: String,
    pub uid: Uid,
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    /// ISO-8601, UTC.
    pub date: String,
    /// Empty until backfilled.
    pub body: String,
    pub is_read: bool,
    pub is_starred: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Email {
    /// Builds a fresh row from envelope metadata. Gets a new id every time.
    pub fn from_envelope(account_id: &str, folder: &str, env: Envelope) -> Self {
        let now = now_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            folder: folder.to_string(),
            uid: env.uid,
            from: env.from,
            to: env.to,
            cc: env.cc,
            subject: env.subject,
            date: env.date,
            body: String::new(),
            is_read: false,
            is_starred: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Per-message summary metadata fetched without the body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    pub uid: Uid,
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub date: String,
}

/// Raw full message as returned by a UID fetch.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub envelope: Envelope,
    pub raw: Vec<u8>,
}

/// Never cached; recomputed from the server on every folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    pub unread: u32,
    pub total: u32,
}

/// Metadata returned by selecting a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderStatus {
    pub exists: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub account_id: String,
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub is_html: bool,
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
