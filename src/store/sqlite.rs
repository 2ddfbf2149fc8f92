use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row, ToSql, Transaction, params};

use crate::domain::email::{Email, Uid, now_rfc3339};
use crate::error::{MailError, Result};
use crate::store::codec::{decode_addresses, encode_addresses};
use crate::store::repo::MailRepository;

const EMAIL_COLUMNS: &str = "id, account_id, folder, uid, from_addr, to_addresses, cc_addresses, \
     subject, date, body, is_read, is_starred, created_at, updated_at";

/// SQLite-backed cache. One lock guards the whole store; a rusqlite
/// connection is not `Sync`, so readers and writers both take it exclusively.
pub struct SqliteRepo {
    conn: Mutex<Connection>,
}

impl SqliteRepo {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |r| r.get(0))?;
        log::debug!("opened cache at {} (journal_mode={mode})", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.migrate()?;
        Ok(repo)
    }

    fn migrate(&self) -> Result<()> {
        self.conn().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS emails (
                id            TEXT PRIMARY KEY,
                account_id    TEXT NOT NULL,
                folder        TEXT NOT NULL,
                uid           INTEGER NOT NULL,
                from_addr     TEXT NOT NULL DEFAULT '',
                to_addresses  TEXT NOT NULL DEFAULT '',
                cc_addresses  TEXT NOT NULL DEFAULT '',
                subject       TEXT NOT NULL DEFAULT '',
                date          TEXT NOT NULL DEFAULT '',
                body          TEXT NOT NULL DEFAULT '',
                is_read       INTEGER NOT NULL DEFAULT 0,
                is_starred    INTEGER NOT NULL DEFAULT 0,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL,
                UNIQUE(account_id, folder, uid)
            );

            CREATE INDEX IF NOT EXISTS idx_emails_account_folder ON emails(account_id, folder);
            CREATE INDEX IF NOT EXISTS idx_emails_date ON emails(date DESC);
            CREATE INDEX IF NOT EXISTS idx_emails_is_read ON emails(is_read);
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn update_one(&self, id: &str, sql: &str, value: &dyn ToSql) -> Result<()> {
        let n = self.conn().execute(sql, params![value, now_rfc3339(), id])?;
        if n == 0 {
            return Err(MailError::NotFound(format!("email {id}")));
        }
        Ok(())
    }
}

fn insert_rows(tx: &Transaction<'_>, rows: &[Email]) -> Result<()> {
    let now = now_rfc3339();
    let mut stmt = tx.prepare(&format!(
        "INSERT OR REPLACE INTO emails ({EMAIL_COLUMNS}) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
    ))?;

    for e in rows {
        stmt.execute(params![
            e.id,
            e.account_id,
            e.folder,
            e.uid,
            e.from,
            encode_addresses(&e.to),
            encode_addresses(&e.cc),
            e.subject,
            e.date,
            e.body,
            e.is_read,
            e.is_starred,
            e.created_at,
            now,
        ])?;
    }
    Ok(())
}

fn row_to_email(r: &Row<'_>) -> rusqlite::Result<Email> {
    let to: String = r.get(5)?;
    let cc: String = r.get(6)?;
    Ok(Email {
        id: r.get(0)?,
        account_id: r.get(1)?,
        folder: r.get(2)?,
        uid: r.get(3)?,
        from: r.get(4)?,
        to: decode_addresses(&to),
        cc: decode_addresses(&cc),
        subject: r.get(7)?,
        date: r.get(8)?,
        body: r.get(9)?,
        is_read: r.get::<_, i64>(10)? == 1,
        is_starred: r.get::<_, i64>(11)? == 1,
        created_at: r.get(12)?,
        updated_at: r.get(13)?,
    })
}

impl MailRepository for SqliteRepo {
    fn upsert(&self, rows: &[Email]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        insert_rows(&tx, rows)?;
        tx.commit()?;
        Ok(())
    }

    fn replace_folder(&self, account_id: &str, folder: &str, rows: &[Email]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let purged = tx.execute(
            "DELETE FROM emails WHERE account_id = ?1 AND folder = ?2",
            params![account_id, folder],
        )?;
        insert_rows(&tx, rows)?;
        tx.commit()?;
        log::debug!(
            "replaced {account_id}/{folder}: purged {purged}, wrote {}",
            rows.len()
        );
        Ok(())
    }

    fn query(
        &self,
        account_id: &str,
        folder: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Email>> {
        // page_size 0 is unpaged; SQLite reads a negative LIMIT as no limit
        let (limit, offset) = if page_size == 0 {
            (-1, 0)
        } else {
            let offset = u64::from(page.max(1) - 1) * u64::from(page_size);
            (i64::from(page_size), i64::try_from(offset).unwrap_or(i64::MAX))
        };

        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EMAIL_COLUMNS} FROM emails \
             WHERE account_id = ?1 AND folder = ?2 \
             ORDER BY date DESC \
             LIMIT ?3 OFFSET ?4"
        ))?;

        let rows = stmt.query_map(params![account_id, folder, limit, offset], row_to_email)?;
        // One bad row fails the whole page.
        let out = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(out)
    }

    fn get_by_id(&self, id: &str) -> Result<Email> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {EMAIL_COLUMNS} FROM emails WHERE id = ?1"),
            params![id],
            row_to_email,
        )
        .optional()?
        .ok_or_else(|| MailError::NotFound(format!("email {id}")))
    }

    fn find_by_uid(&self, account_id: &str, folder: &str, uid: Uid) -> Result<Option<Email>> {
        let conn = self.conn();
        let found = conn
            .query_row(
                &format!(
                    "SELECT {EMAIL_COLUMNS} FROM emails \
                     WHERE account_id = ?1 AND folder = ?2 AND uid = ?3"
                ),
                params![account_id, folder, uid],
                row_to_email,
            )
            .optional()?;
        Ok(found)
    }

    fn update_body(&self, id: &str, body: &str) -> Result<()> {
        self.update_one(
            id,
            "UPDATE emails SET body = ?1, updated_at = ?2 WHERE id = ?3",
            &body,
        )
    }

    fn store_fetched_body(&self, id: &str, body: &str) -> Result<()> {
        self.update_one(
            id,
            "UPDATE emails SET body = ?1, is_read = 1, updated_at = ?2 WHERE id = ?3",
            &body,
        )
    }

    fn set_read(&self, id: &str) -> Result<()> {
        self.update_one(
            id,
            "UPDATE emails SET is_read = ?1, updated_at = ?2 WHERE id = ?3",
            &true,
        )
    }

    fn set_starred(&self, id: &str, starred: bool) -> Result<()> {
        self.update_one(
            id,
            "UPDATE emails SET is_starred = ?1, updated_at = ?2 WHERE id = ?3",
            &starred,
        )
    }

    fn purge(&self, account_id: &str, folder: &str) -> Result<()> {
        self.conn().execute(
            "DELETE FROM emails WHERE account_id = ?1 AND folder = ?2",
            params![account_id, folder],
        )?;
        Ok(())
    }

    fn count(&self, account_id: &str, folder: &str) -> Result<u64> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM emails WHERE account_id = ?1 AND folder = ?2",
            params![account_id, folder],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }
}
