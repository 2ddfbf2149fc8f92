use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use wmail::accounts::AccountStore;
use wmail::config::{Config, load_config, resolve_accounts_path, resolve_db_path};
use wmail::domain::account::Account;
use wmail::domain::email::SendRequest;
use wmail::mail::imap_client::ImapGateway;
use wmail::mail::smtp::SmtpAuthOnly;
use wmail::store::sqlite::SqliteRepo;
use wmail::sync::engine::SyncEngine;

#[derive(Parser)]
#[command(name = "wmail")]
#[command(about = "Local-first mail backend (cache + IMAP sync)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage configured accounts
    Accounts {
        #[command(subcommand)]
        cmd: AccountsCommand,
    },

    #[command(flatten)]
    Mail(MailCommand),
}

/// Commands that go through the sync engine.
#[derive(Subcommand)]
enum MailCommand {
    /// List server folders with unread/total counts
    Folders { account: String },

    /// List one page of a folder (cache first)
    List {
        account: String,
        #[arg(default_value = "INBOX")]
        folder: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Defaults to the configured page size
        #[arg(long)]
        page_size: Option<u32>,
        /// Bypass the cache and replace it from the server
        #[arg(long)]
        refresh: bool,
    },

    /// Show one message with its body
    Show {
        account: String,
        folder: String,
        uid: u32,
    },

    /// Print a cached message by its local id
    Cached { id: String },

    /// Cache state of a folder: empty, refreshing or cached
    State { account: String, folder: String },

    /// Star or unstar a cached message
    Star {
        id: String,
        #[arg(long)]
        off: bool,
    },

    /// Mark a cached message as read
    MarkRead { id: String },

    /// Check that the account can log in
    Test { account: String },

    /// Authenticate to the SMTP server (content is not transmitted)
    Send {
        account: String,
        #[arg(long, required = true)]
        to: Vec<String>,
        #[arg(long)]
        cc: Vec<String>,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
    },
}

#[derive(Subcommand)]
enum AccountsCommand {
    List,
    Add {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        imap_host: String,
        #[arg(long, default_value_t = 993)]
        imap_port: u16,
        #[arg(long)]
        imap_plain: bool,
        #[arg(long, default_value = "")]
        smtp_host: String,
        #[arg(long, default_value_t = 465)]
        smtp_port: u16,
        #[arg(long)]
        smtp_plain: bool,
        #[arg(long, default_value = "")]
        username: String,
        /// Read from WMAIL_PASSWORD when omitted
        #[arg(long)]
        password: Option<String>,
    },
    Remove {
        id: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_accounts(accounts: &AccountStore, cmd: AccountsCommand) -> Result<()> {
    match cmd {
        AccountsCommand::List => {
            let mut list = accounts.list();
            for a in &mut list {
                a.password.clear();
            }
            print_json(&list)
        }
        AccountsCommand::Add {
            email,
            name,
            imap_host,
            imap_port,
            imap_plain,
            smtp_host,
            smtp_port,
            smtp_plain,
            username,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => std::env::var("WMAIL_PASSWORD")
                    .context("no --password given and WMAIL_PASSWORD not set")?,
            };
            let added = accounts.add(Account {
                name,
                email,
                imap_host,
                imap_port,
                imap_use_ssl: !imap_plain,
                smtp_host,
                smtp_port,
                smtp_use_ssl: !smtp_plain,
                username,
                password,
                ..Default::default()
            })?;
            println!("{}", added.id);
            Ok(())
        }
        AccountsCommand::Remove { id } => Ok(accounts.remove(&id)?),
    }
}

fn open_engine(cfg: &Config, accounts: Arc<AccountStore>) -> Result<SyncEngine> {
    let db_path = resolve_db_path(cfg)?;
    let repo = SqliteRepo::open(&db_path)
        .with_context(|| format!("opening cache at {}", db_path.display()))?;
    Ok(SyncEngine::new(
        accounts,
        Arc::new(repo),
        Arc::new(ImapGateway),
        Arc::new(SmtpAuthOnly),
    ))
}

fn run_mail(engine: &SyncEngine, cfg: &Config, cmd: MailCommand) -> Result<()> {
    match cmd {
        MailCommand::Folders { account } => print_json(&engine.list_folders(&account)?),
        MailCommand::List {
            account,
            folder,
            page,
            page_size,
            refresh,
        } => {
            let size = page_size.unwrap_or_else(|| cfg.page_size());
            let emails = engine.get_message_list(&account, &folder, page, size, refresh)?;
            print_json(&emails)
        }
        MailCommand::Show {
            account,
            folder,
            uid,
        } => print_json(&engine.get_message(&account, &folder, uid)?),
        MailCommand::Cached { id } => print_json(&engine.get_cached(&id)?),
        MailCommand::State { account, folder } => {
            print_json(&engine.folder_state(&account, &folder)?)
        }
        MailCommand::Star { id, off } => Ok(engine.set_starred(&id, !off)?),
        MailCommand::MarkRead { id } => Ok(engine.mark_read(&id)?),
        MailCommand::Test { account } => {
            engine.test_connection(&account)?;
            println!("ok");
            Ok(())
        }
        MailCommand::Send {
            account,
            to,
            cc,
            subject,
            body,
        } => {
            engine.send_email(&SendRequest {
                account_id: account,
                to,
                cc,
                subject,
                body,
                ..Default::default()
            })?;
            println!("authenticated; message not transmitted");
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let cfg = load_config().context("Configuration error")?;
    let accounts = Arc::new(AccountStore::open(resolve_accounts_path(&cfg)?)?);

    match cli.cmd {
        Command::Accounts { cmd } => run_accounts(&accounts, cmd),
        Command::Mail(cmd) => {
            let engine = open_engine(&cfg, accounts)?;
            run_mail(&engine, &cfg, cmd)
        }
    }
}
