use lettre::SmtpTransport;
use lettre::transport::smtp::authentication::Credentials;

use crate::domain::account::Account;
use crate::error::{MailError, Result};

/// Outbound side. Only authentication is implemented; nothing is transmitted.
pub trait MailTransport: Send + Sync {
    fn authenticate(&self, account: &Account) -> Result<()>;
}

pub struct SmtpAuthOnly;

impl MailTransport for SmtpAuthOnly {
    fn authenticate(&self, account: &Account) -> Result<()> {
        let creds = Credentials::new(account.login_name().to_string(), account.password.clone());

        let mut builder = if account.smtp_use_ssl {
            SmtpTransport::relay(&account.smtp_host)
                .map_err(|e| MailError::Connection(format!("SMTP relay error: {e}")))?
        } else {
            SmtpTransport::builder_dangerous(&account.smtp_host)
        };
        if account.smtp_port != 0 {
            builder = builder.port(account.smtp_port);
        }
        let transport = builder.credentials(creds).build();

        match transport.test_connection() {
            Ok(true) => Ok(()),
            Ok(false) => Err(MailError::Connection(format!(
                "SMTP server {} did not answer",
                account.smtp_host
            ))),
            Err(e) if e.is_permanent() => Err(MailError::Authentication(e.to_string())),
            Err(e) => Err(MailError::Connection(e.to_string())),
        }
    }
}
