use serde::{Deserialize, Serialize};

/// Connection and auth parameters for one mail account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub imap_host: String,
    pub imap_port: u16,
    #[serde(alias = "imapUseSSL")]
    pub imap_use_ssl: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    #[serde(alias = "smtpUseSSL")]
    pub smtp_use_ssl: bool,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

impl Account {
    /// Login name; the email address unless an explicit username is set.
    pub fn login_name(&self) -> &str {
        if self.username.is_empty() {
            &self.email
        } else {
            &self.username
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_name_falls_back_to_email() {
        let mut acc = Account {
            email: "me@example.com".into(),
            ..Default::default()
        };
        assert_eq!(acc.login_name(), "me@example.com");

        acc.username = "me".into();
        assert_eq!(acc.login_name(), "me");
    }

    #[test]
    fn deserializes_camel_case_with_missing_fields() {
        let acc: Account = serde_json::from_str(
            r#"{"id":"a1","email":"x@y.com","imapHost":"imap.y.com","imapPort":993,"imapUseSsl":true}"#,
        )
        .unwrap();
        assert_eq!(acc.imap_host, "imap.y.com");
        assert_eq!(acc.imap_port, 993);
        assert!(acc.imap_use_ssl);
        assert!(acc.smtp_host.is_empty());

        let legacy: Account = serde_json::from_str(r#"{"id":"a2","smtpUseSSL":true}"#).unwrap();
        assert!(legacy.smtp_use_ssl);
    }
}
