//! Digest delivery over SMTP.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use scholarwatch_common::WatchError;
use scraper::{Html, Selector};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument};

pub const SUBJECT_PREFIX: &str = "Academic Watch Digest";

#[async_trait]
pub trait DigestMailer: Send + Sync {
    async fn send(&self, recipient: &str, date: &str, html: &str) -> Result<(), WatchError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    /// STARTTLS relay on `host:port`, authenticating as the sender address.
    pub fn new(
        host: &str,
        port: u16,
        sender_email: &str,
        password: &SecretString,
    ) -> Result<Self, WatchError> {
        let sender: Mailbox = sender_email
            .parse()
            .map_err(|e| WatchError::Mail(format!("invalid sender address {sender_email:?}: {e}")))?;
        let credentials = Credentials::new(
            sender_email.to_string(),
            password.expose_secret().to_string(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| WatchError::Mail(format!("SMTP relay {host}: {e}")))?
            .port(port)
            .credentials(credentials)
            .build();
        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl DigestMailer for SmtpMailer {
    #[instrument(skip(self, html))]
    async fn send(&self, recipient: &str, date: &str, html: &str) -> Result<(), WatchError> {
        let message = build_message(&self.sender, recipient, date, html)?;
        let response = self.transport
            .send(message)
            .await
            .map_err(|e| WatchError::Mail(e.to_string()))?;
        info!(code = %response.code(), "Digest email sent");
        Ok(())
    }
}

pub fn subject(date: &str) -> String {
    format!("{SUBJECT_PREFIX} - {date}")
}

/// `multipart/alternative` message: plain-text fallback first, HTML second.
pub fn build_message(
    sender: &Mailbox,
    recipient: &str,
    date: &str,
    html: &str,
) -> Result<Message, WatchError> {
    let to: Mailbox = recipient
        .parse()
        .map_err(|e| WatchError::Mail(format!("invalid recipient address {recipient:?}: {e}")))?;

    Message::builder()
        .from(sender.clone())
        .to(to)
        .subject(subject(date))
        .multipart(MultiPart::alternative_plain_html(plain_text(html), html.to_string()))
        .map_err(|e| WatchError::Mail(e.to_string()))
}

/// Visible text of the document body, one non-empty line per text run.
pub fn plain_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let text: Vec<&str> = match Selector::parse("body") {
        Ok(body) => document
            .select(&body)
            .flat_map(|el| el.text())
            .collect(),
        Err(_) => document.root_element().text().collect(),
    };
    text.iter()
        .flat_map(|t| t.lines())
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = "<html><head><style>.x { color: red; }</style></head>\
        <body><h1>Academic Watch Digest - 2026-10-19</h1><ul><li>Point   one</li></ul></body></html>";

    fn sender() -> Mailbox {
        "Digest Bot <bot@example.com>".parse().unwrap()
    }

    #[test]
    fn test_message_headers_and_parts() {
        let message = build_message(&sender(), "reader@example.org", "2026-10-19", HTML).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Academic Watch Digest - 2026-10-19"));
        assert!(raw.contains("From: \"Digest Bot\" <bot@example.com>") || raw.contains("From: Digest Bot <bot@example.com>"));
        assert!(raw.contains("To: reader@example.org"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn test_bad_recipient_is_mail_error() {
        let err = build_message(&sender(), "not an address", "2026-10-19", HTML).unwrap_err();
        assert!(matches!(err, WatchError::Mail(_)));
    }

    #[test]
    fn test_bad_sender_is_mail_error() {
        let password = SecretString::from("pw".to_string());
        let result = SmtpMailer::new("smtp.example.com", 587, "nobody", &password);
        assert!(matches!(result, Err(WatchError::Mail(_))));
    }

    #[tokio::test]
    async fn test_mailer_builds_for_valid_settings() {
        let password = SecretString::from("pw".to_string());
        assert!(SmtpMailer::new("smtp.example.com", 587, "bot@example.com", &password).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_mail_error() {
        let password = SecretString::from("pw".to_string());
        // Nothing listens on port 9 of the loopback interface.
        let mailer = SmtpMailer::new("localhost", 9, "bot@example.com", &password).unwrap();
        let result = mailer.send("reader@example.org", "2026-10-19", HTML).await;
        assert!(matches!(result, Err(WatchError::Mail(_))));
    }

    #[test]
    fn test_plain_text_skips_head() {
        let text = plain_text(HTML);
        assert_eq!(text, "Academic Watch Digest - 2026-10-19\nPoint   one");
        assert!(!text.contains("color"));
    }
}
