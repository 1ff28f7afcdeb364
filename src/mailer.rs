use std::fs;
use std::path::{Path, PathBuf};

use lettre::address::AddressError;
use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::info;
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid email address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: AddressError,
    },
    #[error("unable to build message: {0}")]
    Message(String),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

pub struct Mailer {
    server: String,
    port: u16,
    sender: String,
    password: String,
}

impl Mailer {
    pub fn new(server: &str, port: u16, sender: &str, password: &str) -> Self {
        Self {
            server: server.to_string(),
            port,
            sender: sender.to_string(),
            password: password.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig, sender: &str, password: &str) -> Self {
        Self::new(&config.smtp_server, config.smtp_port, sender, password)
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Mails `path` as an attachment over STARTTLS.
    pub fn send_file(&self, path: &Path, recipient: &str) -> Result<(), MailError> {
        let message = self.build_message(path, recipient)?;
        let transport = SmtpTransport::starttls_relay(&self.server)?
            .port(self.port)
            .credentials(Credentials::new(self.sender.clone(), self.password.clone()))
            .build();
        transport.send(&message)?;
        info!("email sent to {recipient}");
        Ok(())
    }

    pub fn build_message(&self, path: &Path, recipient: &str) -> Result<Message, MailError> {
        if !path.is_file() {
            return Err(MailError::MissingFile(path.to_path_buf()));
        }
        let contents = fs::read(path).map_err(|source| MailError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment.txt".to_string());

        let content_type = ContentType::parse("application/octet-stream")
            .map_err(|err| MailError::Message(err.to_string()))?;
        let body = MultiPart::mixed()
            .singlepart(SinglePart::plain(format!("Attached is the file: {filename}")))
            .singlepart(Attachment::new(filename.clone()).body(contents, content_type));

        Message::builder()
            .from(parse_mailbox(&self.sender)?)
            .to(parse_mailbox(recipient)?)
            .subject(format!("Text File: {filename}"))
            .multipart(body)
            .map_err(|err| MailError::Message(err.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.trim().parse().map_err(|source| MailError::Address {
        address: address.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailer() -> Mailer {
        Mailer::new("smtp.example.com", 587, "me@example.com", "app-password")
    }

    #[test]
    fn builds_message_with_attachment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("output.txt");
        fs::write(&path, "1. Entrepreneurship Forum\n").expect("write output");

        let message = mailer()
            .build_message(&path, "friend@example.com")
            .expect("message");
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();

        assert!(raw.contains("Subject: Text File: output.txt"));
        assert!(raw.contains("To: friend@example.com"));
        assert!(raw.contains("Attached is the file: output.txt"));
        assert!(raw.contains("application/octet-stream"));
        assert!(raw.contains("output.txt\""));
    }

    #[test]
    fn missing_file_fails_before_connecting() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("output.txt");

        let err = mailer()
            .send_file(&path, "friend@example.com")
            .expect_err("no file");

        assert!(matches!(err, MailError::MissingFile(p) if p == path));
    }

    #[test]
    fn rejects_malformed_recipient() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("output.txt");
        fs::write(&path, "picks").expect("write output");

        let err = mailer()
            .build_message(&path, "not an address")
            .expect_err("bad address");

        assert!(matches!(err, MailError::Address { .. }));
    }
}
