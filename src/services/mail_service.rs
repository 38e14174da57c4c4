// src/services/mail_service.rs

use futures::future::BoxFuture;
use futures::FutureExt;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde_json::json;
use thiserror::Error;

const SUBJECT: &str = "AnonBox | Verification Code";
const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected the email with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("mail task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Delivers verification codes to users.
pub trait VerificationMailer: Send + Sync {
    fn send_verification<'a>(
        &'a self,
        email: &'a str,
        username: &'a str,
        code: &'a str,
    ) -> BoxFuture<'a, Result<(), MailError>>;
}

/// The HTML body shared by every mailer.
pub fn verification_email_html(username: &str, code: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en" dir="ltr">
  <head><title>Verification Code</title></head>
  <body style="font-family: Roboto, Verdana, sans-serif; padding: 20px;">
    <h2>Hello {username},</h2>
    <p>Thank you for registering. Please use the following verification code to complete your registration:</p>
    <h3 style="color: #4D55CC;">{code}</h3>
    <p>If you did not request this code, please ignore this email.</p>
  </body>
</html>"#
    )
}

/// Sends through the Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(client: reqwest::Client, api_key: String, from: String) -> Self {
        Self {
            client,
            api_key,
            from,
        }
    }
}

impl VerificationMailer for ResendMailer {
    fn send_verification<'a>(
        &'a self,
        email: &'a str,
        username: &'a str,
        code: &'a str,
    ) -> BoxFuture<'a, Result<(), MailError>> {
        async move {
            let response = self
                .client
                .post(RESEND_ENDPOINT)
                .bearer_auth(&self.api_key)
                .json(&json!({
                    "from": self.from,
                    "to": [email],
                    "subject": SUBJECT,
                    "html": verification_email_html(username, code),
                }))
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(MailError::Rejected {
                    status: status.as_u16(),
                    body,
                });
            }
            log::info!("Verification email sent to {}", email);
            Ok(())
        }
        .boxed()
    }
}

/// Sends over SMTP with STARTTLS.
pub struct SmtpMailer {
    server: String,
    port: u16,
    credentials: Credentials,
    from: String,
}

impl SmtpMailer {
    pub fn new(server: String, port: u16, username: String, password: String, from: String) -> Self {
        Self {
            server,
            port,
            credentials: Credentials::new(username, password),
            from,
        }
    }
}

impl VerificationMailer for SmtpMailer {
    fn send_verification<'a>(
        &'a self,
        email: &'a str,
        username: &'a str,
        code: &'a str,
    ) -> BoxFuture<'a, Result<(), MailError>> {
        async move {
            let email_message = Message::builder()
                .from(self.from.parse()?)
                .to(email.parse()?)
                .subject(SUBJECT)
                .header(ContentType::TEXT_HTML)
                .body(verification_email_html(username, code))?;

            let mailer = SmtpTransport::starttls_relay(&self.server)?
                .port(self.port)
                .credentials(self.credentials.clone())
                .build();

            // lettre's SmtpTransport is blocking.
            tokio::task::spawn_blocking(move || mailer.send(&email_message)).await??;
            log::info!("Verification email sent to {}", email);
            Ok(())
        }
        .boxed()
    }
}
