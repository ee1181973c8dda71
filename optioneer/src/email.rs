//! Email service for quote confirmations and team notifications.
//!
//! Delivery is best-effort by design: quote persistence is the durable fact,
//! and handlers dispatch these sends fire-and-forget, logging failures
//! without surfacing them to the caller.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::path::Path;

use crate::{config::Config, errors::Error};

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
    dashboard_url: String,
    team_notifications_to: Option<String>,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let email_config = &config.email;

        let transport = match &email_config.transport {
            crate::config::EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(smtp_builder.build())
            }
            crate::config::EmailTransportConfig::File { path } => {
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: email_config.from_email.clone(),
            from_name: email_config.from_name.clone(),
            dashboard_url: config.dashboard_url.clone(),
            team_notifications_to: email_config.team_notifications_to.clone(),
        })
    }

    /// Confirmation to the customer who submitted the quote, carrying the
    /// shareable quote code.
    pub async fn send_quote_confirmation(
        &self,
        to_email: &str,
        to_name: Option<&str>,
        quote_code: &str,
        total_display: &str,
    ) -> Result<(), Error> {
        let quote_link = format!("{}/quote/{}", self.dashboard_url, quote_code);
        let subject = format!("Your quote {quote_code}");
        let body = self.create_quote_confirmation_body(to_name, quote_code, total_display, &quote_link);

        self.send_email(to_email, to_name, &subject, &body).await
    }

    /// Internal heads-up about a new quote. Silently a no-op when no team
    /// address is configured.
    pub async fn send_team_notification(&self, quote_code: &str, customer_email: &str, total_display: &str) -> Result<(), Error> {
        let Some(team_address) = self.team_notifications_to.clone() else {
            return Ok(());
        };

        let subject = format!("New quote {quote_code}");
        let body = format!(
            "<p>A new quote was submitted.</p>\
             <p>Code: <strong>{quote_code}</strong><br>\
             Customer: {customer_email}<br>\
             Total: {total_display}</p>"
        );

        self.send_email(&team_address, None, &subject, &body).await
    }

    async fn send_email(&self, to_email: &str, to_name: Option<&str>, subject: &str, body: &str) -> Result<(), Error> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal {
                operation: format!("parse from email: {e}"),
            })?;

        let to = if let Some(name) = to_name {
            format!("{name} <{to_email}>")
        } else {
            to_email.to_string()
        }
        .parse::<Mailbox>()
        .map_err(|e| Error::Internal {
            operation: format!("parse to email: {e}"),
        })?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| Error::Internal {
                operation: format!("build email message: {e}"),
            })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        Ok(())
    }

    fn create_quote_confirmation_body(&self, to_name: Option<&str>, quote_code: &str, total_display: &str, quote_link: &str) -> String {
        let greeting = if let Some(name) = to_name {
            format!("Hello {name},")
        } else {
            "Hello,".to_string()
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Your Quote</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .code {{ font-size: 18px; font-weight: bold; }}
        .footer {{ margin-top: 30px; font-size: 12px; color: #666; }}
    </style>
</head>
<body>
    <div class="container">
        <h2>Thanks for your request</h2>

        <p>{greeting}</p>

        <p>We received your configuration and prepared a quote totalling
        <strong>{total_display}</strong>.</p>

        <p>Your quote code is <span class="code">{quote_code}</span>.
        You can review the quote any time at
        <a href="{quote_link}">{quote_link}</a>.</p>

        <div class="footer">
            <p>This email was sent because a quote was requested with this
            address. If that wasn't you, you can ignore it.</p>
        </div>
    </div>
</body>
</html>"#
        )
    }
}
