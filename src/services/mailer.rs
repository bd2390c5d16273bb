// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Outbound mail over SMTP (STARTTLS relay).

use crate::config::SmtpConfig;
use crate::error::AppError;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// Connect and command timeout for SMTP sessions.
pub const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
struct Transport {
    smtp: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
    port: u16,
}

/// Mail sender. Constructed even without SMTP settings; sending then fails
/// with a configuration error.
#[derive(Clone, Default)]
pub struct Mailer {
    transport: Option<Transport>,
}

impl Mailer {
    pub fn from_config(config: Option<&SmtpConfig>) -> Result<Self, AppError> {
        let Some(config) = config else {
            tracing::info!("SMTP not configured, outbound mail disabled");
            return Ok(Self::default());
        };

        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| AppError::Smtp(format!("invalid SMTP_FROM: {}", e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Smtp(e.to_string()))?
            .port(config.port)
            .timeout(Some(SMTP_TIMEOUT));

        if let (Some(user), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: Some(Transport {
                smtp: builder.build(),
                from,
                host: config.host.clone(),
                port: config.port,
            }),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    fn transport(&self) -> Result<&Transport, AppError> {
        self.transport
            .as_ref()
            .ok_or(AppError::Misconfigured("SMTP_HOST"))
    }

    /// Send the password reset link.
    pub async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        reset_link: &str,
    ) -> Result<(), AppError> {
        let transport = self.transport()?;
        let to: Mailbox = to
            .parse()
            .map_err(|e| AppError::Smtp(format!("invalid recipient: {}", e)))?;

        let body = format!(
            "Hi {name},\n\n\
             Someone asked to reset the password for your PE Yoga account.\n\
             Use the link below within the next hour to choose a new one:\n\n\
             {reset_link}\n\n\
             If this wasn't you, you can ignore this email.\n"
        );

        let message = Message::builder()
            .from(transport.from.clone())
            .to(to)
            .subject("Reset your PE Yoga password")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::Smtp(e.to_string()))?;

        transport
            .smtp
            .send(message)
            .await
            .map_err(|e| AppError::Smtp(e.to_string()))?;

        tracing::info!("Password reset email sent");
        Ok(())
    }

    /// Open a session with the relay and report where it lives.
    pub async fn test_connection(&self) -> Result<(String, u16), AppError> {
        let transport = self.transport()?;

        let ok = tokio::time::timeout(SMTP_TIMEOUT, transport.smtp.test_connection())
            .await
            .map_err(|_| AppError::Smtp("connection timed out".to_string()))?
            .map_err(|e| AppError::Smtp(e.to_string()))?;

        if !ok {
            return Err(AppError::Smtp("server did not accept the connection".to_string()));
        }

        Ok((transport.host.clone(), transport.port))
    }
}
