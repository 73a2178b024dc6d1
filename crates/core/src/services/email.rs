//! Outgoing mail over SMTP.

use blog_common::{AppError, AppResult, config::EmailConfig};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

#[derive(Clone)]
struct Smtp {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

/// Email service.
///
/// Without SMTP settings every message is written to the log instead.
#[derive(Clone)]
pub struct EmailService {
    smtp: Option<Smtp>,
}

impl EmailService {
    /// Create a new email service.
    pub fn new(config: Option<&EmailConfig>) -> AppResult<Self> {
        let Some(config) = config else {
            return Ok(Self { smtp: None });
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Config(format!("Invalid SMTP host: {e}")))?
            .port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let address = config
            .from_address
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid sender address: {e}")))?;

        Ok(Self {
            smtp: Some(Smtp {
                transport: builder.build(),
                from: Mailbox::new(Some(config.from_name.clone()), address),
            }),
        })
    }

    /// Check if SMTP delivery is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.smtp.is_some()
    }

    /// Mail a password-recovery code.
    pub async fn send_verification_code(&self, to: &str, code: &str) -> AppResult<()> {
        let body = format!(
            "Your verification code is: {code}\n\n\
             If you did not ask to reset your password, ignore this email."
        );
        self.send(to, "Your verification code", body).await
    }

    /// Mail a password-reset link.
    pub async fn send_reset_link(&self, to: &str, link: &str) -> AppResult<()> {
        let body = format!(
            "Open the link below to choose a new password:\n\n{link}\n"
        );
        self.send(to, "Reset your password", body).await
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> AppResult<()> {
        let Some(smtp) = &self.smtp else {
            info!(to = %to, subject = %subject, body = %body, "SMTP not configured, logging email");
            return Ok(());
        };

        let message = compose(&smtp.from, to, subject, body)?;
        smtp.transport
            .send(message)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP delivery failed: {e}")))?;

        info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

fn compose(from: &Mailbox, to: &str, subject: &str, body: String) -> AppResult<Message> {
    let to: Mailbox = to
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid email address: {to}")))?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build email: {e}")))
}
