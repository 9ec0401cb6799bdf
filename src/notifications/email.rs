use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{EmailMessage, EmailSender, NotificationError, PROVIDER_TIMEOUT};

/// Envío por una API HTTP de email transaccional (`POST {from, to, subject, text}`)
pub struct HttpEmailSender {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpEmailSender {
    pub fn new(api_url: String, api_key: String, from: String) -> Result<Self, NotificationError> {
        let client = Client::builder().timeout(PROVIDER_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [message.to],
                "subject": message.subject,
                "text": message.body,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(NotificationError::SendFailed(format!(
                "Email API returned non-success status: {}. Body: {}",
                status, error_body
            )));
        }

        tracing::info!("📧 Email enviado a {}: {}", message.to, message.subject);
        Ok(())
    }
}

/// Sin proveedor configurado: solo registra el mensaje en el log
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "📧 [log] email no enviado (sin proveedor configurado)\n{}",
            message.body
        );
        Ok(())
    }
}
