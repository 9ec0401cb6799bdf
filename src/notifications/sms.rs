use async_trait::async_trait;
use reqwest::Client;

use super::{NotificationError, SmsSender, PROVIDER_TIMEOUT};
use crate::config::SmsProviderConfig;

/// Envío de SMS por la API REST de Twilio (form-encoded + basic auth)
pub struct TwilioSmsSender {
    client: Client,
    config: SmsProviderConfig,
}

impl TwilioSmsSender {
    pub fn new(config: SmsProviderConfig) -> Result<Self, NotificationError> {
        let client = Client::builder().timeout(PROVIDER_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send(&self, to: &str, body: &str) -> Result<(), NotificationError> {
        let params = [("To", to), ("From", self.config.from.as_str()), ("Body", body)];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(NotificationError::SendFailed(format!(
                "SMS API returned non-success status: {}. Body: {}",
                status, error_body
            )));
        }

        tracing::info!("📱 SMS enviado a {}", to);
        Ok(())
    }
}

/// Sin proveedor de SMS: registra el mensaje y lo reporta como no enviado
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, to: &str, body: &str) -> Result<(), NotificationError> {
        tracing::warn!(to = %to, "📱 [log] SMS no enviado (sin proveedor configurado): {}", body);
        Err(NotificationError::InvalidConfiguration(
            "No SMS provider configured".to_string(),
        ))
    }
}
