//! Remitentes en memoria para tests.
//!
//! Registran cada mensaje y pueden simular fallos por destinatario o por
//! contenido.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{EmailMessage, EmailSender, NotificationError, SmsSender};

#[derive(Debug, Clone, Default)]
pub struct MockEmailSender {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    failing_recipients: Arc<Mutex<Vec<String>>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Los envíos a este destinatario fallarán
    pub fn fail_for(&self, recipient: &str) {
        lock(&self.failing_recipients).push(recipient.to_string());
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        lock(&self.sent).clone()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<EmailMessage> {
        self.sent().into_iter().filter(|m| m.to == recipient).collect()
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        if lock(&self.failing_recipients).contains(&message.to) {
            return Err(NotificationError::SendFailed(format!(
                "mock failure for {}",
                message.to
            )));
        }
        lock(&self.sent).push(message.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockSmsSender {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    failing_fragments: Arc<Mutex<Vec<String>>>,
}

impl MockSmsSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Los mensajes cuyo texto contenga `fragment` fallarán
    pub fn fail_when_body_contains(&self, fragment: &str) {
        lock(&self.failing_fragments).push(fragment.to_string());
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl SmsSender for MockSmsSender {
    async fn send(&self, to: &str, body: &str) -> Result<(), NotificationError> {
        if lock(&self.failing_fragments).iter().any(|f| body.contains(f.as_str())) {
            return Err(NotificationError::SendFailed("mock SMS failure".to_string()));
        }
        lock(&self.sent).push((to.to_string(), body.to_string()));
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
