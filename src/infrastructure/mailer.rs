use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::domain::notification::{DeliveryError, Notification};
use crate::domain::ports::Notifier;

#[derive(Debug, Serialize)]
struct OutgoingMail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Delivers mail by posting it to an HTTP mail relay.
pub struct MailRelayNotifier {
    client: Client,
    url: String,
    token: Option<String>,
    from: String,
}

impl MailRelayNotifier {
    pub fn new(url: String, token: Option<String>, from: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            url,
            token,
            from,
        })
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let failed = |reason: String| DeliveryError {
            to: notification.to.clone(),
            reason,
        };

        let mut request = self.client.post(&self.url).json(&OutgoingMail {
            from: &self.from,
            to: &notification.to,
            subject: &notification.subject,
            text: &notification.body,
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("relay answered {}", response.status())));
        }
        log::debug!("Mail to {} accepted by relay", notification.to);
        Ok(())
    }
}

/// Writes notifications to the log; used when no mail relay is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        log::info!(
            "Mail to {}: {} | {}",
            notification.to,
            notification.subject,
            notification.body
        );
        Ok(())
    }
}
