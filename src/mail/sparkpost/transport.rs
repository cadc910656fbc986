use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{HttpTransmissionClient, Transmission, TransmissionClient};
use crate::config::Config;
use crate::error::{MailError, Result};
use crate::mail::{EventDispatcher, Message, SendListener, SendOutcome, SendResult, Transport};

/// Transport that delivers messages through the SparkPost transmissions API
pub struct SparkPostTransport<C = HttpTransmissionClient> {
    dispatcher: EventDispatcher,
    api_key: Option<String>,
    client: C,
}

impl SparkPostTransport {
    /// Transport against the public SparkPost endpoint. Set an API key before sending.
    pub fn new() -> Self {
        Self::with_client(HttpTransmissionClient::default())
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HttpTransmissionClient::new(&config.api_url, config.timeout())?;

        Ok(Self {
            dispatcher: EventDispatcher::new(),
            api_key: config.api_key.clone(),
            client,
        })
    }
}

impl Default for SparkPostTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TransmissionClient> SparkPostTransport<C> {
    pub fn with_client(client: C) -> Self {
        Self {
            dispatcher: EventDispatcher::new(),
            api_key: None,
            client,
        }
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> &mut Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }
}

#[async_trait]
impl<C: TransmissionClient> Transport for SparkPostTransport<C> {
    async fn send(&self, message: &Message) -> Result<SendOutcome> {
        let api_key = self.api_key.as_deref().ok_or(MailError::MissingApiKey)?;

        let mut event = self.dispatcher.create_send_event(message);
        self.dispatcher.dispatch_before_send(&mut event);
        if event.bubble_cancelled() {
            info!(subject = %message.subject(), "Send cancelled by listener");
            return Ok(SendOutcome::default());
        }

        let transmission = Transmission::from_message(message);

        debug!(
            recipients = transmission.recipients.len(),
            subject = %transmission.content.subject,
            "Sending transmission via SparkPost"
        );

        let response = self.client.post_transmission(api_key, &transmission).await?;

        let accepted = response.accepted();
        let rejected = response.rejected();

        let mut failed_recipients = Vec::new();
        if rejected > 0 {
            warn!(
                accepted,
                rejected,
                sender = %transmission.sender_email(),
                "SparkPost rejected recipients"
            );
            failed_recipients.push(transmission.sender_email().to_string());
        }

        event.set_result(if accepted > 0 {
            SendResult::Success
        } else {
            SendResult::Failed
        });
        event.set_failed_recipients(failed_recipients.clone());
        self.dispatcher.dispatch_send_performed(&event);

        Ok(SendOutcome {
            accepted,
            rejected,
            failed_recipients,
            response: Some(response.body),
        })
    }

    fn register_plugin(&mut self, plugin: Arc<dyn SendListener>) {
        self.dispatcher.bind_listener(plugin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::sparkpost::RecordingClient;

    fn test_message() -> Message {
        Message::builder()
            .from("sender@example.com")
            .to("user@example.com")
            .subject("Hi")
            .body("Hello")
            .build()
            .expect("Should build message")
    }

    #[test]
    fn test_api_key_accessors() {
        let mut transport = SparkPostTransport::with_client(RecordingClient::new());
        assert_eq!(transport.api_key(), None);

        transport.set_api_key("key-1").set_api_key("key-2");
        assert_eq!(transport.api_key(), Some("key-2"));
        assert!(!transport.is_started());
    }

    #[test]
    fn test_from_config_carries_key() {
        let config = Config {
            api_key: Some("secret".to_string()),
            ..Config::default()
        };

        let transport = SparkPostTransport::from_config(&config).expect("Should build transport");
        assert_eq!(transport.api_key(), Some("secret"));
        assert_eq!(
            transport.client().endpoint(),
            "https://api.sparkpost.com/api/v1/transmissions"
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let client = RecordingClient::new();
        let transport = SparkPostTransport::with_client(client.clone());

        let result = transport.send(&test_message()).await;

        assert!(matches!(result, Err(MailError::MissingApiKey)));
        assert_eq!(client.sent_count().await, 0);
    }

    #[test]
    fn test_register_plugin() {
        let mut transport = SparkPostTransport::with_client(RecordingClient::new());
        transport.register_plugin(Arc::new(crate::mail::TracingListener));

        assert_eq!(transport.dispatcher().listener_count(), 1);
    }
}
