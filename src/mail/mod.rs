//! Mail transports.
//!
//! A [`Transport`] takes a fully built [`Message`] and hands it to a delivery
//! backend, notifying any registered [`SendListener`]s before and after the send.
//! The only backend shipped here is SparkPost:
//!
//! ```ignore
//! let mut transport = SparkPostTransport::from_config(&Config::from_env()?)?;
//! transport.register_plugin(Arc::new(TracingListener));
//!
//! let message = Message::builder()
//!     .from(("noreply@example.com", "Example"))
//!     .to("user@example.com")
//!     .subject("Welcome!")
//!     .body("Thanks for joining.")
//!     .build()?;
//!
//! let outcome = transport.send(&message).await?;
//! ```

pub mod events;
pub mod message;
pub mod sparkpost;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

pub use events::{EventDispatcher, SendEvent, SendListener, SendResult, TracingListener};
pub use message::{Attachment, Headers, Mailbox, Message, MessageBuilder, MimePart, Part};
pub use sparkpost::SparkPostTransport;

/// What a transport reports back for one message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOutcome {
    /// Recipients the backend accepted
    pub accepted: u64,
    pub rejected: u64,
    pub failed_recipients: Vec<String>,
    /// Raw backend response; `None` when the send was cancelled by a listener
    pub response: Option<serde_json::Value>,
}

impl SendOutcome {
    pub fn is_success(&self) -> bool {
        self.accepted > 0
    }
}

/// Delivery backend contract
#[async_trait]
pub trait Transport: Send + Sync {
    /// HTTP transports have no connection to manage.
    fn is_started(&self) -> bool {
        false
    }

    fn start(&mut self) {}

    fn stop(&mut self) {}

    async fn send(&self, message: &Message) -> Result<SendOutcome>;

    fn register_plugin(&mut self, plugin: Arc<dyn SendListener>);
}
