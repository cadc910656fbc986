pub mod config;
pub mod error;
pub mod mail;

pub use config::Config;
pub use error::{MailError, Result};
pub use mail::{Mailbox, Message, SendOutcome, SparkPostTransport, Transport};
