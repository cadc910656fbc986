//! SparkPost transmission payload and the mapping from [`Message`].

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::mail::message::{Mailbox, Message, Part, TEXT_HTML, TEXT_PLAIN};

pub const LIST_UNSUBSCRIBE_HEADER: &str = "List-Unsubscribe";
pub const INLINE_CSS_HEADER: &str = "X-MC-InlineCSS";
pub const TAGS_HEADER: &str = "X-MC-Tags";

const SUPPORTED_CONTENT_TYPES: [&str; 2] = [TEXT_PLAIN, TEXT_HTML];

/// `POST /api/v1/transmissions` request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transmission {
    pub recipients: Vec<Recipient>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_css: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub content: Content,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<TransmissionAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&Mailbox> for Address {
    fn from(mailbox: &Mailbox) -> Self {
        Self {
            email: mailbox.email.clone(),
            name: mailbox.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub from: Address,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmissionAttachment {
    #[serde(rename = "type")]
    pub content_type: String,
    pub name: String,
    /// Base64 encoded file contents
    pub data: String,
}

impl Transmission {
    /// Map a message onto the transmission schema.
    ///
    /// The message is not re-validated: a message without a from address maps to
    /// an empty sender.
    pub fn from_message(message: &Message) -> Self {
        let mut html = None;
        let mut text = None;

        match primary_content_type(message) {
            TEXT_PLAIN => text = Some(message.body().to_string()),
            _ => html = Some(message.body().to_string()),
        }

        let mut attachments = Vec::new();
        for child in message.children() {
            match child {
                Part::Attachment(attachment) => attachments.push(TransmissionAttachment {
                    content_type: attachment.content_type.clone(),
                    name: attachment.filename.clone(),
                    data: STANDARD.encode(&attachment.body),
                }),
                Part::Alternative(part) => match mime_essence(&part.content_type).as_str() {
                    TEXT_HTML => html = Some(part.body.clone()),
                    TEXT_PLAIN => text = Some(part.body.clone()),
                    _ => {}
                },
            }
        }

        let headers = message.headers();

        let mut extra_headers = BTreeMap::new();
        if let Some(value) = headers.get(LIST_UNSUBSCRIBE_HEADER) {
            extra_headers.insert(LIST_UNSUBSCRIBE_HEADER.to_string(), value.to_string());
        }

        Self {
            recipients: message
                .to()
                .iter()
                .map(|m| Recipient { address: m.into() })
                .collect(),
            cc: message.cc().iter().map(Address::from).collect(),
            bcc: message.bcc().iter().map(Address::from).collect(),
            reply_to: message.reply_to().last().map(Mailbox::to_string),
            headers: extra_headers,
            inline_css: headers.get(INLINE_CSS_HEADER).map(parse_flag),
            tags: headers.get(TAGS_HEADER).map(parse_tags).unwrap_or_default(),
            content: Content {
                from: message.sender().map(Address::from).unwrap_or_else(|| Address {
                    email: String::new(),
                    name: None,
                }),
                subject: message.subject().to_string(),
                html,
                text,
            },
            attachments,
        }
    }

    pub fn sender_email(&self) -> &str {
        &self.content.from.email
    }
}

/// Supported declared types are kept; anything else is rendered as HTML.
fn primary_content_type(message: &Message) -> &'static str {
    let essence = mime_essence(message.content_type());
    SUPPORTED_CONTENT_TYPES
        .iter()
        .find(|supported| **supported == essence)
        .copied()
        .unwrap_or(TEXT_HTML)
}

/// `type/subtype` without parameters, lower-cased.
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn parse_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}
