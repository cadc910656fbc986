//! Mail message model handed to a transport.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MailError, Result};

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";

/// An address with an optional display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Mailbox {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            email: email.into(),
            name: (!name.trim().is_empty()).then_some(name),
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => f.write_str(&self.email),
        }
    }
}

/// Parses `"Name <email>"` or a bare address.
impl FromStr for Mailbox {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || MailError::InvalidAddress(s.to_string());

        let mailbox = match s.rfind('<') {
            Some(open) => {
                let email = s[open + 1..].strip_suffix('>').ok_or_else(invalid)?.trim();
                let name = s[..open].trim().trim_matches('"');
                Mailbox::with_name(email, name)
            }
            None => Mailbox::new(s),
        };

        if !is_plausible_address(&mailbox.email) {
            return Err(invalid());
        }

        Ok(mailbox)
    }
}

impl From<&str> for Mailbox {
    fn from(email: &str) -> Self {
        Mailbox::new(email)
    }
}

impl From<String> for Mailbox {
    fn from(email: String) -> Self {
        Mailbox::new(email)
    }
}

impl<E: Into<String>, N: Into<String>> From<(E, N)> for Mailbox {
    fn from((email, name): (E, N)) -> Self {
        Mailbox::with_name(email, name)
    }
}

fn is_plausible_address(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !email.chars().any(|c| c.is_whitespace() || c == '<' || c == '>')
        }
        None => false,
    }
}

/// Ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any existing header with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.0.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A file attached to the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// An alternative rendering of the body, e.g. an HTML part next to a plain-text body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MimePart {
    pub content_type: String,
    pub body: String,
}

/// Child entity of a message, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Part {
    Attachment(Attachment),
    Alternative(MimePart),
}

/// A complete email message ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    from: Vec<Mailbox>,
    to: Vec<Mailbox>,
    #[serde(default)]
    cc: Vec<Mailbox>,
    #[serde(default)]
    bcc: Vec<Mailbox>,
    #[serde(default)]
    reply_to: Vec<Mailbox>,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    body: String,
    /// Declared type of the top-level body, independent of any child parts.
    #[serde(default = "default_content_type")]
    content_type: String,
    #[serde(default)]
    children: Vec<Part>,
    #[serde(default)]
    headers: Headers,
}

fn default_content_type() -> String {
    TEXT_PLAIN.to_string()
}

impl Message {
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    pub fn from(&self) -> &[Mailbox] {
        &self.from
    }

    pub fn to(&self) -> &[Mailbox] {
        &self.to
    }

    pub fn cc(&self) -> &[Mailbox] {
        &self.cc
    }

    pub fn bcc(&self) -> &[Mailbox] {
        &self.bcc
    }

    pub fn reply_to(&self) -> &[Mailbox] {
        &self.reply_to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn children(&self) -> &[Part] {
        &self.children
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The address the message is sent from. Only the first from address counts.
    pub fn sender(&self) -> Option<&Mailbox> {
        self.from.first()
    }

    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }
}

/// Builder for constructing [`Message`] instances.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    from: Vec<Mailbox>,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    reply_to: Vec<Mailbox>,
    subject: Option<String>,
    body: Option<String>,
    content_type: Option<String>,
    children: Vec<Part>,
    headers: Headers,
}

impl MessageBuilder {
    pub fn from(mut self, address: impl Into<Mailbox>) -> Self {
        upsert(&mut self.from, address.into());
        self
    }

    pub fn to(mut self, address: impl Into<Mailbox>) -> Self {
        upsert(&mut self.to, address.into());
        self
    }

    pub fn to_many(mut self, addresses: impl IntoIterator<Item = impl Into<Mailbox>>) -> Self {
        for address in addresses {
            upsert(&mut self.to, address.into());
        }
        self
    }

    pub fn cc(mut self, address: impl Into<Mailbox>) -> Self {
        upsert(&mut self.cc, address.into());
        self
    }

    pub fn bcc(mut self, address: impl Into<Mailbox>) -> Self {
        upsert(&mut self.bcc, address.into());
        self
    }

    pub fn reply_to(mut self, address: impl Into<Mailbox>) -> Self {
        upsert(&mut self.reply_to, address.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the top-level body. The content type defaults to `text/plain`.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a `text/plain` alternative part.
    pub fn text(self, text: impl Into<String>) -> Self {
        self.part(TEXT_PLAIN, text)
    }

    /// Add a `text/html` alternative part.
    pub fn html(self, html: impl Into<String>) -> Self {
        self.part(TEXT_HTML, html)
    }

    pub fn part(mut self, content_type: impl Into<String>, body: impl Into<String>) -> Self {
        self.children.push(Part::Alternative(MimePart {
            content_type: content_type.into(),
            body: body.into(),
        }));
        self
    }

    pub fn attach(
        mut self,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.children.push(Part::Attachment(Attachment {
            filename: filename.into(),
            content_type: content_type.into(),
            body: body.into(),
        }));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Build the message, validating required fields.
    pub fn build(self) -> Result<Message> {
        if self.from.is_empty() {
            return Err(MailError::Build("from address required".into()));
        }

        if self.to.is_empty() {
            return Err(MailError::Build("at least one recipient required".into()));
        }

        if let Some(bad) = self
            .from
            .iter()
            .chain(&self.to)
            .chain(&self.cc)
            .chain(&self.bcc)
            .chain(&self.reply_to)
            .find(|m| !is_plausible_address(&m.email))
        {
            return Err(MailError::InvalidAddress(bad.email.clone()));
        }

        Ok(Message {
            from: self.from,
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            reply_to: self.reply_to,
            subject: self.subject.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            content_type: self.content_type.unwrap_or_else(default_content_type),
            children: self.children,
            headers: self.headers,
        })
    }
}

/// Address lists behave like maps keyed by email: re-adding updates the name in place.
fn upsert(list: &mut Vec<Mailbox>, mailbox: Mailbox) {
    match list.iter_mut().find(|m| m.email == mailbox.email) {
        Some(existing) => existing.name = mailbox.name,
        None => list.push(mailbox),
    }
}
