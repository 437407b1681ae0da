use anyhow::Result;
use serde::Deserialize;

use crate::domain::email::{EmailSummary, NO_SUBJECT, UNKNOWN_SENDER};
use crate::domain::{Entry, degrade};
use crate::google::{GoogleSession, send_json};
use crate::mail::mime::{MimePart, NO_TEXT_BODY, extract_plain_text_body};

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    payload: Option<Payload>,
}

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(flatten)]
    part: MimePart,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

/// Case-sensitive exact header lookup.
fn header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.as_str())
}

pub struct GmailClient<'a> {
    session: &'a GoogleSession,
}

impl<'a> GmailClient<'a> {
    pub fn new(session: &'a GoogleSession) -> Self {
        Self { session }
    }

    /// Most recent inbox messages. Any endpoint failure collapses the whole
    /// result into a single `Entry::Error`.
    pub fn list_recent_messages(&self, max_results: u32) -> Vec<Entry<EmailSummary>> {
        degrade("emails", self.try_list_recent_messages(max_results))
    }

    pub fn try_list_recent_messages(&self, max_results: u32) -> Result<Vec<EmailSummary>> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let url = format!("{}/gmail/v1/users/me/messages", self.session.gmail_base);
        log::debug!("listing up to {max_results} inbox messages");
        let list: MessageList = send_json(self.session.get(&url).query(&[
            ("labelIds", "INBOX".to_string()),
            ("maxResults", max_results.to_string()),
        ]))?;

        let mut out = Vec::with_capacity(list.messages.len());
        for m in &list.messages {
            out.push(self.fetch_message(&m.id)?);
        }
        Ok(out)
    }

    fn fetch_message(&self, id: &str) -> Result<EmailSummary> {
        let url = format!("{}/gmail/v1/users/me/messages/{}", self.session.gmail_base, id);
        log::debug!("fetching message {id}");
        let msg: Message = send_json(self.session.get(&url).query(&[("format", "full")]))?;
        Ok(summarize_message(id, msg))
    }
}

fn summarize_message(id: &str, msg: Message) -> EmailSummary {
    let Some(payload) = msg.payload else {
        log::warn!("message {id} has no payload");
        return EmailSummary {
            subject: NO_SUBJECT.to_string(),
            sender: UNKNOWN_SENDER.to_string(),
            body: NO_TEXT_BODY.to_string(),
        };
    };

    let subject = header(&payload.headers, "Subject").unwrap_or_else(|| {
        log::warn!("message {id} has no Subject header");
        NO_SUBJECT
    });
    let sender = header(&payload.headers, "From").unwrap_or_else(|| {
        log::warn!("message {id} has no From header");
        UNKNOWN_SENDER
    });

    EmailSummary {
        subject: subject.to_string(),
        sender: sender.to_string(),
        body: extract_plain_text_body(&payload.part),
    }
}
