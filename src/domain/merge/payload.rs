//! Payload module.
//!
//! This module builds the provider-bound message payloads, one per
//! recipient row: the raw RFC 2822 message plus the thread it belongs
//! to when replying.

use base64::{engine::general_purpose::URL_SAFE, Engine};
use lettre::message::{header::ContentType, Mailbox};
use lettre::Message;
use serde::Serialize;
use std::result;
use thiserror::Error;

use crate::{Row, RFC_MESSAGE_ID_COLUMN, THREAD_ID_COLUMN};

/// Placeholder some spreadsheet exports leave in empty id cells.
const EMPTY_ID_PLACEHOLDER: &str = "nan";

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot parse address {1}")]
    ParseAddrError(#[source] lettre::address::AddressError, String),
    #[error("cannot build message for {1}")]
    BuildMessageError(#[source] lettre::error::Error, String),
}

pub type Result<T> = result::Result<T, Error>;

/// Represents the provider-bound payload of one message: the raw RFC
/// 2822 message, URL-safe base64 encoded, plus the thread the message
/// replies to, if any.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MessagePayload {
    pub raw: String,
    pub thread_id: Option<String>,
}

/// Returns the thread and prior message identifiers recorded in the
/// row, when both are present and not placeholders.
pub fn reply_ids(row: &Row) -> Option<(String, String)> {
    let thread_id = existing_id(row, THREAD_ID_COLUMN)?;
    let rfc_id = existing_id(row, RFC_MESSAGE_ID_COLUMN)?;
    Some((thread_id.to_owned(), rfc_id.to_owned()))
}

fn existing_id<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    let id = row.get(column)?.trim();
    if id.is_empty() || id.eq_ignore_ascii_case(EMPTY_ID_PLACEHOLDER) {
        None
    } else {
        Some(id)
    }
}

/// Builds the payload for one rendered message. When a thread is given
/// the payload binds to it and the message carries the `In-Reply-To`
/// and `References` headers of the prior message.
pub fn build(
    from: &Mailbox,
    to_addr: &str,
    subject: &str,
    body: &str,
    thread: Option<(String, String)>,
) -> Result<MessagePayload> {
    let to: Mailbox = to_addr
        .parse()
        .map_err(|err| Error::ParseAddrError(err, to_addr.to_owned()))?;

    let mut builder = Message::builder()
        .from(from.clone())
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_HTML);

    let thread_id = match thread {
        Some((thread_id, rfc_id)) => {
            builder = builder.in_reply_to(rfc_id.clone()).references(rfc_id);
            Some(thread_id)
        }
        None => None,
    };

    let message = builder
        .body(body.to_owned())
        .map_err(|err| Error::BuildMessageError(err, to_addr.to_owned()))?;

    Ok(MessagePayload {
        raw: URL_SAFE.encode(message.formatted()),
        thread_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from() -> Mailbox {
        "Sender <sender@localhost.io>".parse().unwrap()
    }

    fn decode(payload: &MessagePayload) -> String {
        String::from_utf8(URL_SAFE.decode(&payload.raw).unwrap()).unwrap()
    }

    #[test]
    fn test_reply_ids_require_both_identifiers() {
        let row: Row = [(THREAD_ID_COLUMN, "t1"), (RFC_MESSAGE_ID_COLUMN, "m1")]
            .into_iter()
            .collect();
        assert_eq!(Some(("t1".into(), "m1".into())), reply_ids(&row));

        let row: Row = [(THREAD_ID_COLUMN, "t1")].into_iter().collect();
        assert_eq!(None, reply_ids(&row));

        let row: Row = [(THREAD_ID_COLUMN, ""), (RFC_MESSAGE_ID_COLUMN, "m1")]
            .into_iter()
            .collect();
        assert_eq!(None, reply_ids(&row));
    }

    #[test]
    fn test_reply_ids_reject_placeholders() {
        let row: Row = [(THREAD_ID_COLUMN, "nan"), (RFC_MESSAGE_ID_COLUMN, "m1")]
            .into_iter()
            .collect();
        assert_eq!(None, reply_ids(&row));

        let row: Row = [(THREAD_ID_COLUMN, "t1"), (RFC_MESSAGE_ID_COLUMN, "NaN")]
            .into_iter()
            .collect();
        assert_eq!(None, reply_ids(&row));

        let row: Row = [(THREAD_ID_COLUMN, "  t1  "), (RFC_MESSAGE_ID_COLUMN, " m1 ")]
            .into_iter()
            .collect();
        assert_eq!(Some(("t1".into(), "m1".into())), reply_ids(&row));
    }

    #[test]
    fn test_build_new_message() {
        let payload = build(
            &from(),
            "alice@localhost.io",
            "Hello Alice",
            "<html><body>Hi</body></html>",
            None,
        )
        .unwrap();

        assert_eq!(None, payload.thread_id);

        let raw = decode(&payload);
        assert!(raw.contains("To: alice@localhost.io"));
        assert!(raw.contains("Subject: Hello Alice"));
        assert!(raw.contains("text/html"));
        assert!(!raw.contains("In-Reply-To"));
        assert!(!raw.contains("References"));
    }

    #[test]
    fn test_build_threaded_reply() {
        let payload = build(
            &from(),
            "alice@localhost.io",
            "Re: Hello Alice",
            "<html><body>Hi again</body></html>",
            Some(("t1".into(), "m1".into())),
        )
        .unwrap();

        assert_eq!(Some("t1".into()), payload.thread_id);

        let raw = decode(&payload);
        assert!(raw.contains("In-Reply-To: m1"));
        assert!(raw.contains("References: m1"));
    }

    #[test]
    fn test_build_rejects_invalid_address() {
        assert!(matches!(
            build(&from(), "not an address", "subject", "body", None),
            Err(Error::ParseAddrError(_, addr)) if addr == "not an address"
        ));
    }
}
