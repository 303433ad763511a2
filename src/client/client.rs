//! Client module.
//!
//! This module exposes the mail client trait, which abstracts over the
//! remote mail provider operations the merge runner relies on. Concrete
//! implementations wrap an authenticated provider session and are
//! supplied by the hosting application.

use serde::Serialize;
use std::result;
use thiserror::Error;

use crate::MessagePayload;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot call remote mail service: {0}")]
    RemoteCallError(String),
    #[error("cannot find remote message {0}")]
    FindMessageError(String),
    #[error("cannot find remote label {0}")]
    FindLabelError(String),
}

pub type Result<T> = result::Result<T, Error>;

/// Represents a message as known by the remote provider.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RemoteMessage {
    /// Represents the provider-assigned message identifier.
    pub id: String,
    /// Represents the identifier of the thread holding the message.
    pub thread_id: String,
}

/// Represents a single raw header of a remote message.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

/// Represents a provider label.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Label {
    pub id: String,
    pub name: String,
}

pub trait MailClient {
    /// Sends the given raw message and returns its remote identifiers.
    fn send_message(&mut self, payload: &MessagePayload) -> Result<RemoteMessage>;

    /// Stores the given raw message as a draft and returns the
    /// identifiers of the message wrapped by the draft.
    fn create_draft(&mut self, payload: &MessagePayload) -> Result<RemoteMessage>;

    /// Fetches the given headers of an already sent message.
    fn get_message_headers(
        &mut self,
        id: &str,
        header_names: &[&str],
    ) -> Result<Vec<MessageHeader>>;

    /// Adds the given label to the given message.
    fn add_label(&mut self, message_id: &str, label_id: &str) -> Result<()>;

    /// Lists all labels of the account.
    fn list_labels(&mut self) -> Result<Vec<Label>>;

    /// Creates a new label with the given name.
    fn create_label(&mut self, name: &str) -> Result<Label>;
}
