mod client;

pub use self::client::{Error, Label, MailClient, MessageHeader, RemoteMessage, Result};
