//! Merge config module.
//!
//! This module contains the representation of one merge job
//! configuration, collected from the user by the hosting application.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::MergeTpl;

pub const DEFAULT_LABEL_NAME: &str = "Mail Merge Sent";

pub const DEFAULT_DELAY_SECS: u64 = 20;
pub const MIN_DELAY_SECS: u64 = 20;
pub const MAX_DELAY_SECS: u64 = 75;

/// Represents the merge sending mode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum SendMode {
    /// Sends each rendered message as a new, unthreaded email.
    #[default]
    New,
    /// Sends each rendered message as a reply bound to the thread
    /// recorded in the row.
    Reply,
    /// Stores each rendered message as a draft instead of sending it.
    Draft,
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::New => write!(f, "new-email"),
            Self::Reply => write!(f, "follow-up"),
            Self::Draft => write!(f, "draft"),
        }
    }
}

/// Represents the behavior for reply rows missing usable thread
/// identifiers.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ReplyFallback {
    /// Sends the row as a new, unthreaded message.
    #[default]
    NewMessage,
    /// Skips the row without any provider call.
    Skip,
}

/// Represents the configuration of one merge run.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Represents the subject and body templates.
    pub tpl: MergeTpl,
    /// Represents the sending mode.
    pub mode: SendMode,
    /// Represents the sender address set on built messages.
    pub sender: String,
    /// Represents the name of the label applied to new emails.
    pub label_name: Option<String>,
    /// Represents the base delay in seconds between provider calls.
    pub delay: Option<u64>,
    /// Represents the behavior for reply rows missing thread ids.
    pub reply_fallback: ReplyFallback,
}

impl MergeConfig {
    pub fn label_name(&self) -> String {
        self.label_name
            .clone()
            .unwrap_or_else(|| DEFAULT_LABEL_NAME.into())
    }

    pub fn delay(&self) -> u64 {
        self.delay.unwrap_or(DEFAULT_DELAY_SECS)
    }
}

/// Clamps a user-supplied delay into the provider-safe pacing range.
/// Callers collecting the delay from user input are expected to clamp
/// it before building the config.
pub fn clamp_delay(delay: u64) -> u64 {
    delay.clamp(MIN_DELAY_SECS, MAX_DELAY_SECS)
}
