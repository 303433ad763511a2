//! Runner module.
//!
//! This module contains the merge runner, which drives one complete
//! pass over the recipient table: one provider call per valid row,
//! paced and jittered, with per-row failure isolation and cooperative
//! stop.

use chrono::Local;
use lettre::message::Mailbox;
use log::{debug, trace, warn};
use rand::{thread_rng, Rng};
use std::{
    result, thread,
    time::{Duration, Instant},
};
use thiserror::Error;

use crate::{
    client::{self, Label, MailClient},
    extract_addr, fingerprint, payload, retry, state, tpl, MergeConfig, MergeState, Progress,
    ReplyFallback, Row, RowTable, RunOutcome, RunReport, SendMode, EMAIL_COLUMN,
    RFC_MESSAGE_ID_COLUMN, THREAD_ID_COLUMN,
};

/// Header holding the durable RFC 2822 message identifier. The
/// provider assigns it asynchronously, hence the retried fetch.
const RFC_MESSAGE_ID_HEADER: &str = "Message-ID";

const METADATA_FETCH_ATTEMPTS: usize = 5;
const LABEL_APPLY_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot parse sender address {1}")]
    ParseSenderError(#[source] lettre::address::AddressError, String),

    #[error(transparent)]
    StateError(#[from] state::Error),
}

pub type Result<T> = result::Result<T, Error>;

/// Errors caught at the row boundary: they fail one row, never the
/// whole run.
#[derive(Debug, Error)]
enum RowError {
    #[error(transparent)]
    TplError(#[from] tpl::Error),
    #[error(transparent)]
    PayloadError(#[from] payload::Error),
    #[error(transparent)]
    ClientError(#[from] client::Error),
}

enum RowAction {
    Sent,
    SkippedReply,
}

/// Drives one complete merge pass over a recipient table.
///
/// Rows are processed strictly in table order: the write-back of the
/// identifiers for row `i` always happens before row `i + 1` is
/// attempted. The pacing delay between provider calls is the rate
/// limit compliance mechanism, so rows are never processed
/// concurrently.
pub struct MergeRunner<'a> {
    client: &'a mut dyn MailClient,
    config: &'a MergeConfig,
    state: &'a mut MergeState,
}

impl<'a> MergeRunner<'a> {
    pub fn new(
        client: &'a mut dyn MailClient,
        config: &'a MergeConfig,
        state: &'a mut MergeState,
    ) -> Self {
        Self {
            client,
            config,
            state,
        }
    }

    /// Runs the merge over the given table, publishing progress after
    /// each successful send. Identifiers returned by the provider are
    /// written back into the table as rows complete. The run state
    /// returns to idle on every exit path.
    pub fn run<F>(&mut self, table: &mut RowTable, mut on_progress: F) -> Result<RunReport>
    where
        F: FnMut(&Progress),
    {
        let fingerprint = fingerprint::compute(table, self.config);
        self.state.begin(&fingerprint)?;
        debug!("starting merge run {}", fingerprint);

        match self.execute(table, &mut on_progress) {
            Ok(report) => {
                debug!(
                    "merge run {} ended: {} sent, {} skipped, {} failed",
                    fingerprint,
                    report.sent,
                    report.skipped.len(),
                    report.failures.len()
                );
                self.state.finish(report.outcome, &fingerprint);
                Ok(report)
            }
            Err(err) => {
                self.state.finish(RunOutcome::Failed, &fingerprint);
                Err(err)
            }
        }
    }

    fn execute<F>(&mut self, table: &mut RowTable, on_progress: &mut F) -> Result<RunReport>
    where
        F: FnMut(&Progress),
    {
        let from: Mailbox = self
            .config
            .sender
            .parse()
            .map_err(|err| Error::ParseSenderError(err, self.config.sender.clone()))?;

        table.ensure_column(THREAD_ID_COLUMN);
        table.ensure_column(RFC_MESSAGE_ID_COLUMN);

        let label = match self.config.mode {
            SendMode::New => self.resolve_label(),
            _ => None,
        };

        let total = table.len();
        let started_at = Local::now();
        let start = Instant::now();
        let mut sent = 0;
        let mut skipped = Vec::new();
        let mut failures = Vec::new();
        let mut outcome = RunOutcome::Completed;

        for idx in 0..total {
            if self.state.stop_requested() {
                warn!("stop requested, {} rows left untouched", total - idx);
                outcome = RunOutcome::Stopped;
                break;
            }

            let row = table.rows()[idx].clone();
            let raw_addr = row.get(EMAIL_COLUMN).unwrap_or_default().to_owned();
            let to_addr = match extract_addr(&raw_addr) {
                Some(addr) => addr,
                None => {
                    debug!("no valid address in row {}, skipping", idx + 1);
                    skipped.push(raw_addr);
                    continue;
                }
            };

            match self.process_row(table, idx, &row, &from, &to_addr, label.as_ref()) {
                Ok(RowAction::Sent) => {
                    sent += 1;
                    on_progress(&Progress::compute(sent, total, start.elapsed()));
                }
                Ok(RowAction::SkippedReply) => {
                    debug!("row {} misses thread identifiers, skipping", idx + 1);
                    skipped.push(raw_addr);
                }
                Err(err) => {
                    warn!("row {} failed: {}", idx + 1, err);
                    failures.push((to_addr, err.to_string()));
                }
            }
        }

        Ok(RunReport {
            outcome,
            mode: self.config.mode,
            sent,
            skipped,
            failures,
            started_at,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    fn process_row(
        &mut self,
        table: &mut RowTable,
        idx: usize,
        row: &Row,
        from: &Mailbox,
        to_addr: &str,
        label: Option<&Label>,
    ) -> result::Result<RowAction, RowError> {
        let subject = self.config.tpl.render_subject(row)?;
        let body = self.config.tpl.render_body(row)?;

        let thread = match self.config.mode {
            SendMode::Reply => payload::reply_ids(row),
            _ => None,
        };
        if self.config.mode == SendMode::Reply
            && thread.is_none()
            && self.config.reply_fallback == ReplyFallback::Skip
        {
            return Ok(RowAction::SkippedReply);
        }

        let payload = payload::build(from, to_addr, &subject, &body, thread)?;
        trace!("payload for {}: {:?}", to_addr, payload);

        let message = match self.config.mode {
            SendMode::Draft => {
                let message = self.client.create_draft(&payload)?;
                debug!("draft saved for {}", to_addr);
                message
            }
            _ => {
                let message = self.client.send_message(&payload)?;
                debug!("message sent to {}", to_addr);
                message
            }
        };

        self.pace();

        let rfc_message_id = self.fetch_rfc_message_id(&message.id);

        if let Some(label) = label {
            if !message.id.is_empty() {
                self.apply_label(&message.id, label, to_addr);
            }
        }

        table.set(idx, THREAD_ID_COLUMN, &message.thread_id);
        table.set(
            idx,
            RFC_MESSAGE_ID_COLUMN,
            rfc_message_id.unwrap_or_default(),
        );

        Ok(RowAction::Sent)
    }

    /// Sleeps between provider calls. The jitter keeps request timing
    /// from being perfectly periodic.
    fn pace(&self) {
        let delay = self.config.delay();
        if delay == 0 {
            return;
        }

        let delay = delay as f64;
        let secs = thread_rng().gen_range(delay * 0.9..=delay * 1.1);
        trace!("pacing next provider call for {:.1}s", secs);
        thread::sleep(Duration::from_secs_f64(secs));
    }

    /// Fetches the Message-ID header of a sent message, best effort:
    /// the provider may not expose it right away.
    fn fetch_rfc_message_id(&mut self, message_id: &str) -> Option<String> {
        let client = &mut *self.client;
        retry::retry(
            METADATA_FETCH_ATTEMPTS,
            |_| thread::sleep(Duration::from_secs_f64(thread_rng().gen_range(2.0..=4.0))),
            || {
                let headers = client.get_message_headers(message_id, &[RFC_MESSAGE_ID_HEADER])?;
                headers
                    .into_iter()
                    .find(|header| header.name.eq_ignore_ascii_case(RFC_MESSAGE_ID_HEADER))
                    .map(|header| header.value)
                    .ok_or_else(|| client::Error::FindMessageError(message_id.to_owned()))
            },
        )
    }

    /// Applies the resolved label to a sent message, best effort:
    /// exhausted retries only surface a warning.
    fn apply_label(&mut self, message_id: &str, label: &Label, to_addr: &str) {
        let client = &mut *self.client;
        let applied = retry::retry(
            LABEL_APPLY_ATTEMPTS,
            |attempt| {
                if attempt > 0 {
                    thread::sleep(Duration::from_secs(1));
                }
            },
            || client.add_label(message_id, &label.id),
        );

        if applied.is_none() {
            warn!("cannot apply label {} to {}", label.name, to_addr);
        }
    }

    /// Resolves the configured label, creating it when absent. Label
    /// resolution is best effort: any failure degrades to an unlabeled
    /// run with a warning.
    fn resolve_label(&mut self) -> Option<Label> {
        let name = self.config.label_name();

        let labels = match self.client.list_labels() {
            Ok(labels) => labels,
            Err(err) => {
                warn!("cannot list labels: {}", err);
                return None;
            }
        };
        if let Some(label) = labels
            .into_iter()
            .find(|label| label.name.eq_ignore_ascii_case(&name))
        {
            return Some(label);
        }

        match self.client.create_label(&name) {
            Ok(label) => Some(label),
            Err(err) => {
                warn!("cannot create label {}: {}", name, err);
                None
            }
        }
    }
}
