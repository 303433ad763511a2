//! Fingerprint module.
//!
//! This module derives the identity of one merge job, used to detect
//! re-submission of an already completed job.

use crate::{MergeConfig, RowTable};

/// Number of rows sampled from the table.
pub const SAMPLE_ROWS: usize = 50;
/// Length of the hex identifier.
pub const FINGERPRINT_LEN: usize = 12;

/// Computes the fingerprint of one merge job from a deterministic
/// sample of the row data plus the template, mode and label name. The
/// digest is compared for equality only, never used for security.
pub fn compute(table: &RowTable, config: &MergeConfig) -> String {
    let mut key = table.sample_csv(SAMPLE_ROWS).into_bytes();
    key.extend(config.tpl.subject.as_bytes());
    key.extend(config.tpl.body.as_bytes());
    key.extend(config.mode.to_string().as_bytes());
    key.extend(config.label_name().as_bytes());

    let digest = format!("{:x}", md5::compute(&key));
    digest[..FINGERPRINT_LEN].to_owned()
}
