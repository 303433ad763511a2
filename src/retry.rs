//! Retry module.
//!
//! This module contains a bounded retry helper for best-effort calls
//! to the remote mail service.

use log::debug;
use std::fmt;

/// Runs the given operation up to `max_attempts` times and returns the
/// first success, or `None` once all attempts are exhausted.
///
/// The pause callback runs before every attempt with the zero-based
/// attempt number, so callers decide whether to pause before the first
/// attempt or only between attempts.
pub fn retry<T, E, P, O>(max_attempts: usize, mut pause: P, mut op: O) -> Option<T>
where
    E: fmt::Display,
    P: FnMut(usize),
    O: FnMut() -> Result<T, E>,
{
    for attempt in 0..max_attempts {
        pause(attempt);
        match op() {
            Ok(res) => return Some(res),
            Err(err) => debug!("attempt {}/{} failed: {}", attempt + 1, max_attempts, err),
        }
    }
    None
}
