//! Active expiration
//!
//! Between requests the server sweeps the expiration table in bounded
//! batches: up to `sample_size` entries are examined in table iteration
//! order, overdue keys are deleted, and the sweep repeats only while a
//! meaningful fraction of each sample turns out to be expired. The bound
//! keeps a sweep from stalling the event loop behind it.

use log::debug;
use minnow_store::{now_ms, Dict};

/// Runs one bounded sweep of the expiration table
///
/// Stops as soon as the expired fraction of the configured sample size drops
/// to `stop_ratio` or below. A `sample_size` of zero disables the sweep.
pub fn purge_expired_keys(dict: &mut Dict, sample_size: usize, stop_ratio: f64) {
    if sample_size == 0 {
        return;
    }

    let mut purged = 0usize;
    loop {
        let now = now_ms();
        let overdue: Vec<String> = dict
            .expires()
            .iter()
            .take(sample_size)
            .filter(|&(_, &deadline)| now > deadline)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &overdue {
            dict.remove(key);
        }
        purged += overdue.len();

        if (overdue.len() as f64) / (sample_size as f64) <= stop_ratio {
            break;
        }
    }

    if purged > 0 {
        debug!("purged {purged} expired keys");
    }
}
