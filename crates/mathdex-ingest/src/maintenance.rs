use anyhow::Result;
use std::thread;
use std::time::Duration;
use tracing::info;

use mathdex_core::traits::{OffsetStore, TermIndex};

/// Polled once after every committed document. When the term index reports
/// that a merge/optimize ran, yield for the configured pause and force the
/// offset records to durable storage in case the reorganization is
/// disruptive. Returns whether maintenance was observed.
pub fn maintain(
    term: &mut dyn TermIndex,
    offsets: &mut dyn OffsetStore,
    pause: Duration,
) -> Result<bool> {
    if !term.poll_maintenance() {
        return Ok(false);
    }

    info!("index maintaining...");
    if !pause.is_zero() {
        thread::sleep(pause);
    }
    offsets.flush()?;
    Ok(true)
}
