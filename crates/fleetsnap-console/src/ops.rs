//! The four batch snapshot operations.
//!
//! Every operation walks the batch in order and never gives up early: a
//! failure on one guest is printed and counted, then the walk moves on.
//! Results are printed as they are produced, so the operator watches long
//! batches progress.

use std::fmt;
use std::io::{self, Write};

use tracing::warn;

use fleetsnap_common::{EndpointSession, GuestRef};

/// Per-batch outcome counts, printed after every operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} succeeded, {} failed", self.succeeded, self.failed)
    }
}

/// Print every snapshot of every guest, one line each, oldest first
/// within a guest. A guest with no snapshots contributes no lines.
pub async fn list_all<W: Write>(
    session: &dyn EndpointSession,
    batch: &[GuestRef],
    out: &mut W,
) -> io::Result<BatchReport> {
    let mut report = BatchReport::default();
    for guest in batch {
        match session.list_snapshots(guest).await {
            Ok(snapshots) => {
                for record in &snapshots {
                    writeln!(out, "{record}")?;
                }
                report.succeeded += 1;
            }
            Err(e) => {
                warn!("Snapshot list failed for {}: {}", guest.name, e);
                writeln!(out, "Failed to list snapshots for {}: {}", guest.name, e)?;
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

/// Show each guest's newest snapshot. A guest with no snapshots
/// contributes no line.
pub async fn list_last<W: Write>(
    session: &dyn EndpointSession,
    batch: &[GuestRef],
    out: &mut W,
) -> io::Result<BatchReport> {
    let mut report = BatchReport::default();
    for guest in batch {
        match session.list_snapshots(guest).await {
            Ok(snapshots) => {
                if let Some(record) = snapshots.last() {
                    writeln!(out, "{record}")?;
                }
                report.succeeded += 1;
            }
            Err(e) => {
                warn!("Snapshot list failed for {}: {}", guest.name, e);
                writeln!(out, "Failed to list snapshots for {}: {}", guest.name, e)?;
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

/// Take one snapshot of every guest, all under the same shared name.
pub async fn create_all<W: Write>(
    session: &dyn EndpointSession,
    batch: &[GuestRef],
    name: &str,
    out: &mut W,
) -> io::Result<BatchReport> {
    let mut report = BatchReport::default();
    for guest in batch {
        match session.create_snapshot(guest, name, None).await {
            Ok(record) => {
                writeln!(out, "Created {record}")?;
                report.succeeded += 1;
            }
            Err(e) => {
                warn!("Snapshot create failed for {}: {}", guest.name, e);
                writeln!(out, "Failed to snapshot {}: {}", guest.name, e)?;
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

/// Delete each guest's newest snapshot. The confirmation gate runs before
/// this is called; by here the operator has already said YES.
pub async fn delete_last<W: Write>(
    session: &dyn EndpointSession,
    batch: &[GuestRef],
    out: &mut W,
) -> io::Result<BatchReport> {
    let mut report = BatchReport::default();
    for guest in batch {
        let newest = match session.list_snapshots(guest).await {
            Ok(mut snapshots) => snapshots.pop(),
            Err(e) => {
                warn!("Snapshot list failed for {}: {}", guest.name, e);
                writeln!(out, "Failed to list snapshots for {}: {}", guest.name, e)?;
                report.failed += 1;
                continue;
            }
        };
        let Some(record) = newest else {
            writeln!(out, "{}: no snapshots to delete", guest.name)?;
            report.succeeded += 1;
            continue;
        };
        match session.delete_snapshot(&record).await {
            Ok(()) => {
                writeln!(out, "Deleted {record}")?;
                report.succeeded += 1;
            }
            Err(e) => {
                warn!("Snapshot delete failed for {}: {}", guest.name, e);
                writeln!(
                    out,
                    "Failed to delete newest snapshot of {}: {}",
                    guest.name, e
                )?;
                report.failed += 1;
            }
        }
    }
    Ok(report)
}
