//! Guest batch parsing and resolution.

use std::io::{self, Write};

use tracing::warn;

use fleetsnap_common::{EndpointSession, GuestRef};

/// The requested guest names, in command-line order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestBatch(pub Vec<String>);

/// Splits a comma-separated guest list. Entries are trimmed; any empty
/// entry is a usage error, caught before a connection is even considered.
/// Doubles as the clap value parser for the guest argument.
pub fn parse_guest_batch(raw: &str) -> Result<GuestBatch, String> {
    let entries: Vec<&str> = raw.split(',').map(str::trim).collect();
    if entries.iter().any(|e| e.is_empty()) {
        return Err(
            "guest list must be comma-separated names with no empty entries".to_string(),
        );
    }
    Ok(GuestBatch(entries.iter().map(|e| e.to_string()).collect()))
}

/// Resolves each requested name against the live session, in order.
/// Failed names are reported and dropped; the survivors form the working
/// batch for the rest of the run.
pub async fn resolve_batch<W: Write>(
    session: &dyn EndpointSession,
    names: &[String],
    out: &mut W,
) -> io::Result<Vec<GuestRef>> {
    let mut guests = Vec::with_capacity(names.len());
    for name in names {
        match session.resolve_guest(name).await {
            Ok(guest) => {
                writeln!(out, "Resolved {} ({})", guest.name, guest.power_state)?;
                guests.push(guest);
            }
            Err(e) => {
                warn!("Dropping {} from the batch: {}", name, e);
                writeln!(out, "Skipping {name}: {e}")?;
            }
        }
    }
    Ok(guests)
}
