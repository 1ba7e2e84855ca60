//! Run orchestration: one endpoint session from probe to disconnect.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use fleetsnap_common::{Credentials, EndpointConnector, EndpointError, EndpointSession, GuestRef};

use crate::command::{Command, HELP_TEXT};
use crate::ops;
use crate::prompt::{Answer, Prompt};
use crate::resolve;

/// Failures that end the run before the command loop starts. Each maps
/// to a distinct process exit code so wrappers can tell them apart.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("Connection declined by operator")]
    Declined,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Endpoint reported host {reported}, expected {requested}")]
    HostMismatch { requested: String, reported: String },

    #[error("No guests could be resolved")]
    EmptyBatch,
}

impl SetupError {
    pub fn exit_code(&self) -> i32 {
        match self {
            SetupError::Unavailable(_) => 3,
            SetupError::Declined => 4,
            SetupError::Auth(_) | SetupError::HostMismatch { .. } => 5,
            SetupError::EmptyBatch => 6,
        }
    }
}

/// Drives one operator run end to end: probe, confirm, authenticate,
/// connect, verify host identity, resolve the batch, serve commands,
/// disconnect.
pub struct SessionController<C, R: BufRead, W: Write> {
    connector: C,
    prompt: Prompt<R, W>,
}

impl<C: EndpointConnector, R: BufRead, W: Write> SessionController<C, R, W> {
    pub fn new(connector: C, reader: R, writer: W) -> Self {
        Self {
            connector,
            prompt: Prompt::new(reader, writer),
        }
    }

    /// One full run. `Ok(())` means the operator exited normally; setup
    /// failures come back as [`SetupError`] inside the error chain.
    pub async fn run(
        &mut self,
        host: &str,
        names: &[String],
        env_credentials: Option<Credentials>,
    ) -> Result<()> {
        if let Err(e) = self.connector.probe().await {
            return Err(SetupError::Unavailable(e.to_string()).into());
        }

        writeln!(
            self.prompt.writer(),
            "About to connect to {} and manage {} guest(s).",
            host,
            names.len()
        )?;
        if !self.prompt.affirm("Proceed?")? {
            return Err(SetupError::Declined.into());
        }

        let credentials = match env_credentials {
            Some(credentials) => credentials,
            None => match self.prompt.credentials()? {
                Some(credentials) => credentials,
                None => return Err(SetupError::Declined.into()),
            },
        };

        let session = match self.connector.connect(host, &credentials).await {
            Ok(session) => session,
            Err(EndpointError::Auth(reason)) => return Err(SetupError::Auth(reason).into()),
            Err(EndpointError::Unavailable(reason)) => {
                return Err(SetupError::Unavailable(reason).into())
            }
            Err(e) => return Err(e).context("opening endpoint session"),
        };

        // The endpoint names itself; refuse to operate on the wrong host.
        let reported = session.host().to_string();
        if !reported.eq_ignore_ascii_case(host) {
            session.disconnect().await;
            return Err(SetupError::HostMismatch {
                requested: host.to_string(),
                reported,
            }
            .into());
        }
        info!(host = %reported, "Session open");
        writeln!(self.prompt.writer(), "Connected to {reported}.")?;

        let batch = resolve::resolve_batch(session.as_ref(), names, self.prompt.writer()).await?;
        if batch.is_empty() {
            session.disconnect().await;
            return Err(SetupError::EmptyBatch.into());
        }
        info!(
            resolved = batch.len(),
            requested = names.len(),
            "Guest batch resolved"
        );

        // Disconnect no matter how the loop ends.
        let result = self.command_loop(session.as_ref(), &batch).await;
        session.disconnect().await;
        result
    }

    async fn command_loop(
        &mut self,
        session: &dyn EndpointSession,
        batch: &[GuestRef],
    ) -> Result<()> {
        writeln!(self.prompt.writer(), "{HELP_TEXT}")?;

        loop {
            let Some(line) = self.prompt.line("fleetsnap> ")? else {
                // Closed input stream; leave the same way EXIT does.
                writeln!(self.prompt.writer())?;
                return Ok(());
            };
            if line.is_empty() {
                continue;
            }

            match Command::parse(&line) {
                Ok(Command::ListAll) => {
                    let report = ops::list_all(session, batch, self.prompt.writer()).await?;
                    writeln!(self.prompt.writer(), "{report}")?;
                }
                Ok(Command::Create) => {
                    let Some(name) = self.prompt.required("Snapshot name: ")? else {
                        writeln!(self.prompt.writer(), "Aborted.")?;
                        continue;
                    };
                    let report =
                        ops::create_all(session, batch, &name, self.prompt.writer()).await?;
                    writeln!(self.prompt.writer(), "{report}")?;
                }
                Ok(Command::ListLast) => {
                    let report = ops::list_last(session, batch, self.prompt.writer()).await?;
                    writeln!(self.prompt.writer(), "{report}")?;
                }
                Ok(Command::DeleteLast) => {
                    // The gate shows exactly which guests are on the line.
                    let roster = batch
                        .iter()
                        .map(|g| g.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    writeln!(
                        self.prompt.writer(),
                        "This will delete the newest snapshot of: {roster}"
                    )?;
                    match self.prompt.confirm("Proceed?")? {
                        Answer::Yes => {
                            let report =
                                ops::delete_last(session, batch, self.prompt.writer()).await?;
                            writeln!(self.prompt.writer(), "{report}")?;
                        }
                        Answer::No => writeln!(self.prompt.writer(), "Aborted.")?,
                    }
                }
                Ok(Command::Help) => writeln!(self.prompt.writer(), "{HELP_TEXT}")?,
                Ok(Command::Exit) => return Ok(()),
                Err(unknown) => {
                    writeln!(self.prompt.writer(), "{unknown}")?;
                    writeln!(self.prompt.writer(), "{HELP_TEXT}")?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_failure_class() {
        let cases: Vec<(SetupError, i32)> = vec![
            (SetupError::Unavailable("down".into()), 3),
            (SetupError::Declined, 4),
            (SetupError::Auth("bad password".into()), 5),
            (
                SetupError::HostMismatch {
                    requested: "esx1".into(),
                    reported: "esx2".into(),
                },
                5,
            ),
            (SetupError::EmptyBatch, 6),
        ];
        for (err, code) in cases {
            assert_eq!(err.exit_code(), code, "{err}");
        }
    }
}
