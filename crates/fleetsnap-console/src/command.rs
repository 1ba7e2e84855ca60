//! The interactive command table.

use std::fmt;

/// One operator command. The table is closed; anything else is
/// [`UnknownCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Print every snapshot of every guest in the batch.
    ListAll,
    /// Take a snapshot of every guest, under one shared name.
    Create,
    /// Show each guest's newest snapshot.
    ListLast,
    /// Delete each guest's newest snapshot, behind the confirmation gate.
    DeleteLast,
    Help,
    Exit,
}

/// Input that matched no command, with the raw text preserved for the
/// error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unrecognized command: {}", self.0)
    }
}

impl Command {
    /// Parse one input line. Matching is case-insensitive and interior
    /// whitespace collapses, so `list   all` still matches.
    pub fn parse(line: &str) -> Result<Command, UnknownCommand> {
        let normalized = line.trim().to_uppercase();
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        match tokens.as_slice() {
            ["LIST", "ALL"] => Ok(Command::ListAll),
            ["CREATE"] => Ok(Command::Create),
            ["LIST", "LAST"] => Ok(Command::ListLast),
            ["DELETE", "LAST"] => Ok(Command::DeleteLast),
            ["HELP"] | ["?"] => Ok(Command::Help),
            ["EXIT"] => Ok(Command::Exit),
            _ => Err(UnknownCommand(line.trim().to_string())),
        }
    }
}

/// Help table shown on loop entry, on HELP, and after an unrecognized
/// command.
pub const HELP_TEXT: &str = "\
Available commands:
  LIST ALL     list every snapshot of every guest in the batch
  CREATE       take a snapshot of every guest, under one shared name
  LIST LAST    show each guest's newest snapshot
  DELETE LAST  delete each guest's newest snapshot (asks for confirmation)
  HELP, ?      show this help
  EXIT         disconnect and quit";
