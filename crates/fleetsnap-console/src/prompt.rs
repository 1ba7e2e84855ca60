//! Prompt layer over any `BufRead`/`Write` pair.
//!
//! All operator interaction goes through [`Prompt`], so every flow can be
//! driven from a `Cursor` in tests. End of input is surfaced as `None`
//! rather than an error; each caller decides what a closed stream means
//! for its step.

use std::io::{self, BufRead, Write};

use fleetsnap_common::Credentials;

/// Outcome of the strict YES/NO confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

/// Normalizes one raw line into a gate answer. The line is trimmed and
/// uppercased; only exact `YES` or `NO` is recognized.
pub fn parse_answer(line: &str) -> Option<Answer> {
    match line.trim().to_uppercase().as_str() {
        "YES" => Some(Answer::Yes),
        "NO" => Some(Answer::No),
        _ => None,
    }
}

pub struct Prompt<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Direct access to the output side, for printing between prompts.
    pub fn writer(&mut self) -> &mut W {
        &mut self.writer
    }

    /// One trimmed line, or `None` once the input stream is closed.
    pub fn line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.writer, "{prompt}")?;
        self.writer.flush()?;

        let mut input = String::new();
        if self.reader.read_line(&mut input)? == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim().to_string()))
    }

    /// Single-shot yes/no question. Only `y` or `yes` in any case
    /// affirms; everything else, including end of input, declines.
    pub fn affirm(&mut self, prompt: &str) -> io::Result<bool> {
        let Some(line) = self.line(&format!("{prompt} [y/N]: "))? else {
            return Ok(false);
        };
        Ok(matches!(line.to_lowercase().as_str(), "y" | "yes"))
    }

    /// Strict confirmation gate: asks again until the answer is exactly
    /// YES or NO. End of input counts as NO.
    pub fn confirm(&mut self, prompt: &str) -> io::Result<Answer> {
        loop {
            let Some(line) = self.line(&format!("{prompt} [YES/NO]: "))? else {
                return Ok(Answer::No);
            };
            match parse_answer(&line) {
                Some(answer) => return Ok(answer),
                None => writeln!(self.writer, "Please answer YES or NO.")?,
            }
        }
    }

    /// Non-empty value prompt; asks again on empty input. `None` once the
    /// stream is closed.
    pub fn required(&mut self, prompt: &str) -> io::Result<Option<String>> {
        loop {
            let Some(line) = self.line(prompt)? else {
                return Ok(None);
            };
            if !line.is_empty() {
                return Ok(Some(line));
            }
            writeln!(self.writer, "A value is required.")?;
        }
    }

    /// Username/password pair. `None` if the stream closes first. Input
    /// is echoed; runs that must not echo should pass credentials through
    /// the environment instead.
    pub fn credentials(&mut self) -> io::Result<Option<Credentials>> {
        let Some(username) = self.required("Username: ")? else {
            return Ok(None);
        };
        let Some(password) = self.required("Password: ")? else {
            return Ok(None);
        };
        Ok(Some(Credentials::new(username, password)))
    }
}
