//! Line-oriented prompting
//!
//! All interactive input goes through [`Prompt`], which reads from any
//! `BufRead` and writes labels to any `Write`. The process uses stdin/stderr;
//! tests feed byte buffers. Passwords are read without echo via `rpassword`
//! when stdin is a terminal, and as plain lines otherwise.

use std::io::{self, BufRead, IsTerminal, Stderr, StdinLock, Write};

use crate::crypto::{Enclave, SecureString};
use crate::error::{LockboxError, LockboxResult};

const PASSWORD_CAPACITY: usize = 256;

/// Reader/writer pair for interactive prompts
pub struct Prompt<R, W> {
    reader: R,
    writer: W,
    hidden: bool,
}

impl Prompt<StdinLock<'static>, Stderr> {
    /// Prompt on the process stdin, labels on stderr
    pub fn stdio() -> Self {
        let stdin = io::stdin();
        let hidden = stdin.is_terminal();
        Self {
            reader: stdin.lock(),
            writer: io::stderr(),
            hidden,
        }
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    /// Prompt over arbitrary streams; passwords are read as plain lines
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            hidden: false,
        }
    }

    /// Write a line of text
    pub fn say(&mut self, message: &str) -> LockboxResult<()> {
        writeln!(self.writer, "{}", message)?;
        Ok(())
    }

    /// Ask for one line; returns it trimmed, or empty at end of input
    pub fn line(&mut self, label: &str) -> LockboxResult<String> {
        write!(self.writer, "{}: ", label)?;
        self.writer.flush()?;

        let mut input = String::new();
        self.reader.read_line(&mut input)?;
        Ok(input.trim().to_string())
    }

    /// Ask a yes/no question; anything but "y" or "yes" is a no
    pub fn confirm(&mut self, question: &str) -> LockboxResult<bool> {
        let answer = self.line(&format!("{} [y/N]", question))?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }

    /// Ask for a password and seal it immediately
    pub fn password(&mut self, label: &str) -> LockboxResult<Enclave> {
        let mut secret = if self.hidden {
            rpassword::prompt_password(format!("{}: ", label))
                .map(SecureString::from)
                .map_err(|e| LockboxError::Io(format!("Failed to read password: {}", e)))?
        } else {
            write!(self.writer, "{}: ", label)?;
            self.writer.flush()?;

            // Sized up front so read_line does not leave copies behind when growing
            let mut input = String::with_capacity(PASSWORD_CAPACITY);
            let read = self.reader.read_line(&mut input);
            let line = SecureString::from(input);
            if read? == 0 {
                return Err(LockboxError::InvalidPassword(
                    "no password entered".to_string(),
                ));
            }
            line
        };

        secret.trim_line_end();
        Enclave::from_buffer(secret.to_locked_buffer())
    }
}
