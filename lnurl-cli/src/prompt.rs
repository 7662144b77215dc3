//! Interactive amount selection.

use std::io::{BufRead, Write};

use lnurl::SendableRange;
use lnurl::resolver::AmountStrategy;

/// Asks for a replacement amount on a line-oriented terminal.
///
/// End of input cancels the payment. Lines that are not a number are
/// re-asked; numbers are returned as-is and validated by the resolver.
#[derive(Debug)]
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R, W> Prompt<R, W> {
    /// Creates a prompt reading from `input` and writing to `output`.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> AmountStrategy for Prompt<R, W> {
    fn choose(&mut self, range: SendableRange, rejected: u64) -> Option<u64> {
        if rejected != 0 {
            writeln!(
                self.output,
                "Invalid amount. Expected an amount between {} and {}, got {rejected}",
                range.min_sendable, range.max_sendable
            )
            .ok()?;
        }

        loop {
            writeln!(
                self.output,
                "Enter an amount (in millisatoshis) between {} and {}",
                range.min_sendable, range.max_sendable
            )
            .ok()?;
            self.output.flush().ok()?;

            let mut line = String::new();
            if self.input.read_line(&mut line).ok()? == 0 {
                return None;
            }
            match line.trim().parse::<u64>() {
                Ok(amount) => return Some(amount),
                Err(e) => writeln!(self.output, "Could not parse '{}': {e}", line.trim()).ok()?,
            }
        }
    }
}
