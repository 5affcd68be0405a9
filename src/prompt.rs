//! Yes/no stdin prompts.

use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Asks a y/n question on stdout and reads one line from `input`.
/// Anything other than `y`/`yes` (case-insensitive) counts as no.
pub fn confirm(question: &str, input: &mut dyn BufRead) -> Result<bool> {
    print!("{question} (y/n): ");
    io::stdout().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
