//! Line-oriented interactive console
//!
//! Everything the workflow asks or tells the user goes through [`Console`],
//! so the same code drives a terminal and scripted input in tests.

use std::io::{BufRead, BufReader, Stdin, Stdout, Write};

use tracing::debug;

use crate::Result;

/// Interactive line console
pub trait Console: Send {
    /// Print one line of output
    fn say(&mut self, line: &str) -> Result<()>;

    /// Show a prompt and read one trimmed line of input
    ///
    /// End of input yields an empty string.
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Ask a yes/no question
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.ask(prompt)?;
        Ok(is_affirmative(&answer))
    }
}

/// Whether an answer counts as "yes" (`y` or `yes`, any case)
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    answer == "y" || answer == "yes"
}

/// Resolve a value from a pre-filled source, prompting when it is unset
///
/// Returns `None` if the user also leaves the prompt empty.
pub fn resolve_value(
    console: &mut dyn Console,
    prefilled: Option<String>,
    prompt: &str,
) -> Result<Option<String>> {
    if let Some(value) = prefilled.filter(|v| !v.trim().is_empty()) {
        return Ok(Some(value.trim().to_string()));
    }

    let answer = console.ask(prompt)?;
    Ok(if answer.is_empty() { None } else { Some(answer) })
}

/// A [`Console`] over any line reader and writer
pub struct LineConsole<R, W> {
    input: R,
    output: W,
}

impl LineConsole<BufReader<Stdin>, Stdout> {
    /// Console on the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> LineConsole<R, W> {
    /// Create a console from a reader and writer
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Get the output written so far
    pub fn output(&self) -> &W {
        &self.output
    }
}

impl<R, W> Console for LineConsole<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{}", line)?;
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            debug!(prompt, "Input closed while prompting");
        }

        Ok(line.trim().to_string())
    }
}
