use std::io::{self, Write};

use geocoin_engine::ConfirmationProvider;

/// Answers every prompt with a fixed reply (`--yes` and script runs).
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedReply(pub(crate) bool);

impl ConfirmationProvider for FixedReply {
    fn confirm(&mut self, _prompt: &str) -> bool {
        self.0
    }
}

/// Writes the prompt to `output` and reads a y/n answer via `read_answer`.
/// Stdin is read one line per call so the command loop can share it.
pub(crate) struct LinePrompt<F, W> {
    read_answer: F,
    output: W,
}

impl<F, W> LinePrompt<F, W>
where
    F: FnMut(&mut String) -> io::Result<usize>,
    W: Write,
{
    pub(crate) fn new(read_answer: F, output: W) -> Self {
        Self {
            read_answer,
            output,
        }
    }
}

pub(crate) fn stdio_prompt() -> Box<dyn ConfirmationProvider> {
    Box::new(LinePrompt::new(
        |answer: &mut String| io::stdin().read_line(answer),
        io::stdout(),
    ))
}

impl<F, W> ConfirmationProvider for LinePrompt<F, W>
where
    F: FnMut(&mut String) -> io::Result<usize>,
    W: Write,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        if write!(self.output, "{prompt} [y/N] ").is_err() || self.output.flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match (self.read_answer)(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_affirmative(&answer),
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
