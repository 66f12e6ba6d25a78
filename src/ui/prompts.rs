//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! # Design
//!
//! Engines never read the terminal. They depend on the [`Confirm`]
//! capability, which the CLI supplies ([`LineConfirm`] over stdin) and tests
//! replace with scripted answers. In non-interactive mode no capability is
//! passed at all and engines take their documented default.

use std::io::{BufRead, Write};

use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("not in interactive mode")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

/// Yes/no question answered by the operator.
///
/// `Ok(false)` is a normal answer, not a failure.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> Result<bool, PromptError>;
}

/// Interpret a typed answer: `y`/`yes` or `n`/`no`, case-insensitive,
/// surrounding whitespace ignored. Anything else is `None`.
pub fn parse_answer(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Line-oriented confirmation over any reader/writer pair.
///
/// Unrecognized answers re-ask the question. End of input declines.
pub struct LineConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LineConfirm<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Read answers from stdin, ask on stderr.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Confirm for LineConfirm<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool, PromptError> {
        let io = |e: std::io::Error| PromptError::IoError(e.to_string());
        loop {
            write!(self.output, "{} [y/n]: ", question).map_err(io)?;
            self.output.flush().map_err(io)?;

            let mut line = String::new();
            if self.input.read_line(&mut line).map_err(io)? == 0 {
                writeln!(self.output).map_err(io)?;
                return Ok(false);
            }
            match parse_answer(&line) {
                Some(answer) => return Ok(answer),
                None => writeln!(self.output, "Please answer 'yes' or 'no'.").map_err(io)?,
            }
        }
    }
}

/// Pick one entry from `items` with an arrow-key menu.
///
/// Returns the chosen index. Escape or `q` cancels.
pub fn select<T: ToString>(
    message: &str,
    items: &[T],
    default: usize,
    interactive: bool,
) -> Result<usize, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }
    Select::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .items(items)
        .default(default)
        .interact_opt()
        .map_err(|e| PromptError::IoError(e.to_string()))?
        .ok_or(PromptError::Cancelled)
}
