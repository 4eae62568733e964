use std::io::{BufRead, Write};

/// Interactive gate in front of destructive actions.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Asks on the terminal; anything but `y`/`yes` declines.
///
/// The prompt goes to stderr so `--json` output on stdout stays parseable.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        ask(std::io::stdin().lock(), std::io::stderr().lock(), prompt)
    }
}

fn ask(mut input: impl BufRead, mut output: impl Write, prompt: &str) -> bool {
    if write!(output, "{prompt} [y/N] ").is_err() || output.flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }

    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}
