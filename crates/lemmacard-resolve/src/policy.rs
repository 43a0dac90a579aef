//! Decision points of a resolution: which sense, which base word, and whether
//! to trade a sense for its base word.

use std::io::{self, BufRead, Write};

use tracing::debug;

/// Supplies every choice the engine cannot make on its own.
pub trait DisambiguationPolicy {
    /// Pick a value in `min..=max` (1-based). `prompt` describes the options.
    fn select_one(&mut self, min: usize, max: usize, prompt: &str) -> io::Result<usize>;

    /// Answer a yes/no question.
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;
}

impl<P: DisambiguationPolicy + ?Sized> DisambiguationPolicy for &mut P {
    fn select_one(&mut self, min: usize, max: usize, prompt: &str) -> io::Result<usize> {
        (**self).select_one(min, max, prompt)
    }

    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        (**self).confirm(prompt)
    }
}

/// Never asks anyone: takes the first option and answers confirmations with a
/// fixed default. Safe for batch runs and servers.
#[derive(Clone, Copy, Debug)]
pub struct Automatic {
    confirm_default: bool,
}

impl Automatic {
    /// Defaults to answering "yes", i.e. preferring the base word.
    pub fn new() -> Self {
        Self {
            confirm_default: true,
        }
    }

    pub fn with_confirm_default(confirm_default: bool) -> Self {
        Self { confirm_default }
    }
}

impl Default for Automatic {
    fn default() -> Self {
        Self::new()
    }
}

impl DisambiguationPolicy for Automatic {
    fn select_one(&mut self, min: usize, _max: usize, _prompt: &str) -> io::Result<usize> {
        Ok(min)
    }

    fn confirm(&mut self, _prompt: &str) -> io::Result<bool> {
        Ok(self.confirm_default)
    }
}

/// Asks a human over a line-oriented text stream, re-prompting until the
/// answer is valid. Closed input is reported as `UnexpectedEof`.
pub struct Interactive<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Interactive<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_answer(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for a selection",
            ));
        }
        Ok(line.trim().to_lowercase())
    }
}

impl Interactive<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> DisambiguationPolicy for Interactive<R, W> {
    fn select_one(&mut self, min: usize, max: usize, prompt: &str) -> io::Result<usize> {
        writeln!(self.output, "{prompt}")?;
        loop {
            let answer = self.read_answer(&format!("Select ({min}-{max}): "))?;
            match answer.parse::<usize>() {
                Ok(selection) if (min..=max).contains(&selection) => {
                    debug!("user selected {selection}");
                    return Ok(selection);
                }
                _ => writeln!(self.output, "Please input a value between {min} and {max}")?,
            }
        }
    }

    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        writeln!(self.output, "{prompt}")?;
        loop {
            match self.read_answer("Enter selection (y/n): ")?.as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => {}
            }
        }
    }
}
