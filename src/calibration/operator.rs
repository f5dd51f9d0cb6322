// Operator interaction for the guided calibration
//
// The procedure talks to the person at the bench only through this trait,
// so the whole workflow can be driven from a script in tests.

use std::io::{BufRead, Write};

/// Question/answer channel to the operator
pub trait Operator {
    /// Show `prompt` and return the answer line without its line ending.
    /// `None` means the input was closed.
    fn ask(&mut self, prompt: &str) -> Option<String>;

    /// Show an informational line
    fn tell(&mut self, message: &str);
}

/// Operator on a line-based terminal (stdin/stdout in the binary)
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Destroys the operator and returns its output, e.g. to inspect a transcript.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        let _ = write!(self.output, "{}", prompt);
        let _ = self.output.flush();

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn tell(&mut self, message: &str) {
        let _ = writeln!(self.output, "{}", message);
    }
}
