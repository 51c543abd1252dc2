use crate::domain::ports::Console;
use crate::utils::error::Result;
use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// Interactive terminal: prompts on stdout, answers from stdin.
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn say(&mut self, line: &str) {
        println!("{}", line);
    }

    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Pre-scripted answers; everything said is kept for inspection.
///
/// Used by one-shot CLI runs (no follow-up questions) and by tests.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    pub transcript: Vec<String>,
    echo: bool,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
            echo: false,
        }
    }

    /// Also print everything to stdout.
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    pub fn output(&self) -> String {
        self.transcript.join("\n")
    }
}

impl Console for ScriptedConsole {
    fn say(&mut self, line: &str) {
        if self.echo {
            println!("{}", line);
        }
        self.transcript.push(line.to_string());
    }

    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.transcript.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_console_answers_in_order() {
        let mut console = ScriptedConsole::new(["first", "second"]);
        console.say("hello");
        assert_eq!(console.ask("? ").unwrap().as_deref(), Some("first"));
        assert_eq!(console.ask("? ").unwrap().as_deref(), Some("second"));
        assert_eq!(console.ask("? ").unwrap(), None);
        assert_eq!(console.transcript[0], "hello");
        assert!(console.output().contains("? "));
    }
}
