use crate::core::council::Council;
use crate::domain::model::{Mode, Seat, Transcript};
use crate::domain::ports::Console;
use crate::utils::text::strip_markdown;

/// Everything a running mode touches: the council, the terminal and the record.
pub struct Session<'a> {
    pub council: &'a Council,
    pub console: &'a mut dyn Console,
    pub transcript: Transcript,
    pub strip_markdown: bool,
}

impl<'a> Session<'a> {
    pub fn new(
        council: &'a Council,
        console: &'a mut dyn Console,
        mode: Mode,
        prompt: &str,
        strip_markdown: bool,
    ) -> Self {
        Self {
            council,
            console,
            transcript: Transcript::new(mode, prompt),
            strip_markdown,
        }
    }

    pub fn say(&mut self, line: &str) {
        self.console.say(line);
    }

    /// Print a labelled reply. Replies from `consult` are already recorded.
    pub fn present(&mut self, label: &str, text: &str) {
        let shown = if self.strip_markdown {
            strip_markdown(text)
        } else {
            text.to_string()
        };
        self.console.say(&format!("{}:\n{}\n", label, shown));
    }

    /// Same as `present` but never strips markdown.
    pub fn present_raw(&mut self, label: &str, text: &str) {
        self.console.say(&format!("{}:\n{}\n", label, text));
    }

    /// Catch-all consultation that is also recorded in the transcript.
    pub async fn consult(&mut self, seat: Seat, label: &str, prompt: &str) -> String {
        let council = self.council;
        let reply = council.consult(seat, prompt).await;
        let speaker = council.backend_name(seat).to_string();
        self.transcript.record(&speaker, label, &reply);
        reply
    }

    pub fn record(&mut self, speaker: &str, label: &str, text: &str) {
        self.transcript.record(speaker, label, text);
    }

    pub fn speaker(&self, seat: Seat) -> String {
        self.council.backend_name(seat).to_string()
    }
}
