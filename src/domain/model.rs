use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the three backend slots a mode hands roles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    Primary,
    Secondary,
    Tertiary,
}

impl Seat {
    pub const ALL: [Seat; 3] = [Seat::Primary, Seat::Secondary, Seat::Tertiary];

    pub fn index(self) -> usize {
        match self {
            Seat::Primary => 0,
            Seat::Secondary => 1,
            Seat::Tertiary => 2,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Seat::Primary => "primary",
            Seat::Secondary => "secondary",
            Seat::Tertiary => "tertiary",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Consensus,
    Debate,
    Creative,
    Coding,
    Voting,
}

impl Mode {
    pub fn title(self) -> &'static str {
        match self {
            Mode::Consensus => "Consensus Builder",
            Mode::Debate => "Debate Mode",
            Mode::Creative => "Discussion Mode (Creative)",
            Mode::Coding => "Team Coding",
            Mode::Voting => "Weighted Voting",
        }
    }

    /// 選單編號 (1-5)
    pub fn from_menu_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Mode::Consensus),
            "2" => Some(Mode::Debate),
            "3" => Some(Mode::Creative),
            "4" => Some(Mode::Coding),
            "5" => Some(Mode::Voting),
            _ => None,
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "consensus" => Ok(Mode::Consensus),
            "debate" => Ok(Mode::Debate),
            "creative" | "discussion" => Ok(Mode::Creative),
            "coding" | "team-coding" => Ok(Mode::Coding),
            "voting" => Ok(Mode::Voting),
            other => Err(format!(
                "unknown mode '{}' (expected consensus, debate, creative, coding or voting)",
                other
            )),
        }
    }
}

/// A seat's answer. `failed` marks replies that are a stringified error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatReply {
    pub seat: Seat,
    pub backend: String,
    pub text: String,
    pub failed: bool,
}

/// Planned file tree: relative path and its purpose, in the architect's order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilePlan {
    pub entries: Vec<PlannedFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFile {
    pub path: String,
    pub purpose: String,
}

impl PlannedFile {
    /// Entries like `assets/` or `src/components` name directories, not files.
    pub fn is_directory(&self) -> bool {
        if self.path.ends_with('/') {
            return true;
        }
        let base = self.path.rsplit('/').next().unwrap_or(&self.path);
        !base.contains('.')
    }
}

impl FilePlan {
    pub fn paths(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QaStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaIssue {
    pub file: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaReport {
    pub status: QaStatus,
    #[serde(default)]
    pub issues: Vec<QaIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeFix {
    pub file: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub files_to_fix: Option<Vec<String>>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteVerdict {
    /// 評審可能給出 8.5 之類的小數分數
    pub scores: BTreeMap<String, f64>,
    pub judge_perspective: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeOutcome {
    Skipped,
    Passed,
    ServerRunning { url: Option<String> },
    Failed { attempts: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: String,
    pub label: String,
    pub text: String,
}

/// Record of one mode run, optionally saved as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub mode: Mode,
    pub prompt: String,
    pub started_at: DateTime<Utc>,
    pub entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new(mode: Mode, prompt: &str) -> Self {
        Self {
            mode,
            prompt: prompt.to_string(),
            started_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, speaker: &str, label: &str, text: &str) {
        self.entries.push(TranscriptEntry {
            speaker: speaker.to_string(),
            label: label.to_string(),
            text: text.to_string(),
        });
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}-{}.json",
            self.started_at.format("%Y%m%d-%H%M%S%.3f"),
            serde_json::to_value(self.mode)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| "session".to_string())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_entries() {
        let dir = PlannedFile {
            path: "assets/".to_string(),
            purpose: String::new(),
        };
        let bare = PlannedFile {
            path: "src/components".to_string(),
            purpose: String::new(),
        };
        let file = PlannedFile {
            path: "src/app.js".to_string(),
            purpose: String::new(),
        };
        let dotfile = PlannedFile {
            path: ".gitignore".to_string(),
            purpose: String::new(),
        };
        assert!(dir.is_directory());
        assert!(bare.is_directory());
        assert!(!file.is_directory());
        assert!(!dotfile.is_directory());
    }

    #[test]
    fn test_qa_report_wire_format() {
        let report: QaReport = serde_json::from_str(
            r#"{"status": "FAIL", "issues": [{"file": "index.html", "description": "broken link"}]}"#,
        )
        .unwrap();
        assert_eq!(report.status, QaStatus::Fail);
        assert_eq!(report.issues[0].file, "index.html");

        let pass: QaReport = serde_json::from_str(r#"{"status": "PASS"}"#).unwrap();
        assert!(pass.issues.is_empty());
    }

    #[test]
    fn test_menu_choices() {
        assert_eq!(Mode::from_menu_choice("4"), Some(Mode::Coding));
        assert_eq!(Mode::from_menu_choice(" 1 "), Some(Mode::Consensus));
        assert_eq!(Mode::from_menu_choice("9"), None);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!("Voting".parse::<Mode>(), Ok(Mode::Voting));
        assert_eq!("discussion".parse::<Mode>(), Ok(Mode::Creative));
        assert!("chat".parse::<Mode>().is_err());
    }

    #[test]
    fn test_transcript_file_name() {
        let transcript = Transcript::new(Mode::Voting, "tabs or spaces");
        assert!(transcript.file_name().ends_with("-voting.json"));
    }

    #[test]
    fn test_transcript_file_names_differ_within_a_second() {
        let first = Transcript::new(Mode::Debate, "a");
        let mut second = first.clone();
        second.started_at = first.started_at + chrono::Duration::milliseconds(250);
        assert_ne!(first.file_name(), second.file_name());
    }

    #[test]
    fn test_vote_verdict_accepts_fractional_scores() {
        let verdict: VoteVerdict = serde_json::from_str(
            r#"{"scores": {"gemini": 8.5, "groq": 7}, "judge_perspective": "close"}"#,
        )
        .unwrap();
        assert_eq!(verdict.scores["gemini"], 8.5);
        assert_eq!(verdict.scores["groq"], 7.0);
    }
}
