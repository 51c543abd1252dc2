use crate::app::coding::CodingTask;
use crate::config::toml_config::CouncilConfig;
use crate::domain::model::Mode;
use crate::utils::error::{CouncilError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "llm-council")]
#[command(about = "Ask three LLMs at once: consensus, debate, creative, team coding and voting")]
pub struct CliConfig {
    #[arg(long, help = "Council TOML file (defaults to the built-in gemini/groq/openrouter council)")]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Directory to save session transcripts in")]
    pub transcripts: Option<String>,

    #[arg(long, help = "Keep markdown formatting in replies")]
    pub raw: bool,

    #[arg(long, help = "Run one mode and exit: consensus, debate, creative, coding or voting")]
    pub mode: Option<Mode>,

    #[arg(long, help = "Prompt for --mode")]
    pub prompt: Option<String>,

    #[arg(long, help = "Project name for a new coding project")]
    pub project: Option<String>,

    #[arg(long, help = "Path of an existing project to repair (coding mode)")]
    pub repair: Option<String>,

    #[arg(long, help = "Where new coding projects are created")]
    pub projects_dir: Option<String>,
}

impl CliConfig {
    /// Council configuration with command-line overrides applied.
    pub fn load_council_config(&self) -> Result<CouncilConfig> {
        let mut council = match &self.config {
            Some(path) => CouncilConfig::from_file(path)?,
            None => CouncilConfig::builtin()?,
        };

        if let Some(dir) = &self.transcripts {
            council.output.transcripts_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.projects_dir {
            council.coding.projects_dir = dir.clone();
        }
        if self.raw {
            council.output.strip_markdown = false;
        }
        if self.monitor {
            council.monitoring = Some(crate::config::toml_config::MonitoringConfig { enabled: true });
        }

        council.validate()?;
        Ok(council)
    }

    /// One-shot coding runs never ask interactively for the project.
    pub fn coding_task(&self) -> CodingTask {
        match &self.repair {
            Some(path) => CodingTask::Repair {
                path: Some(PathBuf::from(path)),
            },
            None => CodingTask::Create {
                project_name: Some(
                    self.project
                        .clone()
                        .unwrap_or_else(|| crate::app::coding::DEFAULT_PROJECT_NAME.to_string()),
                ),
            },
        }
    }

    pub fn is_one_shot(&self) -> bool {
        self.mode.is_some()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            validation::validate_path("config", path)?;
        }
        if let Some(dir) = &self.transcripts {
            validation::validate_path("transcripts", dir)?;
        }
        if let Some(name) = &self.project {
            validation::validate_project_name(name)?;
        }

        match (&self.mode, &self.prompt) {
            (Some(_), None) => {
                return Err(CouncilError::MissingConfigError {
                    field: "prompt".to_string(),
                })
            }
            (None, Some(_)) => {
                return Err(CouncilError::MissingConfigError {
                    field: "mode".to_string(),
                })
            }
            (Some(_), Some(prompt)) => validation::validate_non_empty_string("prompt", prompt)?,
            (None, None) => {}
        }

        if self.project.is_some() && self.repair.is_some() {
            return Err(CouncilError::ConfigValidationError {
                field: "repair".to_string(),
                message: "--project and --repair cannot be used together".to_string(),
            });
        }
        Ok(())
    }
}
