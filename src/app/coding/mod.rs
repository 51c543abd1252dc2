//! Team coding: the council plans, writes, reviews, runs and repairs a project
//! on disk.
//!
//! Seat roles: primary is the architect, QA reviewer and analyst; secondary is
//! the coder; tertiary handles every fix and retry.

pub mod architect;
pub mod builder;
pub mod interactive;
pub mod qa;
pub mod repair;
pub mod runtime;
pub mod workspace;

use crate::config::toml_config::CodingConfig;
use crate::core::engine::CouncilMode;
use crate::core::session::Session;
use crate::domain::model::{Mode, Seat};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use self::architect::{architect_prompt, parse_file_plan};
use self::builder::generate_file;
use self::interactive::interactive_fix_loop;
use self::qa::run_qa_loop;
use self::repair::repair_project;
use self::runtime::run_runtime_loop;
use self::workspace::ProjectWorkspace;

pub const DEFAULT_PROJECT_NAME: &str = "GeneratedProject";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodingTask {
    /// Build a new project; the name is asked for when not given.
    Create { project_name: Option<String> },
    /// Repair an existing project; the path is asked for when not given.
    Repair { path: Option<PathBuf> },
}

pub struct TeamCodingMode {
    config: CodingConfig,
    task: CodingTask,
}

impl TeamCodingMode {
    pub fn new(config: CodingConfig, task: CodingTask) -> Self {
        Self { config, task }
    }

    async fn create(
        &self,
        session: &mut Session<'_>,
        request: &str,
        project_name: Option<&str>,
    ) -> Result<()> {
        let name = match project_name {
            Some(name) => name.trim().to_string(),
            None => session
                .console
                .ask("Enter a name for your project (e.g., 'CalculatorApp'): ")?
                .map(|name| name.trim().to_string())
                .unwrap_or_default(),
        };
        let name = if name.is_empty() {
            DEFAULT_PROJECT_NAME.to_string()
        } else {
            name
        };

        let workspace = ProjectWorkspace::create(Path::new(&self.config.projects_dir), &name).await?;
        session.say(&format!("\n📂 Created directory: {}", workspace.root().display()));

        session.say("\n  ARCHITECT is planning the file structure...");
        let raw = session
            .consult(Seat::Primary, "file plan", &architect_prompt(request))
            .await;
        let plan = match parse_file_plan(&raw) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!("Architecture reply could not be parsed: {}", e);
                session.say(&format!(
                    "⚠️ Failed to parse architecture JSON. Raw output:\n{}",
                    raw
                ));
                return Ok(());
            }
        };

        session.say("\n  SCAFFOLDER & CODER are building the project...");
        let mut written = Vec::new();
        for file in &plan.entries {
            if let Err(e) = workspace.full_path(&file.path) {
                session.say(&format!("  ⚠️ Skipping {}: {}", file.path, e));
                continue;
            }
            if file.is_directory() {
                workspace.create_dir(&file.path).await?;
                continue;
            }

            session.say(&format!("  - Generating {}...", file.path));
            let code = generate_file(session, request, file, self.config.min_landing_page_chars).await;
            workspace.write_text(&file.path, &code).await?;
            written.push(file.path.clone());
        }
        session.say(&format!("\n✅ Project '{}' built successfully!", name));

        run_qa_loop(session, &workspace, &written, &self.config).await?;
        run_runtime_loop(session, &workspace, &self.config).await?;
        interactive_fix_loop(session, &workspace, &written).await?;
        Ok(())
    }

    async fn repair(&self, session: &mut Session<'_>, request: &str, path: Option<&Path>) -> Result<()> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(
                session
                    .console
                    .ask("Enter the path to the project folder (e.g., './tara-watch'): ")?
                    .unwrap_or_default()
                    .trim(),
            ),
        };
        let workspace = ProjectWorkspace::open(&path).await?;
        repair_project(session, &workspace, request, &self.config).await
    }
}

#[async_trait]
impl CouncilMode for TeamCodingMode {
    fn mode(&self) -> Mode {
        Mode::Coding
    }

    async fn run(&self, session: &mut Session<'_>, request: &str) -> Result<()> {
        session.say("\n AGENTIC TEAM CODING ACTIVATED\n");
        match &self.task {
            CodingTask::Create { project_name } => {
                self.create(session, request, project_name.as_deref()).await
            }
            CodingTask::Repair { path } => self.repair(session, request, path.as_deref()).await,
        }
    }
}
