use crate::app::coding::qa::run_qa_loop;
use crate::app::coding::runtime::run_runtime_loop;
use crate::app::coding::workspace::ProjectWorkspace;
use crate::config::toml_config::CodingConfig;
use crate::core::session::Session;
use crate::domain::model::{ProjectAnalysis, Seat};
use crate::utils::error::Result;
use crate::utils::text::{head_chars, parse_json_reply, strip_code_fences};

const SUMMARY_FILES: usize = 20;
const DEFAULT_FIX_FILES: usize = 10;
const SHOWN_ISSUES: usize = 5;

/// Analyse an existing project, rewrite the files the analyst picks, then
/// run QA and runtime verification over it.
pub async fn repair_project(
    session: &mut Session<'_>,
    workspace: &ProjectWorkspace,
    request: &str,
    config: &CodingConfig,
) -> Result<()> {
    session.say(&format!("\n📂 Reading project from: {}", workspace.root().display()));
    let files = workspace.text_files().await?;
    session.say(&format!("✅ Found {} files to analyze", files.len()));

    session.say("\n🔍 ARCHITECT is analyzing the project...");
    let raw = session
        .consult(Seat::Primary, "analysis", &analysis_prompt(request, &files))
        .await;

    let targets: Vec<String> = match parse_json_reply::<ProjectAnalysis>(&raw, "project analysis") {
        Ok(analysis) => {
            session.say(&format!(
                "\n📊 Project Type: {}",
                analysis.project_type.as_deref().unwrap_or("Unknown")
            ));
            session.say(&format!("🐛 Issues Found: {}", analysis.issues.len()));
            for issue in analysis.issues.iter().take(SHOWN_ISSUES) {
                session.say(&format!("   - {}", issue));
            }
            analysis.files_to_fix.unwrap_or_else(|| {
                files
                    .iter()
                    .take(DEFAULT_FIX_FILES)
                    .map(|(path, _)| path.clone())
                    .collect()
            })
        }
        Err(e) => {
            tracing::warn!("Project analysis could not be parsed: {}", e);
            session.say("⚠️ Could not parse analysis. Proceeding with full project fix...");
            files.iter().map(|(path, _)| path.clone()).collect()
        }
    };

    session.say("\n🛠️ SENIOR DEV is fixing the issues...");
    let mut fixed = 0;
    for target in &targets {
        let Some((path, content)) = files.iter().find(|(path, _)| path == target) else {
            tracing::debug!("Analyst listed {} which was not read", target);
            continue;
        };
        session.say(&format!("  - Fixing {}...", path));
        let prompt = fix_prompt(request, path, head_chars(content, config.fix_context_chars));
        let reply = session
            .consult(Seat::Tertiary, &format!("repair {}", path), &prompt)
            .await;
        workspace.write_text(path, &strip_code_fences(&reply)).await?;
        fixed += 1;
    }
    session.say(&format!("\n✅ Fixed {} files!", fixed));

    let reviewed: Vec<String> = files.into_iter().map(|(path, _)| path).collect();
    run_qa_loop(session, workspace, &reviewed, config).await?;
    run_runtime_loop(session, workspace, config).await?;

    session.say("\n✅ Project fix complete!");
    Ok(())
}

fn analysis_prompt(request: &str, files: &[(String, String)]) -> String {
    let summary = files
        .iter()
        .take(SUMMARY_FILES)
        .map(|(path, content)| format!("- {} ({} chars)", path, content.chars().count()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a Senior Software Architect analyzing an existing project.

Project files:
{summary}

User request: "{request}"

Analyze the project and identify:
1. What type of project is this? (Web app, Python script, React app, etc.)
2. What are the main issues or bugs?
3. What files need to be fixed?
4. What improvements should be made?

Return a JSON object:
{{
    "project_type": "description",
    "issues": ["issue1", "issue2"],
    "files_to_fix": ["file1.js", "file2.py"],
    "recommendations": ["rec1", "rec2"]
}}
"#
    )
}

fn fix_prompt(request: &str, path: &str, content: &str) -> String {
    format!(
        "You are a Senior Developer fixing issues in an existing project.\n\n\
         User Request: \"{request}\"\n\
         File: {path}\n\n\
         Current Content:\n{content}\n\n\
         Fix all issues, bugs, and improve the code quality.\n\
         Return ONLY the COMPLETE fixed code. No markdown, no explanations.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::console::ScriptedConsole;
    use crate::core::council::Council;
    use crate::core::testing::ScriptedBackend;
    use crate::domain::model::Mode;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html><body>old</body></html>").unwrap();
        std::fs::write(dir.path().join("style.css"), "body { colr: red }").unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/x")).unwrap();
        std::fs::write(dir.path().join("node_modules/x/index.js"), "vendored").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_fixes_only_listed_files() {
        let dir = project();
        let ws = ProjectWorkspace::open(dir.path()).await.unwrap();
        let analyst = ScriptedBackend::named("gemini")
            .when(
                "Senior Software Architect",
                r#"{"project_type": "Static site", "issues": ["typo in css"], "files_to_fix": ["style.css", "ghost.js"], "recommendations": []}"#,
            )
            .when("Senior QA Engineer", r#"{"status": "PASS", "issues": []}"#);
        let fixer = ScriptedBackend::named("openrouter").reply("```css\nbody { color: red }\n```");
        let council = Council::new(analyst.arc(), ScriptedBackend::named("groq").arc(), fixer.arc());
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let mut session = Session::new(&council, &mut console, Mode::Coding, "fix css", true);

        repair_project(&mut session, &ws, "fix css", &CodingConfig::default())
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("style.css")).unwrap(),
            "body { color: red }"
        );
        assert_eq!(fixer.calls(), 1);
        let analysis_prompt = &analyst.prompts()[0];
        assert!(analysis_prompt.contains("- style.css (18 chars)"));
        assert!(!analysis_prompt.contains("node_modules"));

        let out = console.output();
        assert!(out.contains("Project Type: Static site"));
        assert!(out.contains("Fixed 1 files!"));
        assert!(out.contains("Skipping runtime verification"));
    }

    #[tokio::test]
    async fn test_unparseable_analysis_fixes_everything() {
        let dir = project();
        let ws = ProjectWorkspace::open(dir.path()).await.unwrap();
        let analyst = ScriptedBackend::named("gemini")
            .when("Senior Software Architect", "The CSS has a typo.")
            .when("Senior QA Engineer", r#"{"status": "PASS"}"#);
        let fixer = ScriptedBackend::named("openrouter").otherwise("fixed");
        let council = Council::new(analyst.arc(), ScriptedBackend::named("groq").arc(), fixer.arc());
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let mut session = Session::new(&council, &mut console, Mode::Coding, "tidy", true);

        repair_project(&mut session, &ws, "tidy", &CodingConfig::default())
            .await
            .unwrap();

        assert_eq!(fixer.calls(), 2);
        assert!(fixer.prompts()[0].contains("File: index.html"));
        assert!(console.output().contains("Proceeding with full project fix"));
    }
}
