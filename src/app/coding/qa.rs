use crate::app::coding::workspace::{is_binary_path, ProjectWorkspace};
use crate::config::toml_config::CodingConfig;
use crate::core::session::Session;
use crate::domain::model::{QaReport, QaStatus, Seat};
use crate::utils::error::Result;
use crate::utils::text::{head_chars, parse_json_reply, strip_code_fences};

/// How a QA run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QaOutcome {
    Passed { round: usize },
    NothingToReview,
    Unparseable,
    /// Issues were still being fixed when the round limit was reached.
    RoundsExhausted,
}

/// Review the given files and let the tertiary seat fix what the reviewer
/// flags, for up to `max_qa_rounds` rounds.
pub async fn run_qa_loop(
    session: &mut Session<'_>,
    workspace: &ProjectWorkspace,
    files: &[String],
    config: &CodingConfig,
) -> Result<QaOutcome> {
    session.say("\n QA ENGINEER is reviewing the code...");

    for round in 1..=config.max_qa_rounds {
        let context = collect_review_context(workspace, files).await;
        if context.is_empty() {
            session.say(" No text files found to review.");
            return Ok(QaOutcome::NothingToReview);
        }

        session.say(&format!("\n QA Round {}/{}...", round, config.max_qa_rounds));
        let prompt = review_prompt(head_chars(&context, config.qa_context_chars));
        let raw = session.consult(Seat::Primary, "qa review", &prompt).await;

        let report = match parse_json_reply::<QaReport>(&raw, "qa report") {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("QA reply could not be parsed: {}", e);
                session.say(&format!("⚠️ QA Parse Error. Raw: {}", raw));
                return Ok(QaOutcome::Unparseable);
            }
        };

        if report.status == QaStatus::Pass {
            session.say("✅ QA PASSED! No critical issues found.");
            return Ok(QaOutcome::Passed { round });
        }
        if report.issues.is_empty() {
            session.say("✅ QA PASSED! (No issues listed)");
            return Ok(QaOutcome::Passed { round });
        }

        session.say(&format!(
            "❌ QA FAILED. Found {} issues. Fixing...",
            report.issues.len()
        ));
        for issue in &report.issues {
            session.say(&format!("  🛠️ Fixing {}: {}...", issue.file, issue.description));
            if !workspace.exists(&issue.file).await {
                session.say(&format!("     -> File {} not found.", issue.file));
                continue;
            }
            let current = match workspace.read_text(&issue.file).await {
                Ok(current) => current,
                Err(e) => {
                    session.say(&format!("     -> Could not read {}: {}", issue.file, e));
                    continue;
                }
            };

            let prompt = fix_prompt(&issue.description, &issue.file, &current);
            let fixed = session
                .consult(Seat::Tertiary, &format!("qa fix {}", issue.file), &prompt)
                .await;
            workspace
                .write_text(&issue.file, &strip_code_fences(&fixed))
                .await?;
            session.say("     -> Fixed.");
        }
    }

    Ok(QaOutcome::RoundsExhausted)
}

/// `--- FILE: path ---` blocks for every readable, non-binary planned file.
async fn collect_review_context(workspace: &ProjectWorkspace, files: &[String]) -> String {
    let mut context = String::new();
    for path in files {
        if is_binary_path(path) || !workspace.exists(path).await {
            continue;
        }
        if let Ok(content) = workspace.read_text(path).await {
            context.push_str(&format!("\n--- FILE: {} ---\n{}\n", path, content));
        }
    }
    context
}

fn review_prompt(project_files: &str) -> String {
    format!(
        r#"You are a Senior QA Engineer.
Review the following project files for bugs, syntax errors, broken links, and logic issues.

CRITICAL CHECKS:
1. Broken Links: Does index.html link to the correct CSS/JS files? (e.g., href="style.css" vs href="src/style.css").
2. Missing Files: Are imported files actually present in the file list?
3. Syntax: Are there any unclosed tags or syntax errors?

Project Files:
{project_files}

Return ONLY a JSON object with this format:
{{
    "status": "PASS" or "FAIL",
    "issues": [
        {{"file": "filename", "description": "description of the bug"}}
    ]
}}
"#
    )
}

fn fix_prompt(description: &str, file: &str, current: &str) -> String {
    format!(
        "You are a Senior Developer.\n\
         Fix this specific bug identified by QA: \"{description}\"\n\
         File: {file}\n\n\
         Current Content:\n{current}\n\n\
         Return ONLY the COMPLETE fixed code. No markdown.\n"
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

    async fn workspace_with(files: &[(&str, &str)]) -> (TempDir, ProjectWorkspace) {
        let dir = TempDir::new().unwrap();
        let ws = ProjectWorkspace::open(dir.path()).await.unwrap();
        for (path, content) in files {
            ws.write_text(path, content).await.unwrap();
        }
        (dir, ws)
    }

    fn paths(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_failing_review_triggers_fix_then_passes() {
        let (_dir, ws) = workspace_with(&[
            ("index.html", "<link href=\"src/style.css\">"),
            ("style.css", "body {}"),
        ])
        .await;
        let reviewer = ScriptedBackend::named("gemini")
            .reply(r#"{"status": "FAIL", "issues": [{"file": "index.html", "description": "wrong css path"}, {"file": "gone.js", "description": "missing"}]}"#)
            .reply(r#"{"status": "PASS", "issues": []}"#);
        let fixer = ScriptedBackend::named("openrouter")
            .reply("```html\n<link href=\"style.css\">\n```");
        let council = Council::new(reviewer.arc(), ScriptedBackend::named("groq").arc(), fixer.arc());
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let mut session = Session::new(&council, &mut console, Mode::Coding, "site", true);

        let outcome = run_qa_loop(
            &mut session,
            &ws,
            &paths(&["index.html", "style.css", "logo.png"]),
            &CodingConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, QaOutcome::Passed { round: 2 });
        assert_eq!(ws.read_text("index.html").await.unwrap(), "<link href=\"style.css\">");
        assert!(reviewer.prompts()[0].contains("--- FILE: style.css ---\nbody {}"));
        assert!(fixer.prompts()[0].contains("wrong css path"));
        assert!(console.output().contains("-> File gone.js not found."));
    }

    #[tokio::test]
    async fn test_unparseable_review_stops_loop() {
        let (_dir, ws) = workspace_with(&[("main.py", "print(1)")]).await;
        let reviewer = ScriptedBackend::named("gemini").otherwise("Looks fine to me!");
        let council = Council::new(
            reviewer.arc(),
            ScriptedBackend::named("groq").arc(),
            ScriptedBackend::named("openrouter").arc(),
        );
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let mut session = Session::new(&council, &mut console, Mode::Coding, "script", true);

        let outcome = run_qa_loop(&mut session, &ws, &paths(&["main.py"]), &CodingConfig::default())
            .await
            .unwrap();

        assert_eq!(outcome, QaOutcome::Unparseable);
        assert_eq!(reviewer.calls(), 1);
    }

    #[tokio::test]
    async fn test_context_is_truncated_and_rounds_are_bounded() {
        let big = "a".repeat(200);
        let (_dir, ws) = workspace_with(&[("app.js", &big)]).await;
        let reviewer = ScriptedBackend::named("gemini")
            .otherwise(r#"{"status": "FAIL", "issues": [{"file": "app.js", "description": "too long"}]}"#);
        let fixer = ScriptedBackend::named("openrouter").otherwise(&big);
        let council = Council::new(reviewer.arc(), ScriptedBackend::named("groq").arc(), fixer.arc());
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let mut session = Session::new(&council, &mut console, Mode::Coding, "js", true);
        let config = CodingConfig {
            max_qa_rounds: 2,
            qa_context_chars: 50,
            ..CodingConfig::default()
        };

        let outcome = run_qa_loop(&mut session, &ws, &paths(&["app.js"]), &config)
            .await
            .unwrap();

        assert_eq!(outcome, QaOutcome::RoundsExhausted);
        assert_eq!(reviewer.calls(), 2);
        assert!(!reviewer.prompts()[0].contains(&big));
    }

    #[tokio::test]
    async fn test_nothing_to_review() {
        let (_dir, ws) = workspace_with(&[]).await;
        let reviewer = ScriptedBackend::named("gemini");
        let council = Council::new(
            reviewer.arc(),
            ScriptedBackend::named("groq").arc(),
            ScriptedBackend::named("openrouter").arc(),
        );
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let mut session = Session::new(&council, &mut console, Mode::Coding, "x", true);

        let outcome = run_qa_loop(&mut session, &ws, &paths(&["missing.html"]), &CodingConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome, QaOutcome::NothingToReview);
        assert_eq!(reviewer.calls(), 0);
    }
}
