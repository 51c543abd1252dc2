use crate::app::coding::workspace::ProjectWorkspace;
use crate::core::session::Session;
use crate::domain::model::Seat;
use crate::utils::error::Result;
use crate::utils::text::strip_code_fences;

const PROMPT: &str = " Senior Dev Mode (e.g., 'Fix bug in main.py', 'Exit'): ";

/// Follow-up requests against the generated files until `exit`, `quit` or EOF.
/// Returns how many files were rewritten.
pub async fn interactive_fix_loop(
    session: &mut Session<'_>,
    workspace: &ProjectWorkspace,
    planned: &[String],
) -> Result<usize> {
    let mut updated = 0;
    loop {
        session.say("\n------------------------------------------------");
        let Some(line) = session.console.ask(PROMPT)? else {
            break;
        };
        let request = line.trim();
        if request.eq_ignore_ascii_case("exit") || request.eq_ignore_ascii_case("quit") {
            break;
        }

        let Some(target) = planned.iter().find(|path| request.contains(path.as_str())) else {
            session.say("⚠️ Could not identify which file to fix. Please mention the filename exactly.");
            continue;
        };
        if !workspace.exists(target).await {
            session.say(&format!("⚠️ File {} not found locally.", target));
            continue;
        }

        let current = workspace.read_text(target).await?;
        session.say(&format!("\n🐞 DEBUGGER is analyzing {}...", target));
        let reply = session
            .consult(Seat::Tertiary, &format!("debug {}", target), &debug_prompt(request, target, &current))
            .await;
        workspace.write_text(target, &strip_code_fences(&reply)).await?;
        session.say(&format!("✅ Updated {}", target));
        updated += 1;
    }
    Ok(updated)
}

fn debug_prompt(request: &str, target: &str, current: &str) -> String {
    format!(
        "You are a Senior Developer with 20+ years of experience.\n\
         User Request: \"{request}\"\n\n\
         Current File Content ({target}):\n{current}\n\n\
         Return the COMPLETE fixed code for this file.\n\
         Return ONLY the code. No markdown.\n"
    )
}
