//! Runtime verification: start the generated project, and when it crashes
//! hand the error log to the tertiary seat for a fix.

use crate::app::coding::workspace::ProjectWorkspace;
use crate::config::toml_config::CodingConfig;
use crate::core::session::Session;
use crate::domain::model::{RuntimeFix, RuntimeOutcome, Seat};
use crate::utils::error::{CouncilError, Result};
use crate::utils::text::{first_url, parse_json_reply, tail_chars};
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

const SHOWN_LOG_CHARS: usize = 1000;
/// 子程序結束後等待輸出管線清空的時間
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// How to start a project: an optional install step, then the start command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub kind: &'static str,
    pub install: Option<Vec<String>>,
    pub start: Vec<String>,
}

impl LaunchPlan {
    pub fn command_line(&self) -> String {
        self.start.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    Exited {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// Still alive at the deadline and killed; output captured so far.
    TimedOut { output: String },
}

/// Node when `package.json` exists, Python when the root holds a `.py` file.
pub async fn detect_launch(workspace: &ProjectWorkspace) -> Result<Option<LaunchPlan>> {
    let root_files = workspace.root_files().await?;
    let args = |parts: &[&str]| parts.iter().map(|p| p.to_string()).collect::<Vec<_>>();

    if root_files.iter().any(|name| name == "package.json") {
        return Ok(Some(LaunchPlan {
            kind: "Node.js",
            install: Some(args(&["npm", "install"])),
            start: args(&["npm", "start"]),
        }));
    }

    let python_files: Vec<&String> = root_files.iter().filter(|name| name.ends_with(".py")).collect();
    if let Some(first) = python_files.first() {
        let entry = if python_files.iter().any(|name| *name == "main.py") {
            "main.py"
        } else {
            first.as_str()
        };
        return Ok(Some(LaunchPlan {
            kind: "Python",
            install: None,
            start: args(&["python3", entry]),
        }));
    }

    Ok(None)
}

/// Run `command` in `cwd`, killing it if it outlives `limit`.
pub async fn run_with_timeout(cwd: &Path, command: &[String], limit: Duration) -> Result<RunResult> {
    let (program, args) = command.split_first().ok_or_else(|| CouncilError::ProcessError {
        command: String::new(),
        message: "empty command".to_string(),
    })?;

    let mut builder = Command::new(program);
    builder
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // 自成程序群組，逾時時連同 npm 啟動的 node 等孫程序一起終止
    #[cfg(unix)]
    builder.process_group(0);

    let mut child = builder.spawn().map_err(|e| CouncilError::ProcessError {
        command: command.join(" "),
        message: e.to_string(),
    })?;

    let stdout = Arc::new(Mutex::new(Vec::new()));
    let stderr = Arc::new(Mutex::new(Vec::new()));
    let stdout_task = drain(child.stdout.take(), Arc::clone(&stdout));
    let stderr_task = drain(child.stderr.take(), Arc::clone(&stderr));

    match tokio::time::timeout(limit, child.wait()).await {
        Ok(status) => {
            let status = status?;
            settle(stdout_task).await;
            settle(stderr_task).await;
            Ok(RunResult::Exited {
                code: status.code(),
                stdout: captured(&stdout),
                stderr: captured(&stderr),
            })
        }
        Err(_) => {
            terminate(&mut child, command);
            let _ = tokio::time::timeout(DRAIN_GRACE, child.wait()).await;
            settle(stdout_task).await;
            settle(stderr_task).await;
            Ok(RunResult::TimedOut {
                output: format!("{}{}", captured(&stdout), captured(&stderr)),
            })
        }
    }
}

/// Kill the child's whole process group, falling back to the child alone.
fn terminate(child: &mut Child, command: &[String]) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // SAFETY: killpg 只送出訊號，pid 是 process_group(0) 建立的群組 id
        if unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) } == 0 {
            return;
        }
        tracing::debug!(
            "killpg failed for '{}': {}",
            command.join(" "),
            std::io::Error::last_os_error()
        );
    }
    if let Err(e) = child.start_kill() {
        tracing::warn!("Could not kill '{}': {}", command.join(" "), e);
    }
}

fn drain<R>(reader: Option<R>, sink: Arc<Mutex<Vec<u8>>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(mut reader) = reader else {
            return;
        };
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if let Ok(mut sink) = sink.lock() {
                        sink.extend_from_slice(&buf[..n]);
                    }
                }
            }
        }
    })
}

/// Wait briefly for a drain task; grandchildren may keep the pipe open.
async fn settle(task: JoinHandle<()>) {
    let abort = task.abort_handle();
    if tokio::time::timeout(DRAIN_GRACE, task).await.is_err() {
        abort.abort();
    }
}

fn captured(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
    buffer
        .lock()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Detect how to start the project and verify it runs.
pub async fn run_runtime_loop(
    session: &mut Session<'_>,
    workspace: &ProjectWorkspace,
    config: &CodingConfig,
) -> Result<RuntimeOutcome> {
    session.say("\n RUNTIME VERIFICATION (Running the code in terminal)...");

    let Some(plan) = detect_launch(workspace).await? else {
        session.say("   ⚠️ Unknown project type. Skipping runtime verification.");
        return Ok(RuntimeOutcome::Skipped);
    };
    session.say(&format!("   -> Detected {} project.", plan.kind));
    install_and_verify(session, workspace, &plan, config).await
}

/// Run the optional install step, then verify the start command. A failed
/// install is reported and verification goes ahead anyway.
pub async fn install_and_verify(
    session: &mut Session<'_>,
    workspace: &ProjectWorkspace,
    plan: &LaunchPlan,
    config: &CodingConfig,
) -> Result<RuntimeOutcome> {
    if let Some(install) = &plan.install {
        session.say(&format!("   📦 Installing dependencies ({})...", install.join(" ")));
        let limit = Duration::from_secs(config.install_timeout_secs);
        match run_with_timeout(workspace.root(), install, limit).await {
            Ok(RunResult::Exited { code: Some(0), .. }) => {}
            Ok(other) => session.say(&format!(
                "   ⚠️ {} failed/timed out. Proceeding anyway... ({})",
                install.join(" "),
                describe(&other)
            )),
            Err(e) => session.say(&format!(
                "   ⚠️ {} failed. Proceeding anyway... Error: {}",
                install.join(" "),
                e
            )),
        }
    }

    verify_launch(session, workspace, plan, config).await
}

/// Run the start command up to `max_runtime_rounds` times, applying the
/// fixer's patch after each crash.
pub async fn verify_launch(
    session: &mut Session<'_>,
    workspace: &ProjectWorkspace,
    plan: &LaunchPlan,
    config: &CodingConfig,
) -> Result<RuntimeOutcome> {
    let command_line = plan.command_line();
    let limit = Duration::from_secs(config.run_timeout_secs);

    for round in 1..=config.max_runtime_rounds {
        session.say(&format!(
            "\n🔄 Runtime Round {}/{}: Executing '{}'...",
            round, config.max_runtime_rounds, command_line
        ));

        let result = match run_with_timeout(workspace.root(), &plan.start, limit).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Runtime verification aborted: {}", e);
                session.say(&format!("   ⚠️ Execution failed: {}", e));
                return Ok(RuntimeOutcome::Failed { attempts: round });
            }
        };

        let (code, stdout, stderr) = match result {
            RunResult::TimedOut { output } => {
                session.say(&format!(
                    "   ✅ App started and ran for {}s without crashing! (Likely a server)",
                    config.run_timeout_secs
                ));
                let url = first_url(&output);
                if let Some(url) = &url {
                    session.say(&format!("\n   🚀 PREVIEW AVAILABLE AT: {}", url));
                    session.say("   (Open this link in your browser to see the app)");
                }
                return Ok(RuntimeOutcome::ServerRunning { url });
            }
            RunResult::Exited { code: Some(0), .. } => {
                session.say("   ✅ App finished successfully (Exit Code 0).");
                return Ok(RuntimeOutcome::Passed);
            }
            RunResult::Exited { code, stdout, stderr } => (code, stdout, stderr),
        };

        let exit = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
        session.say(&format!("   ❌ Runtime Error (Exit Code {})", exit));
        let error_log = format!("{}\n{}", stderr, stdout).trim().to_string();
        session.say(&format!(
            "    Error Log:\n{}",
            tail_chars(&error_log, SHOWN_LOG_CHARS)
        ));

        session.say("   🛠️ Attempting to fix runtime error...");
        let prompt = fix_prompt(&command_line, tail_chars(&error_log, config.error_log_chars));
        let raw = session.consult(Seat::Tertiary, "runtime fix", &prompt).await;

        match parse_json_reply::<RuntimeFix>(&raw, "runtime fix") {
            Ok(fix) => match workspace.write_text(&fix.file, &fix.code).await {
                Ok(()) => session.say(&format!("   ✅ Updated {} based on runtime error.", fix.file)),
                Err(e) => session.say(&format!("   ⚠️ Could not write {}: {}", fix.file, e)),
            },
            Err(e) => {
                tracing::warn!("Runtime fix could not be parsed: {}", e);
                session.say(&format!("   ⚠️ Failed to parse fix response. Raw: {}", raw));
            }
        }
    }

    Ok(RuntimeOutcome::Failed {
        attempts: config.max_runtime_rounds,
    })
}

fn describe(result: &RunResult) -> String {
    match result {
        RunResult::Exited { code, stderr, .. } => format!(
            "exit code {}: {}",
            code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
            tail_chars(stderr.trim(), 200)
        ),
        RunResult::TimedOut { .. } => "timed out".to_string(),
    }
}

fn fix_prompt(command: &str, error_log: &str) -> String {
    format!(
        r#"You are a Senior DevOps/Developer.
The application failed to run.
Command: {command}
Error Log:
{error_log}

Analyze the error. It might be a missing dependency, a syntax error, or a configuration issue.
Identify the file that needs fixing and provide the FULL fixed content.

Return ONLY a JSON object with this format:
{{
    "file": "filename",
    "code": "full fixed code"
}}
"#
    )
}
