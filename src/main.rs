use clap::Parser;
use llm_council::config::toml_config::CodingConfig;
use llm_council::domain::ports::Console;
use llm_council::utils::error::CouncilError;
use llm_council::utils::{logger, validation::Validate};
use llm_council::{
    CliConfig, CodingTask, ConsensusMode, Council, CouncilMode, CreativeMode, DebateMode,
    LocalStorage, Mode, ModeEngine, ScriptedConsole, StdConsole, TeamCodingMode, VotingMode,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting llm-council");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證參數
    if let Err(e) = cli.validate() {
        tracing::error!("❌ Argument validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let config = match cli.load_council_config() {
        Ok(config) => config,
        Err(e) => std::process::exit(report_failure(&e)),
    };
    if config.monitoring_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let council = match Council::from_config(&config) {
        Ok(council) => council,
        Err(e) => std::process::exit(report_failure(&e)),
    };

    let mut engine = ModeEngine::<LocalStorage>::new(council)
        .with_monitoring(config.monitoring_enabled())
        .with_markdown_stripping(config.output.strip_markdown);
    if let Some(dir) = &config.output.transcripts_dir {
        engine = engine.with_transcripts(LocalStorage::new(dir));
    }

    // 單次執行
    if let (Some(mode), Some(prompt)) = (cli.mode, cli.prompt.as_deref()) {
        let runner = build_mode(mode, &config.coding, cli.coding_task());
        let mut console = ScriptedConsole::new(Vec::<String>::new()).echoing();
        let result = engine.run(runner.as_ref(), prompt, &mut console).await;
        engine.finish();

        if let Err(e) = result {
            let exit_code = report_failure(&e);
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
        return Ok(());
    }

    run_menu(&engine, &config.coding, &mut StdConsole).await?;
    engine.finish();
    Ok(())
}

fn build_mode(mode: Mode, coding: &CodingConfig, task: CodingTask) -> Box<dyn CouncilMode> {
    match mode {
        Mode::Consensus => Box::new(ConsensusMode),
        Mode::Debate => Box::new(DebateMode),
        Mode::Creative => Box::new(CreativeMode),
        Mode::Coding => Box::new(TeamCodingMode::new(coding.clone(), task)),
        Mode::Voting => Box::new(VotingMode),
    }
}

async fn run_menu(
    engine: &ModeEngine<LocalStorage>,
    coding: &CodingConfig,
    console: &mut dyn Console,
) -> Result<(), CouncilError> {
    loop {
        console.say("\n=================================");
        console.say("   🤖 MULTI-LLM COLLABORATION    ");
        console.say("=================================");
        for choice in ["1", "2", "3", "4", "5"] {
            if let Some(mode) = Mode::from_menu_choice(choice) {
                console.say(&format!("{}. {}", choice, mode.title()));
            }
        }
        console.say("6. Exit");

        let Some(choice) = console.ask("\nSelect a mode (1-6): ")? else {
            break;
        };
        if choice.trim() == "6" {
            break;
        }

        let Some(mode) = Mode::from_menu_choice(&choice) else {
            console.say("Invalid choice!");
            continue;
        };

        let (task, question) = if mode == Mode::Coding {
            console.say("\n TEAM CODING MODE");
            console.say("1. Create a new project from scratch");
            console.say("2. Fix an existing project");
            let Some(team_choice) = console.ask("\nSelect (1 or 2): ")? else {
                break;
            };
            if team_choice.trim() == "2" {
                (
                    CodingTask::Repair { path: None },
                    "Describe what to fix (e.g., 'Fix all CSS issues', 'Debug login bug'): ",
                )
            } else {
                (
                    CodingTask::Create { project_name: None },
                    "Describe your project (e.g., 'Create a luxury watch landing page'): ",
                )
            }
        } else {
            (
                CodingTask::Create { project_name: None },
                "Enter your topic/problem: ",
            )
        };

        let Some(prompt) = console.ask(question)? else {
            break;
        };

        let runner = build_mode(mode, coding, task);
        if let Err(e) = engine.run(runner.as_ref(), &prompt, &mut *console).await {
            // 互動模式下只回報錯誤，回到選單
            report_failure(&e);
        }

        if console.ask("\nPress Enter to continue...")?.is_none() {
            break;
        }
    }
    Ok(())
}

fn report_failure(e: &CouncilError) -> i32 {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Council run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    e.exit_code()
}
