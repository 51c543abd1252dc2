use anyhow::{Context, Result};
use clap::Parser;
use llm_council::adapters::build_backend;
use llm_council::utils::logger;
use llm_council::CouncilConfig;
use std::time::Instant;

/// 逐一呼叫每個供應商，確認金鑰與網路設定可用
#[derive(Debug, Parser)]
#[command(name = "council-probe")]
#[command(about = "Send a tiny prompt to every configured provider and report the result")]
struct ProbeArgs {
    #[arg(long, help = "Council TOML file (defaults to the built-in council)")]
    config: Option<String>,

    #[arg(long, default_value = "Reply with the single word: ready")]
    prompt: String,

    #[arg(long, help = "Enable verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ProbeArgs::parse();
    logger::init_cli_logger(args.verbose);

    let config = match &args.config {
        Some(path) => CouncilConfig::from_file(path)
            .with_context(|| format!("Failed to load council config from {}", path))?,
        None => CouncilConfig::builtin().context("Failed to load the built-in council config")?,
    };

    println!("🚀 Probing {} providers", config.providers.len());
    let mut failures = 0;

    for (name, provider) in &config.providers {
        if provider.resolved_api_key().is_none() {
            println!("⚠️  {:<12} skipped: api_key is not set", name);
            failures += 1;
            continue;
        }

        let backend = build_backend(name, provider)
            .with_context(|| format!("Failed to build backend {}", name))?;
        let started = Instant::now();
        match backend.complete(&args.prompt).await {
            Ok(reply) => println!(
                "✅ {:<12} {} ({} ms): {}",
                name,
                provider.model,
                started.elapsed().as_millis(),
                reply.trim().lines().next().unwrap_or_default()
            ),
            Err(e) => {
                failures += 1;
                println!("❌ {:<12} {}: {}", name, provider.model, e);
                println!("   💡 {}", e.recovery_suggestion());
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} providers are not usable", failures, config.providers.len());
    }
    println!("✅ All providers responded");
    Ok(())
}
