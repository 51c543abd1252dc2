use crate::core::council::Council;
use crate::core::session::Session;
use crate::domain::model::{Mode, Transcript};
use crate::domain::ports::{Console, Storage};
use crate::utils::error::Result;
use crate::utils::monitor::SessionMonitor;
use async_trait::async_trait;

/// One interaction pattern over the council.
#[async_trait]
pub trait CouncilMode: Send + Sync {
    fn mode(&self) -> Mode;
    async fn run(&self, session: &mut Session<'_>, prompt: &str) -> Result<()>;
}

pub struct ModeEngine<S: Storage> {
    council: Council,
    transcripts: Option<S>,
    monitor: SessionMonitor,
    strip_markdown: bool,
}

impl<S: Storage> ModeEngine<S> {
    pub fn new(council: Council) -> Self {
        Self {
            council,
            transcripts: None,
            monitor: SessionMonitor::new(false),
            strip_markdown: true,
        }
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = SessionMonitor::new(enabled);
        self
    }

    pub fn with_transcripts(mut self, storage: S) -> Self {
        self.transcripts = Some(storage);
        self
    }

    pub fn with_markdown_stripping(mut self, enabled: bool) -> Self {
        self.strip_markdown = enabled;
        self
    }

    pub fn council(&self) -> &Council {
        &self.council
    }

    pub async fn run(
        &self,
        mode: &dyn CouncilMode,
        prompt: &str,
        console: &mut dyn Console,
    ) -> Result<Transcript> {
        let kind = mode.mode();
        tracing::info!("🚀 Starting {}", kind.title());
        self.monitor.log_phase("start");

        let mut session = Session::new(&self.council, console, kind, prompt, self.strip_markdown);
        let outcome = mode.run(&mut session, prompt).await;
        let transcript = session.transcript;

        self.monitor.log_phase(kind.title());
        match &outcome {
            Ok(()) => tracing::info!("✅ {} finished ({} entries)", kind.title(), transcript.entries.len()),
            Err(e) => tracing::error!("❌ {} failed: {}", kind.title(), e),
        }

        // 即使模式失敗也保存已經取得的回覆；保存失敗不覆蓋模式本身的結果
        if let Some(storage) = &self.transcripts {
            if !transcript.entries.is_empty() {
                match save_transcript(storage, &transcript).await {
                    Ok(name) => tracing::info!("📝 Transcript saved as {}", name),
                    Err(e) => tracing::warn!("⚠️ Transcript could not be saved: {}", e),
                }
            }
        }

        outcome.map(|()| transcript)
    }

    pub fn finish(&self) {
        self.monitor.log_summary();
    }
}

async fn save_transcript<S: Storage>(storage: &S, transcript: &Transcript) -> Result<String> {
    let name = transcript.file_name();
    let json = serde_json::to_vec_pretty(transcript)?;
    storage.write_file(&name, &json).await?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::console::ScriptedConsole;
    use crate::adapters::storage::LocalStorage;
    use crate::core::testing::ScriptedBackend;
    use crate::domain::model::Seat;
    use crate::utils::error::CouncilError;
    use tempfile::TempDir;

    struct EchoMode;

    #[async_trait]
    impl CouncilMode for EchoMode {
        fn mode(&self) -> Mode {
            Mode::Consensus
        }

        async fn run(&self, session: &mut Session<'_>, prompt: &str) -> Result<()> {
            let reply = session.consult(Seat::Primary, "echo", prompt).await;
            session.present("ECHO", &reply);
            Ok(())
        }
    }

    struct FailingMode;

    #[async_trait]
    impl CouncilMode for FailingMode {
        fn mode(&self) -> Mode {
            Mode::Voting
        }

        async fn run(&self, session: &mut Session<'_>, prompt: &str) -> Result<()> {
            session.consult(Seat::Primary, "first", prompt).await;
            Err(CouncilError::ReplyParseError {
                context: "vote".to_string(),
                message: "bad".to_string(),
            })
        }
    }

    fn council(backend: &ScriptedBackend) -> Council {
        Council::new(backend.arc(), backend.arc(), backend.arc())
    }

    #[tokio::test]
    async fn test_run_saves_transcript() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::named("gemini").reply("**hello**");
        let engine = ModeEngine::new(council(&backend))
            .with_transcripts(LocalStorage::new(dir.path()));
        let mut console = ScriptedConsole::new(Vec::<String>::new());

        let transcript = engine.run(&EchoMode, "hi", &mut console).await.unwrap();

        assert_eq!(transcript.entries.len(), 1);
        assert_eq!(transcript.entries[0].speaker, "gemini");
        assert!(console.output().contains("ECHO:\nhello"));

        let saved = dir.path().join(transcript.file_name());
        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(saved).unwrap()).unwrap();
        assert_eq!(json["prompt"], "hi");
        assert_eq!(json["mode"], "consensus");
    }

    #[tokio::test]
    async fn test_markdown_kept_when_disabled() {
        let backend = ScriptedBackend::named("gemini").reply("**hello**");
        let engine: ModeEngine<LocalStorage> =
            ModeEngine::new(council(&backend)).with_markdown_stripping(false);
        let mut console = ScriptedConsole::new(Vec::<String>::new());

        engine.run(&EchoMode, "hi", &mut console).await.unwrap();
        assert!(console.output().contains("**hello**"));
    }

    #[tokio::test]
    async fn test_failed_mode_still_saves_partial_transcript() {
        let dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::named("gemini").reply("partial");
        let engine = ModeEngine::new(council(&backend))
            .with_transcripts(LocalStorage::new(dir.path()));
        let mut console = ScriptedConsole::new(Vec::<String>::new());

        let result = engine.run(&FailingMode, "hi", &mut console).await;

        assert!(result.is_err());
        let saved: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(saved.len(), 1);
    }

    #[tokio::test]
    async fn test_unwritable_transcript_dir_keeps_mode_outcome() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "occupied").unwrap();
        let backend = ScriptedBackend::named("gemini").reply("hello");
        let engine = ModeEngine::new(council(&backend)).with_transcripts(LocalStorage::new(&blocker));

        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let transcript = engine.run(&EchoMode, "hi", &mut console).await.unwrap();
        assert_eq!(transcript.entries.len(), 1);

        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let err = engine.run(&FailingMode, "hi", &mut console).await.unwrap_err();
        assert!(matches!(err, CouncilError::ReplyParseError { .. }));
    }
}
