//! Consensus builder: every seat answers, the primary seat acts as a mentor
//! judge that scores, critiques and merges the answers.

use crate::core::engine::CouncilMode;
use crate::core::session::Session;
use crate::domain::model::{Mode, Seat, SeatReply};
use crate::utils::error::Result;
use async_trait::async_trait;

pub struct ConsensusMode;

#[async_trait]
impl CouncilMode for ConsensusMode {
    fn mode(&self) -> Mode {
        Mode::Consensus
    }

    async fn run(&self, session: &mut Session<'_>, prompt: &str) -> Result<()> {
        session.say("\n Fetching responses from models...\n");

        let replies = session.council.poll_all(prompt).await;
        for reply in &replies {
            session.record(&reply.backend, "answer", &reply.text);
        }
        session.say(" Responses received. Synthesizing...\n");

        let judge_prompt = consensus_prompt(prompt, &replies);
        let verdict = session.consult(Seat::Primary, "consensus", &judge_prompt).await;

        session.present(
            "\n FINAL CONSENSUS (MENTOR JUDGE + SCORING + FEEDBACK)",
            &verdict,
        );
        Ok(())
    }
}

pub fn consensus_prompt(prompt: &str, replies: &[SeatReply]) -> String {
    let answers: String = replies
        .iter()
        .map(|r| format!("{} Response:\n\"\"\"{}\"\"\"\n\n", r.backend, r.text))
        .collect();

    format!(
        r#"You are a highly experienced mentor and evaluator.
Your tone is strict, clear, confident and encouraging. You hold high standards.

Perform 3 tasks:

TASK 1 - MENTOR SCORING (0-10)
Score each model's response on accuracy, depth, clarity, usefulness,
completeness and reasoning quality. Justify each score briefly.

TASK 2 - MENTOR FEEDBACK
Give firm, constructive, actionable feedback for each model.

TASK 3 - FINAL CONSENSUS ANSWER
Combine only the strongest parts of the responses. Remove repetition,
incorrect claims, weak reasoning and fluff. The result must be clear,
correct, well structured and deeper than any single response.

User Prompt:
"""{prompt}"""

{answers}Now produce:
1. Mentor Scoring Table
2. Mentor Feedback for each model
3. Final Consensus Answer
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::console::ScriptedConsole;
    use crate::core::council::Council;
    use crate::core::testing::ScriptedBackend;

    #[tokio::test]
    async fn test_judge_sees_every_answer() {
        let gemini = ScriptedBackend::named("gemini")
            .when("mentor", "## Final\n**Use Rust**")
            .reply("Answer from gemini");
        let groq = ScriptedBackend::named("groq").reply("Answer from groq");
        let openrouter = ScriptedBackend::named("openrouter");
        let council = Council::new(gemini.arc(), groq.arc(), openrouter.arc());
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let mut session = Session::new(&council, &mut console, Mode::Consensus, "Which language?", true);

        ConsensusMode.run(&mut session, "Which language?").await.unwrap();
        let transcript = session.transcript;

        let judge_prompt = &gemini.prompts()[1];
        assert!(judge_prompt.contains("Answer from groq"));
        assert!(judge_prompt.contains("openrouter ERROR → "));
        assert!(judge_prompt.contains("\"\"\"Which language?\"\"\""));
        assert_eq!(transcript.entries.len(), 4);
        assert!(console.output().contains("Final\nUse Rust"));
    }
}
