//! Four-round debate. Primary argues PRO, secondary argues CON, tertiary judges.

use crate::core::engine::CouncilMode;
use crate::core::session::Session;
use crate::domain::model::{Mode, Seat};
use crate::utils::error::Result;
use async_trait::async_trait;

pub struct DebateMode;

#[derive(Debug, Default)]
struct DebateRecord {
    pro_opening: String,
    con_opening: String,
    pro_cross: String,
    con_cross: String,
    pro_rebuttal: String,
    con_rebuttal: String,
    pro_closing: String,
    con_closing: String,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Pro,
    Con,
}

impl Side {
    fn name(self) -> &'static str {
        match self {
            Side::Pro => "PRO",
            Side::Con => "CON",
        }
    }

    fn opponent(self) -> &'static str {
        match self {
            Side::Pro => "CON",
            Side::Con => "PRO",
        }
    }

    fn seat(self) -> Seat {
        match self {
            Side::Pro => Seat::Primary,
            Side::Con => Seat::Secondary,
        }
    }

    fn badge(self) -> &'static str {
        match self {
            Side::Pro => "🔵",
            Side::Con => "🔴",
        }
    }
}

#[async_trait]
impl CouncilMode for DebateMode {
    fn mode(&self) -> Mode {
        Mode::Debate
    }

    async fn run(&self, session: &mut Session<'_>, topic: &str) -> Result<()> {
        let mut record = DebateRecord::default();
        session.say("\n REALISTIC COMPETITIVE DEBATE MODE\n");

        session.say("\n ROUND 1: Opening Arguments\n");
        record.pro_opening = argue(session, Side::Pro, "opening", &opening_prompt(Side::Pro, topic)).await;
        record.con_opening = argue(session, Side::Con, "opening", &opening_prompt(Side::Con, topic)).await;

        session.say("\n ROUND 2: Cross-Examination\n");
        let prompt = cross_prompt(Side::Pro, &record.con_opening);
        record.pro_cross = argue(session, Side::Pro, "questions", &prompt).await;
        let prompt = cross_prompt(Side::Con, &record.pro_opening);
        record.con_cross = argue(session, Side::Con, "questions", &prompt).await;

        session.say("\n ROUND 3: Rebuttals\n");
        let prompt = rebuttal_prompt(Side::Pro, &record.con_opening);
        record.pro_rebuttal = argue(session, Side::Pro, "rebuttal", &prompt).await;
        let prompt = rebuttal_prompt(Side::Con, &record.pro_opening);
        record.con_rebuttal = argue(session, Side::Con, "rebuttal", &prompt).await;

        session.say("\n🏁 ROUND 4: Closing Statements\n");
        let prompt = closing_prompt(Side::Pro, topic, &record);
        record.pro_closing = argue(session, Side::Pro, "closing", &prompt).await;
        let prompt = closing_prompt(Side::Con, topic, &record);
        record.con_closing = argue(session, Side::Con, "closing", &prompt).await;

        session.say("\n FINAL JUDGMENT\n");
        let verdict = session
            .consult(Seat::Tertiary, "verdict", &judge_prompt(topic, &record))
            .await;
        session.present_raw("VERDICT", &verdict);
        Ok(())
    }
}

async fn argue(session: &mut Session<'_>, side: Side, label: &str, prompt: &str) -> String {
    let reply = session
        .consult(side.seat(), &format!("{} {}", side.name(), label), prompt)
        .await;
    session.present(&format!("{} {} ({})", side.badge(), side.name(), label), &reply);
    reply
}

fn opening_prompt(side: Side, topic: &str) -> String {
    let extra = match side {
        Side::Pro => "- Use logical reasoning and real-world examples",
        Side::Con => "- Directly counter the assumptions of the PRO side pre-emptively\n- Use logical reasoning and real-world examples",
    };
    format!(
        "You are the {} side in a competitive academic debate.\nYour job:\n\
         - Provide a clear, structured opening statement (max 6 sentences)\n\
         - Present 2-3 strong, evidence-based points\n\
         - No personal attacks, no fluff\n{}\n\nDebate Topic:\n{}\n",
        side.name(),
        extra,
        topic
    )
}

fn cross_prompt(side: Side, opponent_opening: &str) -> String {
    format!(
        "You are the {} debater.\nCross-examine the {}'s opening argument.\n\
         Ask 3 sharp, focused questions targeting weaknesses, contradictions, \
         unsupported claims or missing evidence.\n\n{} said:\n\"\"\"{}\"\"\"\n",
        side.name(),
        side.opponent(),
        side.opponent(),
        opponent_opening
    )
}

fn rebuttal_prompt(side: Side, opponent_opening: &str) -> String {
    format!(
        "You are the {} debater.\nProvide a rebuttal to the {}'s argument.\nRequirements:\n\
         - Address their main points directly\n\
         - Expose logical fallacies or flawed assumptions\n\
         - Provide better evidence than they used\n\
         - Stay concise (max 6 sentences)\n\n{} argument:\n\"\"\"{}\"\"\"\n",
        side.name(),
        side.opponent(),
        side.opponent(),
        opponent_opening
    )
}

fn closing_prompt(side: Side, topic: &str, record: &DebateRecord) -> String {
    let (opponent_opening, opponent_rebuttal) = match side {
        Side::Pro => (&record.con_opening, &record.con_rebuttal),
        Side::Con => (&record.pro_opening, &record.pro_rebuttal),
    };
    format!(
        "You are the {} side.\nDeliver a closing statement:\n\
         - Summarize your strongest points\n\
         - Quote one weakness from the {}\n\
         - End with a decisive conclusion\n\
         - Max 5 sentences\n\n\
         Debate Topic: {}\n\n{} opening:\n\"\"\"{}\"\"\"\n\n{} rebuttal:\n\"\"\"{}\"\"\"\n",
        side.name(),
        side.opponent(),
        topic,
        side.opponent(),
        opponent_opening,
        side.opponent(),
        opponent_rebuttal
    )
}

fn judge_prompt(topic: &str, record: &DebateRecord) -> String {
    format!(
        "You are a strict, realistic debate judge.\nAnalyze the debate using these criteria:\n\
         1) Argument clarity\n2) Logical strength\n3) Evidence quality\n\
         4) Rebuttal effectiveness\n5) Closing statement impact\n6) Fallacy detection\n\n\
         Debate Topic: {}\n\n\
         PRO Opening:\n{}\n\nCON Opening:\n{}\n\n\
         PRO Cross:\n{}\n\nCON Cross:\n{}\n\n\
         PRO Rebuttal:\n{}\n\nCON Rebuttal:\n{}\n\n\
         PRO Closing:\n{}\n\nCON Closing:\n{}\n\n\
         Decide the winner and give a 4-6 sentence justification.\n",
        topic,
        record.pro_opening,
        record.con_opening,
        record.pro_cross,
        record.con_cross,
        record.pro_rebuttal,
        record.con_rebuttal,
        record.pro_closing,
        record.con_closing
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::console::ScriptedConsole;
    use crate::core::council::Council;
    use crate::core::testing::ScriptedBackend;

    #[tokio::test]
    async fn test_debate_runs_four_rounds_and_verdict() {
        let pro = ScriptedBackend::named("gemini")
            .reply("PRO opening text")
            .reply("PRO questions")
            .reply("PRO rebuttal")
            .reply("PRO closing");
        let con = ScriptedBackend::named("groq")
            .reply("CON opening text")
            .reply("CON questions")
            .reply("CON rebuttal")
            .reply("CON closing");
        let judge = ScriptedBackend::named("openrouter").reply("**PRO wins**");
        let council = Council::new(pro.arc(), con.arc(), judge.arc());
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let mut session = Session::new(&council, &mut console, Mode::Debate, "Remote work", true);

        DebateMode.run(&mut session, "Remote work").await.unwrap();
        let entries = session.transcript.entries.len();

        assert_eq!(pro.calls(), 4);
        assert_eq!(con.calls(), 4);
        assert_eq!(entries, 9);

        // 交叉詰問要看到對手的開場
        assert!(pro.prompts()[1].contains("CON opening text"));
        assert!(con.prompts()[1].contains("PRO opening text"));
        // 結辯帶入對手的反駁
        assert!(pro.prompts()[3].contains("CON rebuttal"));
        assert!(pro.prompts()[3].contains("Remote work"));

        let verdict_prompt = &judge.prompts()[0];
        for part in ["PRO closing", "CON closing", "PRO questions", "CON rebuttal"] {
            assert!(verdict_prompt.contains(part), "missing {part}");
        }
        // 判決保留原始格式
        assert!(console.output().contains("VERDICT:\n**PRO wins**"));
    }
}
