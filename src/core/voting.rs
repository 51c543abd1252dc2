use crate::core::engine::CouncilMode;
use crate::core::session::Session;
use crate::domain::model::{Mode, Seat, SeatReply, VoteVerdict};
use crate::utils::error::Result;
use crate::utils::text::{head_chars, parse_json_reply};
use async_trait::async_trait;

const ANSWER_PREVIEW_CHARS: usize = 1000;

/// Every seat answers, the primary seat scores them 0-10; the top score wins.
pub struct VotingMode;

#[async_trait]
impl CouncilMode for VotingMode {
    fn mode(&self) -> Mode {
        Mode::Voting
    }

    async fn run(&self, session: &mut Session<'_>, prompt: &str) -> Result<()> {
        session.say("\n  Collecting responses for voting...\n");
        let replies = session.council.poll_all(prompt).await;
        for reply in &replies {
            session.record(&reply.backend, "answer", &reply.text);
        }
        let labels = ballot_labels(&replies);

        session.say("  Judge is scoring the answers...\n");
        let raw = session
            .consult(Seat::Primary, "scores", &scoring_prompt(prompt, &replies, &labels))
            .await;

        let verdict = match parse_json_reply::<VoteVerdict>(&raw, "vote") {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!("Judge output was not valid JSON: {}", e);
                session.say(&format!(
                    "\n⚠️ Could not parse judge output. Raw output:\n{}\nError: {}",
                    raw, e
                ));
                return Ok(());
            }
        };

        let Some((winner, score)) = pick_winner(&labels, &verdict) else {
            session.say(&format!(
                "\n⚠️ Judge scored none of the candidates. Raw output:\n{}",
                raw
            ));
            return Ok(());
        };

        session.say(&format!(
            "\n🏆 WINNER: {} (Score: {}/10)",
            labels[winner].to_uppercase(),
            score
        ));
        session.present(
            &format!("\n  {}'S ANSWER", labels[winner].to_uppercase()),
            &replies[winner].text,
        );
        session.present("\n JUDGE'S PERSPECTIVE", &verdict.judge_perspective);
        Ok(())
    }
}

/// Score keys for each reply: the backend name, qualified by seat when a
/// backend sits in more than one seat.
pub fn ballot_labels(replies: &[SeatReply]) -> Vec<String> {
    replies
        .iter()
        .map(|reply| {
            let shared = replies
                .iter()
                .filter(|other| other.backend == reply.backend)
                .count()
                > 1;
            if shared {
                format!("{}-{}", reply.backend, reply.seat)
            } else {
                reply.backend.clone()
            }
        })
        .collect()
}

/// Index and score of the best-scored label. Ties go to the earlier seat.
pub fn pick_winner(labels: &[String], verdict: &VoteVerdict) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, label) in labels.iter().enumerate() {
        let Some(&score) = verdict.scores.get(label) else {
            continue;
        };
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best
}

fn scoring_prompt(prompt: &str, replies: &[SeatReply], labels: &[String]) -> String {
    let score_fields = labels
        .iter()
        .map(|label| format!("\"{}\": <int>", label))
        .collect::<Vec<_>>()
        .join(", ");
    let answers: String = replies
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(i, (reply, label))| {
            format!(
                "Answer {} ({}): {}...\n",
                i + 1,
                label,
                head_chars(&reply.text, ANSWER_PREVIEW_CHARS)
            )
        })
        .collect();

    format!(
        "Analyze these {} answers.\n\
         1. Rate them 0-10 based on accuracy and helpfulness.\n\
         2. Write a single paragraph \"Judge's Perspective\" that synthesizes the best \
         insights from all answers into a final conclusion.\n\n\
         Return ONLY a JSON object with this exact format:\n\
         {{\n    \"scores\": {{{}}},\n    \"judge_perspective\": \"<single paragraph synthesis>\"\n}}\n\n\
         Prompt: {}\n{}",
        replies.len(),
        score_fields,
        prompt,
        answers
    )
}
