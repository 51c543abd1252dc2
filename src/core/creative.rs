use crate::core::engine::CouncilMode;
use crate::core::session::Session;
use crate::domain::model::{Mode, Seat};
use crate::utils::error::Result;
use async_trait::async_trait;

const MASTER_CREATOR: &str = "You are the MASTER CREATOR.
- You specialise in imaginative, high-level creativity across every domain: stories, \
scripts, songs, lyrics, visual concepts, essays, slogans, product ideas, worldbuilding.
- Produce highly original, cinematic, emotionally and intellectually engaging content.
- Think like the greatest human creators and inventors in history.";

const TECHNICAL_CRAFTSMAN: &str = "You are the TECHNICAL CRAFTSMAN.
- Convert raw concepts into structured, professional work:
  songs get verse/chorus/bridge, BPM and rhyme scheme; stories get chapters, \
characters, arcs and dialogue; research gets evidence and citations; designs get \
composition, technique and mood; products get features and specifications.
- Ensure clarity, coherence, rhythm and professional-level output.";

const POLISHING_DIRECTOR: &str = "You are the POLISHING DIRECTOR.
- Finalise and perfect the creative piece.
- Raise emotional, intellectual and aesthetic impact.
- Make it publication-ready and memorable.";

/// Concept → structured draft → polished piece, one seat per stage.
pub struct CreativeMode;

#[async_trait]
impl CouncilMode for CreativeMode {
    fn mode(&self) -> Mode {
        Mode::Creative
    }

    async fn run(&self, session: &mut Session<'_>, request: &str) -> Result<()> {
        session.say("\n WELCOME TO THE UNIVERSAL CREATIVE ENGINE \n");

        let creator = session.speaker(Seat::Primary);
        session.say(&format!(" ROUND 1: CONCEPT GENERATION ({})\n", creator));
        let concept = session
            .consult(Seat::Primary, "concept", &concept_prompt(request))
            .await;
        session.present(&format!("🔵 {} (Concept Generation)", creator), &concept);

        let craftsman = session.speaker(Seat::Secondary);
        session.say(&format!(" ROUND 2: STRUCTURED CREATIVE EXPANSION ({})\n", craftsman));
        let draft = session
            .consult(Seat::Secondary, "draft", &expansion_prompt(&concept))
            .await;
        session.present(&format!("🟣 {} (Technical Expansion)", craftsman), &draft);

        let director = session.speaker(Seat::Tertiary);
        session.say(&format!(" ROUND 3: FINAL POLISH & IMPACT ({})\n", director));
        let finale = session
            .consult(Seat::Tertiary, "masterpiece", &polish_prompt(&concept, &draft))
            .await;
        session.present(&format!("🟢 {} (Final Masterpiece)", director), &finale);

        session.say("\n UNIVERSAL CREATIVE WORK COMPLETE!\n");
        Ok(())
    }
}

fn concept_prompt(request: &str) -> String {
    format!(
        "{MASTER_CREATOR}\n\nUser request:\n\"\"\"{request}\"\"\"\n\n\
         Generate a bold, original core concept. Include:\n\
         - Mood & tone\n- Style & format\n- Key visuals, motifs or ideas\n\
         - Themes or messages\n- Emotional or intellectual impact\n"
    )
}

fn expansion_prompt(concept: &str) -> String {
    format!(
        "{TECHNICAL_CRAFTSMAN}\n\nUsing this concept:\n\"\"\"{concept}\"\"\"\n\n\
         Transform it into a fully developed creative piece. Choose the best \
         format for this concept and make the output professional, coherent \
         and engaging.\n"
    )
}

fn polish_prompt(concept: &str, draft: &str) -> String {
    format!(
        "{POLISHING_DIRECTOR}\n\nHere is the concept and structured draft:\n\
         Concept:\n\"\"\"{concept}\"\"\"\n\nDraft:\n\"\"\"{draft}\"\"\"\n\n\
         Your job:\n- Strengthen weak points and unclear parts\n\
         - Enhance depth, flow, pacing and readability\n\
         - Add a memorable ending\n\n\
         Produce the FINAL MASTERPIECE that could be published, performed or presented.\n"
    )
}
