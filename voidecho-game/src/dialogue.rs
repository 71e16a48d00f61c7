//! Stage dialogue seam: an external text service with a static fallback.
//!
//! Dialogue is flavor only. A service failure must never gate or block a
//! battle or progression transition, so every failure path lands on the
//! canned line set.
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("dialogue service unavailable: {0}")]
    Unavailable(String),
    #[error("dialogue stream interrupted: {0}")]
    Interrupted(String),
}

/// Streaming text source for stage intros. Implementations emit raw chunks
/// through the sink; the caller parses `SPEAKER: text` pairs out of the
/// accumulated stream and substitutes [`fallback_lines`] on any error.
pub trait DialogueService {
    /// Streams dialogue for a stage.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing service fails; callers must recover
    /// with [`fallback_lines`] rather than propagate.
    fn stage_dialogue(
        &self,
        stage_name: &str,
        description: &str,
        lore_note: &str,
        sink: &mut dyn FnMut(&str),
    ) -> Result<(), DialogueError>;
}

/// Always-available implementation that emits the canned lines directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDialogue;

impl DialogueService for StaticDialogue {
    fn stage_dialogue(
        &self,
        _stage_name: &str,
        _description: &str,
        _lore_note: &str,
        sink: &mut dyn FnMut(&str),
    ) -> Result<(), DialogueError> {
        for line in FALLBACK_LINES {
            sink(line);
            sink("\n");
        }
        Ok(())
    }
}

const FALLBACK_LINES: [&str; 6] = [
    "Kaelen: Our path is clear. Do not let the void cloud your vision.",
    "Lyra: The whispers are getting louder... but my spells are sharper.",
    "Jax: Just another day in a dying timeline. Keep moving.",
    "Kaelen: Status report. The link is holding, for now.",
    "Lyra: I can feel the data stream rippling. Something is close.",
    "Jax: Load the cannons. If it bleeds data, we can kill it.",
];

/// The canned line set substituted whenever the service fails.
#[must_use]
pub fn fallback_lines() -> Vec<DialogueLine> {
    FALLBACK_LINES
        .iter()
        .filter_map(|raw| parse_line(raw))
        .collect()
}

fn parse_line(raw: &str) -> Option<DialogueLine> {
    let (speaker, text) = raw.split_once(':')?;
    let speaker = speaker
        .trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace())
        .trim();
    let text = text.trim();
    if speaker.is_empty() || text.is_empty() {
        return None;
    }
    Some(DialogueLine {
        speaker: speaker.to_string(),
        text: text.to_string(),
    })
}

/// Extracts `SPEAKER: text` pairs from an accumulated stream, skipping
/// anything that does not parse.
#[must_use]
pub fn parse_dialogue_lines(raw: &str) -> Vec<DialogueLine> {
    raw.lines().filter_map(parse_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_speaker_text_pairs() {
        let lines = parse_dialogue_lines("Kaelen: Hold the line.\ngarbage\n[Lyra]: Ready.\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].speaker, "Kaelen");
        assert_eq!(lines[0].text, "Hold the line.");
        assert_eq!(lines[1].speaker, "Lyra");
    }

    #[test]
    fn colons_inside_text_stay_with_the_text() {
        let lines = parse_dialogue_lines("Jax: Status: holding.");
        assert_eq!(lines[0].text, "Status: holding.");
    }

    #[test]
    fn static_service_always_yields_parseable_lines() {
        let mut raw = String::new();
        StaticDialogue
            .stage_dialogue("Sector 1", "desc", "lore", &mut |chunk| raw.push_str(chunk))
            .expect("static dialogue cannot fail");
        let lines = parse_dialogue_lines(&raw);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines, fallback_lines());
    }
}
